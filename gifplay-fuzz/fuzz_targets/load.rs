// cargo fuzz run load corpus/load -- -timeout=30

#![no_main]

use std::io::Cursor;
use libfuzzer_sys::fuzz_target;

use gifplay::{Config, GifResource, NullSink, Scheduler};

fuzz_target!(|data: &[u8]| {
    let config = Config::default()
        .with_max_raster_volume(Some(1 << 20))
        .with_min_delay_ms(0)
        .with_transparency(data.len() % 2 == 0);
    if let Ok(mut res) = GifResource::load(Cursor::new(data), config) {
        let _ = Scheduler::new().run(&mut res, &mut NullSink, 1);
    }
});
