// load.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Loading GIF files into resources
use crate::canvas::Canvas;
use crate::color::ColorTable;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::frame::{DisposalMode, FrameRecord};
use crate::resource::GifResource;
use gift::block::{Application, Frame};
use gift::Decoder;
use log::debug;
use std::io::Read;

/// Interlaced row passes: (first row, row step)
const INTERLACE_PASSES: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Read and validate an entire GIF file
pub(crate) fn read_resource<R: Read>(
    reader: R,
    config: Config,
) -> Result<GifResource> {
    let max_volume = config.max_raster_volume();
    let mut frame_dec = Decoder::new(reader)
        .max_image_sz(max_volume)
        .into_frames();
    let preamble = frame_dec.preamble()?.ok_or(Error::NoFrames)?;
    let screen_width = preamble.screen_width();
    let screen_height = preamble.screen_height();
    let background_idx = preamble.logical_screen_desc.background_color_idx();
    let global = preamble
        .global_color_table
        .as_ref()
        .map(|tbl| ColorTable::with_colors(tbl.colors()));
    let loop_count = preamble.loop_count_ext.as_ref().and_then(loop_count);
    debug!(
        "screen {screen_width}x{screen_height}, global colors: {:?}",
        global.as_ref().map(ColorTable::len)
    );
    let mut frames = vec![];
    let mut volume = Canvas::byte_size(
        u32::from(screen_width),
        u32::from(screen_height),
    );
    check_volume(volume, max_volume)?;
    for frame in frame_dec {
        let record = frame_record(&frame?);
        volume += record.image_sz();
        check_volume(volume, max_volume)?;
        frames.push(record);
    }
    let res = GifResource::new(
        screen_width,
        screen_height,
        global,
        background_idx,
        frames,
        config,
    )?;
    Ok(res.with_loop_count(loop_count))
}

/// Check a raster volume against the configured ceiling
fn check_volume(volume: usize, max_volume: Option<usize>) -> Result<()> {
    match max_volume {
        Some(max) if volume > max => Err(Error::TooLargeAnimation),
        _ => Ok(()),
    }
}

/// Get the loop count from a NETSCAPE2.0 application extension.
///
/// The count is stored little-endian, in a sub-block with ID 1.
fn loop_count(ext: &Application) -> Option<u16> {
    match &ext.app_data()[..] {
        [app_id, data]
            if (&app_id[..] == b"NETSCAPE2.0"
                || &app_id[..] == b"ANIMEXTS1.0")
                && data.len() == 3
                && data[0] == 1 =>
        {
            Some(u16::from_le_bytes([data[1], data[2]]))
        }
        _ => None,
    }
}

/// Convert a container frame to a frame record
fn frame_record(frame: &Frame) -> FrameRecord {
    let desc = &frame.image_desc;
    let width = desc.width();
    let height = desc.height();
    let mut raster = frame.image_data.data().to_vec();
    if desc.interlaced() {
        raster = deinterlace(&raster, usize::from(width), usize::from(height));
    }
    let local = frame
        .local_color_table
        .as_ref()
        .map(|tbl| ColorTable::with_colors(tbl.colors()));
    let (disposal, transparent_color, delay) = match &frame.graphic_control_ext
    {
        Some(ctl) => (
            DisposalMode::from(ctl.disposal_method()),
            ctl.transparent_color(),
            ctl.delay_time_cs(),
        ),
        None => (DisposalMode::None, None, 0),
    };
    FrameRecord::new(width, height, raster)
        .with_offset(desc.left(), desc.top())
        .with_local_color_table(local)
        .with_disposal(disposal)
        .with_transparent_color(transparent_color)
        .with_delay_time_cs(delay)
}

/// Reorder interlaced rows into row-major order
fn deinterlace(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    if width == 0 || data.len() != width * height {
        // size mismatch is reported by validation
        return data.to_vec();
    }
    let mut rows = vec![0; data.len()];
    let order = INTERLACE_PASSES
        .iter()
        .flat_map(|&(first, step)| (first..height).step_by(step));
    for (src, y) in data.chunks_exact(width).zip(order) {
        rows[y * width..(y + 1) * width].copy_from_slice(src);
    }
    rows
}
