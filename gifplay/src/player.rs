// player.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Playback scheduling
use crate::compose::Disposal;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::frame::FrameRecord;
use crate::present::Sink;
use crate::resource::GifResource;
use log::{debug, trace, warn};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Scheduler state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum State {
    /// Not running
    #[default]
    Idle,
    /// Inside [run](struct.Scheduler.html#method.run)
    Playing,
}

/// Handle for stopping a running [Scheduler] from another thread
#[derive(Clone, Debug, Default)]
pub struct StopHandle {
    /// Stop flag, with a condition variable to wake a sleeping scheduler
    signal: Arc<(Mutex<bool>, Condvar)>,
}

/// Playback scheduler
///
/// Drives frames of a [GifResource] through compositing, presentation,
/// delay and disposal.
///
/// ## Example
/// ```
/// use gifplay::{ColorTable, Config, FrameRecord, GifResource};
/// use gifplay::{NullSink, Scheduler};
///
/// # fn main() -> Result<(), gifplay::Error> {
/// let tbl = ColorTable::with_entries(&[[0, 0, 0], [0xFF, 0xFF, 0xFF]]);
/// let frames = vec![
///     FrameRecord::new(2, 2, vec![0, 1, 1, 0]).with_delay_time_cs(1),
///     FrameRecord::new(2, 2, vec![1, 0, 0, 1]).with_delay_time_cs(1),
/// ];
/// let mut res = GifResource::new(2, 2, Some(tbl), 0, frames, Config::default())?;
/// let mut sched = Scheduler::new();
/// sched.run(&mut res, &mut NullSink, 1)?;
/// assert_eq!(sched.passes(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Scheduler {
    /// Current state
    state: State,
    /// Full passes completed during the current run
    passes: u32,
    /// Stop signal
    stop: StopHandle,
    /// Substituted delay already reported
    warned: bool,
}

impl StopHandle {
    /// Lock the stop flag
    fn flag(&self) -> MutexGuard<'_, bool> {
        self.signal.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request playback to stop before the next frame
    pub fn stop(&self) {
        *self.flag() = true;
        self.signal.1.notify_all();
    }

    /// Check if a stop has been requested
    pub fn is_stopped(&self) -> bool {
        *self.flag()
    }

    /// Consume a pending stop request
    fn take(&self) -> bool {
        std::mem::take(&mut *self.flag())
    }

    /// Wait for a delay, returning early if a stop is requested
    fn wait(&self, delay: Duration) {
        let flag = self.flag();
        let _ = self
            .signal
            .1
            .wait_timeout_while(flag, delay, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

/// Get the real-time delay of a frame.
///
/// The file stores centiseconds; a zero delay is replaced with the
/// configured minimum.
pub fn frame_delay(frame: &FrameRecord, config: &Config) -> Duration {
    match frame.delay_time_cs() {
        0 => config.min_delay(),
        cs => Duration::from_millis(u64::from(cs) * 10),
    }
}

impl Scheduler {
    /// Create a new idle scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a handle for stopping playback
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Get the current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Get the number of full passes completed by the last run
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Play frames of a resource.
    ///
    /// * `iterations < 0`: play until stopped
    /// * `iterations == 0`: play one frame
    /// * `iterations > 0`: play that many full passes
    ///
    /// Playback continues from the resource's current frame.  A stop
    /// request is checked between frames, and returns
    /// [Cancelled](enum.Error.html#variant.Cancelled); a request made
    /// before `run` is called also cancels it.
    ///
    /// If the sink returns an error, the frame is disposed and the error
    /// returned; a later `run` presents that frame again.
    pub fn run<S: Sink + ?Sized>(
        &mut self,
        res: &mut GifResource,
        sink: &mut S,
        iterations: i32,
    ) -> Result<()> {
        self.passes = 0;
        self.warned = false;
        self.state = State::Playing;
        trace!("scheduler: idle -> playing ({iterations} iterations)");
        if let Some(mode) = res.config().disposal_override() {
            warn!("disposal of every frame overridden: {mode:?}");
        }
        let result = self.play(res, sink, iterations);
        self.state = State::Idle;
        trace!("scheduler: playing -> idle after {} passes", self.passes);
        result
    }

    /// Play frames until done or stopped
    fn play<S: Sink + ?Sized>(
        &mut self,
        res: &mut GifResource,
        sink: &mut S,
        iterations: i32,
    ) -> Result<()> {
        loop {
            if self.stop.take() {
                debug!("playback cancelled at frame {}", res.current_frame());
                return Err(Error::Cancelled);
            }
            if self.step(res, sink)? {
                self.passes += 1;
            }
            match iterations {
                0 => return Ok(()),
                n if n > 0 && self.passes >= n.unsigned_abs() => {
                    return Ok(());
                }
                _ => (),
            }
        }
    }

    /// Show one frame: composite, present, delay, dispose, advance.
    ///
    /// Returns `true` when playback wrapped to frame 0.
    fn step<S: Sink + ?Sized>(
        &mut self,
        res: &mut GifResource,
        sink: &mut S,
    ) -> Result<bool> {
        let canvas = res.canvas()?;
        let number = res.current_frame();
        let frame = res.frames().get(number).ok_or(Error::Released)?;
        let comp = res.composition();
        let mode = comp.disposal(frame);
        let disposal = canvas.write(|c| {
            if number == 0 {
                comp.reset(c);
            }
            let disposal = Disposal::new(frame, mode, c);
            comp.composite(c, frame).map(|_| disposal)
        })?;
        debug!("composited frame {number}, disposal {mode:?}");
        let viewport = res.viewport();
        if let Err(e) = canvas.read(|c| sink.present(&c.window(viewport))) {
            // dispose now; the frame is repainted on retry
            warn!("frame {number} not presented: {e}");
            canvas.write(|c| disposal.dispose(c, &comp));
            return Err(e);
        }
        let delay = frame_delay(frame, res.config());
        if frame.delay_time_cs() == 0 && !self.warned {
            warn!("zero delay on frame {number}, using {delay:?}");
            self.warned = true;
        }
        self.sleep(delay);
        canvas.write(|c| disposal.dispose(c, &comp));
        Ok(res.advance())
    }

    /// Sleep for a delay, waking early on a stop request
    fn sleep(&self, delay: Duration) {
        self.stop.wait(delay);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::color::ColorTable;
    use crate::error::ErrorKind;
    use crate::frame::DisposalMode;
    use crate::present::{NullSink, Snapshot, Viewport, Window};
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Instant;

    /// Sink which keeps a copy of every window
    #[derive(Default)]
    struct Recorder {
        snapshots: Vec<Snapshot>,
    }

    impl Sink for Recorder {
        fn present(&mut self, window: &Window<'_>) -> Result<()> {
            self.snapshots.push(window.to_snapshot());
            Ok(())
        }
    }

    /// Sink which fails once, on one presentation
    struct Flaky {
        calls: usize,
        fail_on: usize,
        recorder: Recorder,
    }

    impl Sink for Flaky {
        fn present(&mut self, window: &Window<'_>) -> Result<()> {
            self.calls += 1;
            if self.calls == self.fail_on {
                let e = io::Error::new(io::ErrorKind::Other, "device busy");
                return Err(e.into());
            }
            self.recorder.present(window)
        }
    }

    const BG: [u8; 3] = [10, 10, 10];
    const RED: [u8; 3] = [200, 0, 0];
    const GREEN: [u8; 3] = [0, 200, 0];
    const BLUE: [u8; 3] = [0, 0, 200];

    fn tbl() -> ColorTable {
        ColorTable::with_entries(&[BG, RED, GREEN, BLUE])
    }

    fn fast() -> Config {
        Config::default().with_min_delay_ms(1)
    }

    /// Two full-screen frames: red, then green
    fn two_frames() -> Vec<FrameRecord> {
        vec![
            FrameRecord::new(2, 2, vec![1; 4]),
            FrameRecord::new(2, 2, vec![2; 4]),
        ]
    }

    #[test]
    fn three_frame_disposal() -> Result<()> {
        let frames = vec![
            FrameRecord::new(4, 4, vec![1; 16]).with_delay_time_cs(1),
            FrameRecord::new(2, 2, vec![2, 2, 2, 3])
                .with_offset(1, 1)
                .with_transparent_color(Some(3))
                .with_disposal(DisposalMode::ToBackground)
                .with_delay_time_cs(1),
            FrameRecord::new(2, 2, vec![3, 1, 1, 1])
                .with_offset(1, 1)
                .with_transparent_color(Some(3))
                .with_disposal(DisposalMode::Leave)
                .with_delay_time_cs(1),
        ];
        let config = fast().with_transparency(true);
        let mut res = GifResource::new(4, 4, Some(tbl()), 0, frames, config)?;
        let mut rec = Recorder::default();
        let mut sched = Scheduler::new();
        sched.run(&mut res, &mut rec, 1)?;
        assert_eq!(rec.snapshots.len(), 3);
        let w = rec.snapshots[1].window();
        assert_eq!(w.rgba(0, 0), [200, 0, 0, 0xFF]);
        assert_eq!(w.rgba(3, 2), [200, 0, 0, 0xFF]);
        assert_eq!(w.rgba(1, 1), [0, 200, 0, 0xFF]);
        assert_eq!(w.rgba(2, 2), [200, 0, 0, 0]);
        let w = rec.snapshots[2].window();
        // transparent pixel shows the disposed block
        assert_eq!(w.alpha(1, 1), 0);
        assert_eq!(w.rgba(2, 1), [200, 0, 0, 0xFF]);
        assert_eq!(w.rgba(2, 2), [200, 0, 0, 0xFF]);
        assert_eq!(w.rgba(0, 3), [200, 0, 0, 0xFF]);
        Ok(())
    }

    #[test]
    fn two_iterations() -> Result<()> {
        let mut res =
            GifResource::new(2, 2, Some(tbl()), 0, two_frames(), fast())?;
        let mut rec = Recorder::default();
        let mut sched = Scheduler::new();
        sched.run(&mut res, &mut rec, 2)?;
        let seq: Vec<[u8; 3]> = rec
            .snapshots
            .iter()
            .map(|s| s.window().rgb(0, 0))
            .collect();
        assert_eq!(seq, [RED, GREEN, RED, GREEN]);
        assert_eq!(sched.passes(), 2);
        assert_eq!(sched.state(), State::Idle);
        assert_eq!(res.current_frame(), 0);
        Ok(())
    }

    #[test]
    fn step_one_frame() -> Result<()> {
        let mut res =
            GifResource::new(2, 2, Some(tbl()), 0, two_frames(), fast())?;
        let mut rec = Recorder::default();
        let mut sched = Scheduler::new();
        sched.run(&mut res, &mut rec, 0)?;
        assert_eq!(res.current_frame(), 1);
        assert_eq!(sched.passes(), 0);
        sched.run(&mut res, &mut rec, 0)?;
        assert_eq!(res.current_frame(), 0);
        assert_eq!(sched.passes(), 1);
        assert_eq!(rec.snapshots.len(), 2);
        assert_eq!(rec.snapshots[1].window().rgb(1, 1), GREEN);
        Ok(())
    }

    #[test]
    fn zero_delay_substituted() -> Result<()> {
        let frames = vec![FrameRecord::new(2, 2, vec![1; 4])];
        let config = Config::default().with_min_delay_ms(50);
        let mut res = GifResource::new(2, 2, Some(tbl()), 0, frames, config)?;
        let start = Instant::now();
        Scheduler::new().run(&mut res, &mut NullSink, 1)?;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_secs(5));
        Ok(())
    }

    #[test]
    fn delays() {
        let config = Config::default();
        let frame = FrameRecord::new(1, 1, vec![0]);
        assert_eq!(frame_delay(&frame, &config), Duration::from_millis(50));
        let frame = frame.with_delay_time_cs(7);
        assert_eq!(frame_delay(&frame, &config), Duration::from_millis(70));
    }

    #[test]
    fn deterministic() -> Result<()> {
        let pixels = || -> Result<Vec<[u8; 4]>> {
            let frames = vec![
                FrameRecord::new(3, 3, vec![1, 2, 3, 3, 2, 1, 0, 0, 0]),
                FrameRecord::new(2, 1, vec![3, 0])
                    .with_offset(1, 2)
                    .with_disposal(DisposalMode::RestorePrevious),
                FrameRecord::new(1, 2, vec![2, 2])
                    .with_transparent_color(Some(2))
                    .with_disposal(DisposalMode::ToBackground),
            ];
            let config = fast().with_transparency(true);
            let mut res =
                GifResource::new(3, 3, Some(tbl()), 0, frames, config)?;
            Scheduler::new().run(&mut res, &mut NullSink, 1)?;
            let canvas = res.canvas()?;
            let rgba: Vec<[u8; 4]> = canvas.read(|c| {
                (0..3)
                    .flat_map(|y| (0..3).map(move |x| (x, y)))
                    .map(|(x, y)| c.rgba(x, y))
                    .collect()
            });
            Ok(rgba)
        };
        assert_eq!(pixels()?, pixels()?);
        Ok(())
    }

    #[test]
    fn stop_before_run() -> Result<()> {
        let mut res =
            GifResource::new(2, 2, Some(tbl()), 0, two_frames(), fast())?;
        let mut rec = Recorder::default();
        let mut sched = Scheduler::new();
        sched.stop_handle().stop();
        let err = sched.run(&mut res, &mut rec, -1).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Cancelled));
        assert!(rec.snapshots.is_empty());
        assert_eq!(sched.state(), State::Idle);
        // stop request was consumed
        sched.run(&mut res, &mut rec, 0)?;
        assert_eq!(rec.snapshots.len(), 1);
        Ok(())
    }

    #[test]
    fn stop_from_thread() -> Result<()> {
        let mut res =
            GifResource::new(2, 2, Some(tbl()), 0, two_frames(), fast())?;
        let mut sched = Scheduler::new();
        let handle = sched.stop_handle();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            handle.stop();
        });
        let err = sched.run(&mut res, &mut NullSink, -1).err();
        stopper.join().expect("stopper thread");
        assert!(matches!(err, Some(Error::Cancelled)));
        Ok(())
    }

    #[test]
    fn released() -> Result<()> {
        let mut res =
            GifResource::new(2, 2, Some(tbl()), 0, two_frames(), fast())?;
        res.release();
        let err = Scheduler::new().run(&mut res, &mut NullSink, 1).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::InvalidState));
        Ok(())
    }

    #[test]
    fn present_failure_disposes() -> Result<()> {
        let frames = vec![
            FrameRecord::new(2, 2, vec![1; 4]).with_delay_time_cs(1),
            FrameRecord::new(2, 2, vec![2; 4])
                .with_disposal(DisposalMode::RestorePrevious)
                .with_delay_time_cs(1),
        ];
        let mut res = GifResource::new(2, 2, Some(tbl()), 0, frames, fast())?;
        let mut sink = Flaky {
            calls: 0,
            fail_on: 2,
            recorder: Recorder::default(),
        };
        let mut sched = Scheduler::new();
        let err = sched.run(&mut res, &mut sink, 1).err();
        assert!(matches!(err, Some(Error::Io(_))));
        assert_eq!(sched.state(), State::Idle);
        assert_eq!(res.current_frame(), 1);
        let canvas = res.canvas()?;
        assert_eq!(canvas.read(|c| c.rgba(1, 1)), [200, 0, 0, 0xFF]);
        // retry presents the failed frame, then restores
        sched.run(&mut res, &mut sink, 1)?;
        assert_eq!(sink.recorder.snapshots.len(), 2);
        assert_eq!(sink.recorder.snapshots[1].window().rgb(0, 0), GREEN);
        assert_eq!(canvas.read(|c| c.rgba(1, 1)), [200, 0, 0, 0xFF]);
        assert_eq!(res.current_frame(), 0);
        Ok(())
    }

    #[test]
    fn stop_wakes_delay() -> Result<()> {
        let frames = vec![FrameRecord::new(2, 2, vec![1; 4])
            .with_delay_time_cs(1000)];
        let mut res = GifResource::new(2, 2, Some(tbl()), 0, frames, fast())?;
        let mut sched = Scheduler::new();
        let handle = sched.stop_handle();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.stop();
        });
        let start = Instant::now();
        let err = sched.run(&mut res, &mut NullSink, -1).err();
        stopper.join().expect("stopper thread");
        assert!(matches!(err, Some(Error::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(5));
        Ok(())
    }

    #[test]
    fn disposal_override_applied() -> Result<()> {
        let frames = vec![
            FrameRecord::new(2, 2, vec![1; 4])
                .with_disposal(DisposalMode::ToBackground),
            FrameRecord::new(1, 1, vec![2]),
        ];
        let config = fast().with_disposal_override(Some(DisposalMode::Leave));
        let mut res = GifResource::new(2, 2, Some(tbl()), 0, frames, config)?;
        let mut rec = Recorder::default();
        Scheduler::new().run(&mut res, &mut rec, 1)?;
        let w = rec.snapshots[1].window();
        assert_eq!(w.rgb(0, 0), GREEN);
        assert_eq!(w.rgb(1, 1), RED);
        Ok(())
    }

    #[test]
    fn readers_never_see_partial_frames() -> Result<()> {
        let frames = vec![
            FrameRecord::new(64, 64, vec![1; 64 * 64]),
            FrameRecord::new(64, 64, vec![2; 64 * 64]),
        ];
        let mut res = GifResource::new(64, 64, Some(tbl()), 0, frames, fast())?;
        let canvas = res.canvas()?;
        let done = Arc::new(AtomicBool::new(false));
        let reader = {
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut seen = vec![];
                while !done.load(Ordering::Acquire) {
                    let snap = canvas.snapshot(Viewport::full(64, 64));
                    let w = snap.window();
                    let first = w.row(0)[0];
                    let uniform = w.rows().flatten().all(|px| *px == first);
                    seen.push((w.rgba(0, 0), uniform));
                }
                seen
            })
        };
        Scheduler::new().run(&mut res, &mut NullSink, 20)?;
        done.store(true, Ordering::Release);
        let seen = reader.join().expect("reader thread");
        assert!(!seen.is_empty());
        for (px, uniform) in seen {
            assert!(uniform, "torn read: {px:?}");
            let rgb = [px[0], px[1], px[2]];
            assert!(rgb == BG || rgb == RED || rgb == GREEN);
        }
        Ok(())
    }
}
