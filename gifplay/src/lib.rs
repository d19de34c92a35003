// lib.rs      gifplay crate.
//
// Copyright (c) 2025  Douglas Lau
//
//! GIF animation compositing and playback.
//!
//! A [GifResource] holds every frame of a decoded GIF file together with
//! a [Canvas], the composited image which should currently be visible.
//! A [Scheduler] paints frames onto the canvas, hands a [Window] of it to a
//! [Sink] for presentation, waits for the frame delay, and applies the
//! frame's disposal before moving on.
//!
//! ## Example
//! ```no_run
//! use gifplay::{Config, GifResource, NullSink, Scheduler};
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = BufReader::new(File::open("example.gif")?);
//! let mut res = GifResource::load(file, Config::default())?;
//! Scheduler::new().run(&mut res, &mut NullSink, 1)?;
//! res.release();
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

mod canvas;
mod color;
mod compose;
mod config;
mod error;
mod frame;
mod load;
mod player;
mod present;
mod resource;

pub use crate::canvas::{Canvas, SharedCanvas};
pub use crate::color::ColorTable;
pub use crate::compose::{Composition, Disposal};
pub use crate::config::Config;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::frame::{DisposalMode, FrameRecord};
pub use crate::player::{frame_delay, Scheduler, State, StopHandle};
pub use crate::present::{NullSink, Sink, Snapshot, Viewport, Window};
pub use crate::resource::GifResource;
