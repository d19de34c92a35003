// config.rs
//
// Copyright (c) 2025  Douglas Lau
//
use crate::frame::DisposalMode;
use crate::present::Viewport;
use std::time::Duration;

/// Default combined raster volume ceiling (32 MiB)
const MAX_RASTER_VOLUME: usize = 32 << 20;

/// Default delay substituted for zero-delay frames
const MIN_DELAY_MS: u32 = 50;

/// Loading and playback configuration
///
/// ## Example
/// ```
/// use gifplay::{Config, DisposalMode};
///
/// let config = Config::default()
///     .with_transparency(true)
///     .with_min_delay_ms(20)
///     .with_disposal_override(Some(DisposalMode::Leave));
/// assert_eq!(config.min_delay_ms(), 20);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum combined raster volume, in bytes
    max_raster_volume: Option<usize>,
    /// Delay used for frames with zero delay
    min_delay_ms: u32,
    /// Transparency compositing enabled
    transparency: bool,
    /// Disposal mode imposed on every frame
    disposal_override: Option<DisposalMode>,
    /// Extra palette index treated as transparent
    transparent_override: Option<u8>,
    /// Palette index used for background instead of the file's
    background_override: Option<u8>,
    /// Presented window
    viewport: Option<Viewport>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_raster_volume: Some(MAX_RASTER_VOLUME),
            min_delay_ms: MIN_DELAY_MS,
            transparency: false,
            disposal_override: None,
            transparent_override: None,
            background_override: None,
            viewport: None,
        }
    }
}

impl Config {
    /// Set the maximum combined raster volume (in bytes) of the canvas and
    /// all frames.
    pub fn with_max_raster_volume(mut self, max: Option<usize>) -> Self {
        self.max_raster_volume = max;
        self
    }

    /// Get the maximum combined raster volume
    pub fn max_raster_volume(&self) -> Option<usize> {
        self.max_raster_volume
    }

    /// Set the delay substituted for frames with zero delay
    pub fn with_min_delay_ms(mut self, ms: u32) -> Self {
        self.min_delay_ms = ms;
        self
    }

    /// Get the delay substituted for frames with zero delay
    pub fn min_delay_ms(&self) -> u32 {
        self.min_delay_ms
    }

    /// Get the substituted delay as a `Duration`
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.min_delay_ms))
    }

    /// Enable or disable transparency compositing.
    ///
    /// When enabled, the canvas starts out fully transparent and
    /// background disposal clears alpha instead of painting the
    /// background color.
    pub fn with_transparency(mut self, transparency: bool) -> Self {
        self.transparency = transparency;
        self
    }

    /// Check if transparency compositing is enabled
    pub fn transparency(&self) -> bool {
        self.transparency
    }

    /// Override disposal mode of every frame
    pub fn with_disposal_override(mut self, d: Option<DisposalMode>) -> Self {
        self.disposal_override = d;
        self
    }

    /// Get the disposal override
    pub fn disposal_override(&self) -> Option<DisposalMode> {
        self.disposal_override
    }

    /// Treat an extra palette index as transparent.
    ///
    /// Pixels with this index are still painted; only their alpha is
    /// cleared, when transparency is enabled and the frame is disposed to
    /// background.
    pub fn with_transparent_override(mut self, idx: Option<u8>) -> Self {
        self.transparent_override = idx;
        self
    }

    /// Get the transparent color override
    pub fn transparent_override(&self) -> Option<u8> {
        self.transparent_override
    }

    /// Use a palette index for the background
    pub fn with_background_override(mut self, idx: Option<u8>) -> Self {
        self.background_override = idx;
        self
    }

    /// Get the background color override
    pub fn background_override(&self) -> Option<u8> {
        self.background_override
    }

    /// Set the presented window
    pub fn with_viewport(mut self, viewport: Option<Viewport>) -> Self {
        self.viewport = viewport;
        self
    }

    /// Get the presented window
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }
}
