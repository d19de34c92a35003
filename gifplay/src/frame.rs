// frame.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Frame records
use crate::color::ColorTable;
use crate::error::{Error, Result};
use gift::block::DisposalMethod;

/// Post-display treatment of a frame's rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisposalMode {
    /// No disposal specified
    #[default]
    None,
    /// Leave the frame in place
    Leave,
    /// Clear the frame's rectangle to the background
    ToBackground,
    /// Restore the rectangle to its content before the frame was painted
    RestorePrevious,
}

impl From<u8> for DisposalMode {
    fn from(n: u8) -> Self {
        match n & 0b0111 {
            1 => DisposalMode::Leave,
            2 => DisposalMode::ToBackground,
            3 => DisposalMode::RestorePrevious,
            // reserved values are treated as unspecified
            _ => DisposalMode::None,
        }
    }
}

impl From<DisposalMode> for u8 {
    fn from(d: DisposalMode) -> Self {
        match d {
            DisposalMode::None => 0,
            DisposalMode::Leave => 1,
            DisposalMode::ToBackground => 2,
            DisposalMode::RestorePrevious => 3,
        }
    }
}

impl From<DisposalMethod> for DisposalMode {
    #[allow(unreachable_patterns)]
    fn from(d: DisposalMethod) -> Self {
        match d {
            DisposalMethod::NoAction => DisposalMode::None,
            DisposalMethod::Keep => DisposalMode::Leave,
            DisposalMethod::Background => DisposalMode::ToBackground,
            DisposalMethod::Previous => DisposalMode::RestorePrevious,
            _ => DisposalMode::None,
        }
    }
}

/// One decoded frame block.
///
/// Raster indices are row-major, one byte per pixel of the block.
#[derive(Clone, Debug, Default)]
pub struct FrameRecord {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    raster: Vec<u8>,
    local_color_table: Option<ColorTable>,
    disposal: DisposalMode,
    transparent_color: Option<u8>,
    delay_time_cs: u16,
}

impl FrameRecord {
    /// Create a frame record covering a block with a raster
    pub fn new(width: u16, height: u16, raster: Vec<u8>) -> Self {
        FrameRecord {
            width,
            height,
            raster,
            ..Default::default()
        }
    }

    /// Set the block offset within the logical screen
    pub fn with_offset(mut self, left: u16, top: u16) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    /// Set the local color table
    pub fn with_local_color_table(mut self, tbl: Option<ColorTable>) -> Self {
        self.local_color_table = tbl;
        self
    }

    /// Set the disposal mode
    pub fn with_disposal(mut self, disposal: DisposalMode) -> Self {
        self.disposal = disposal;
        self
    }

    /// Set the transparent color index
    pub fn with_transparent_color(mut self, clr: Option<u8>) -> Self {
        self.transparent_color = clr;
        self
    }

    /// Set the delay time in centiseconds
    pub fn with_delay_time_cs(mut self, delay: u16) -> Self {
        self.delay_time_cs = delay;
        self
    }

    /// Get the left offset
    pub fn left(&self) -> u16 {
        self.left
    }

    /// Get the top offset
    pub fn top(&self) -> u16 {
        self.top
    }

    /// Get the block width
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Get the block height
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Get the raster indices
    pub fn raster(&self) -> &[u8] {
        &self.raster
    }

    /// Get the local color table
    pub fn local_color_table(&self) -> Option<&ColorTable> {
        self.local_color_table.as_ref()
    }

    /// Get the disposal mode from the file
    pub fn disposal(&self) -> DisposalMode {
        self.disposal
    }

    /// Get the transparent color index
    pub fn transparent_color(&self) -> Option<u8> {
        self.transparent_color
    }

    /// Get the delay time in centiseconds
    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }

    /// Get the number of pixels in the block
    pub fn image_sz(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    /// Check if a canvas position is inside the block
    pub fn contains(&self, x: u32, y: u32) -> bool {
        let left = u32::from(self.left);
        let top = u32::from(self.top);
        x >= left
            && y >= top
            && x < left + u32::from(self.width)
            && y < top + u32::from(self.height)
    }

    /// Resolve the color table for this frame
    pub fn color_table<'a>(
        &'a self,
        global: Option<&'a ColorTable>,
    ) -> Result<&'a ColorTable> {
        self.local_color_table
            .as_ref()
            .or(global)
            .ok_or(Error::MissingColorTable)
    }

    /// Validate the frame against the logical screen and color tables
    pub(crate) fn validate(
        &self,
        screen_width: u32,
        screen_height: u32,
        global: Option<&ColorTable>,
    ) -> Result<()> {
        let right = u32::from(self.left) + u32::from(self.width);
        let bottom = u32::from(self.top) + u32::from(self.height);
        if right > screen_width || bottom > screen_height {
            return Err(Error::InvalidFrameDimensions);
        }
        if self.raster.len() != self.image_sz() {
            return Err(Error::RasterSizeMismatch);
        }
        let tbl = self.color_table(global)?;
        if let Some(max) = self.raster.iter().max() {
            if usize::from(*max) >= tbl.len() {
                return Err(Error::InvalidColorIndex);
            }
        }
        Ok(())
    }
}
