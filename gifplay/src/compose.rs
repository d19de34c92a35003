// compose.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Frame compositing and disposal
use crate::canvas::Canvas;
use crate::color::{ColorTable, OPAQUE, TRANSPARENT};
use crate::error::Result;
use crate::frame::{DisposalMode, FrameRecord};
use pix::rgb::SRgba8;

/// Session-wide compositing parameters
#[derive(Clone, Copy, Debug)]
pub struct Composition<'a> {
    /// Global color table
    pub global_color_table: Option<&'a ColorTable>,
    /// Resolved background color
    pub background: [u8; 3],
    /// Transparency compositing enabled
    pub transparency: bool,
    /// Disposal mode imposed on every frame
    pub disposal_override: Option<DisposalMode>,
    /// Extra palette index treated as transparent
    pub transparent_override: Option<u8>,
}

/// Pending post-display action for one frame
#[derive(Debug)]
pub struct Disposal {
    mode: DisposalMode,
    left: u32,
    top: u32,
    width: u32,
    height: u32,
    /// Pixels under the frame before painting (restore previous only)
    previous: Option<Vec<SRgba8>>,
}

impl<'a> Composition<'a> {
    /// Get the effective disposal mode of a frame
    pub fn disposal(&self, frame: &FrameRecord) -> DisposalMode {
        self.disposal_override.unwrap_or_else(|| frame.disposal())
    }

    /// Get the alpha used when resetting the canvas
    pub fn initial_alpha(&self) -> u8 {
        if self.transparency {
            TRANSPARENT
        } else {
            OPAQUE
        }
    }

    /// Reset a canvas to the background
    pub fn reset(&self, canvas: &mut Canvas) {
        canvas.reset(self.background, self.initial_alpha());
    }

    /// Check if a palette index is skipped while painting a frame
    fn is_transparent(&self, frame: &FrameRecord, idx: u8) -> bool {
        self.transparency && frame.transparent_color() == Some(idx)
    }

    /// Get the alpha for a painted palette index
    fn paint_alpha(&self, idx: u8, to_background: bool) -> u8 {
        if self.transparency
            && to_background
            && self.transparent_override == Some(idx)
        {
            TRANSPARENT
        } else {
            OPAQUE
        }
    }

    /// Paint a frame onto a canvas.
    ///
    /// Opaque pixels overwrite color and alpha.  With transparency enabled,
    /// transparent pixels clear alpha if the frame's disposal mode is
    /// `ToBackground`, and are left untouched otherwise.
    ///
    /// Pixels matching the transparent override are always painted, but
    /// their alpha is cleared when transparency is enabled and the disposal
    /// mode is `ToBackground`.
    pub fn composite(
        &self,
        canvas: &mut Canvas,
        frame: &FrameRecord,
    ) -> Result<()> {
        frame.validate(
            canvas.width(),
            canvas.height(),
            self.global_color_table,
        )?;
        let tbl = frame.color_table(self.global_color_table)?;
        let width = usize::from(frame.width());
        if width == 0 {
            return Ok(());
        }
        let to_background = self.disposal(frame) == DisposalMode::ToBackground;
        let left = u32::from(frame.left());
        let top = u32::from(frame.top());
        for (y, indices) in (top..).zip(frame.raster().chunks_exact(width)) {
            for (x, &idx) in (left..).zip(indices) {
                if !self.is_transparent(frame, idx) {
                    let alpha = self.paint_alpha(idx, to_background);
                    canvas.write_pixel(x, y, tbl.rgba(idx, alpha));
                } else if to_background {
                    canvas.write_alpha(x, y, TRANSPARENT);
                }
            }
        }
        Ok(())
    }
}

impl Disposal {
    /// Prepare disposal of a frame, before it is painted.
    ///
    /// For `RestorePrevious`, the pixels under the frame are saved.
    pub fn new(
        frame: &FrameRecord,
        mode: DisposalMode,
        canvas: &Canvas,
    ) -> Self {
        let left = u32::from(frame.left());
        let top = u32::from(frame.top());
        let width = u32::from(frame.width());
        let height = u32::from(frame.height());
        let previous = match mode {
            DisposalMode::RestorePrevious => {
                let mut saved = Vec::with_capacity(frame.image_sz());
                for y in top..top + height {
                    saved.extend_from_slice(canvas.row(left, y, width));
                }
                Some(saved)
            }
            _ => None,
        };
        Disposal {
            mode,
            left,
            top,
            width,
            height,
            previous,
        }
    }

    /// Get the disposal mode
    pub fn mode(&self) -> DisposalMode {
        self.mode
    }

    /// Apply disposal after the frame has been shown
    pub fn dispose(self, canvas: &mut Canvas, comp: &Composition) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        match self.mode {
            DisposalMode::None | DisposalMode::Leave => {}
            DisposalMode::ToBackground => self.clear(canvas, comp),
            DisposalMode::RestorePrevious => {
                if let Some(saved) = &self.previous {
                    let rows = saved.chunks_exact(self.width as usize);
                    for (y, src) in (self.top..).zip(rows) {
                        canvas
                            .row_mut(self.left, y, self.width)
                            .copy_from_slice(src);
                    }
                }
            }
        }
    }

    /// Clear the frame rectangle to the background
    fn clear(&self, canvas: &mut Canvas, comp: &Composition) {
        let [r, g, b] = comp.background;
        let bg = SRgba8::new(r, g, b, OPAQUE);
        for y in self.top..self.top + self.height {
            for x in self.left..self.left + self.width {
                if comp.transparency {
                    canvas.write_alpha(x, y, TRANSPARENT);
                } else {
                    canvas.write_pixel(x, y, bg);
                }
            }
        }
    }
}
