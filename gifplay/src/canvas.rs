// canvas.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Composited canvas
use crate::present::{Snapshot, Viewport, Window};
use pix::rgb::SRgba8;
use pix::Raster;
use std::sync::{Arc, PoisonError, RwLock};

/// Bytes per canvas pixel
const PIXEL_BYTES: usize = 4;

/// RGB + alpha surface covering the logical screen
pub struct Canvas {
    raster: Raster<SRgba8>,
}

/// Canvas shared between the compositor and presentation
///
/// All access goes through one readers/writer lock covering the whole
/// canvas, so a reader never sees a partially painted frame.
#[derive(Clone)]
pub struct SharedCanvas {
    inner: Arc<RwLock<Canvas>>,
}

impl Canvas {
    /// Create a new transparent black canvas
    pub fn new(width: u32, height: u32) -> Self {
        Canvas {
            raster: Raster::with_clear(width, height),
        }
    }

    /// Get the memory needed for a canvas, in bytes
    pub fn byte_size(width: u32, height: u32) -> usize {
        width as usize * height as usize * PIXEL_BYTES
    }

    /// Get the canvas width
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    /// Get the canvas height
    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// Get pixel index, panicking on out-of-bounds coordinates
    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width() && y < self.height(),
            "canvas position ({x}, {y}) outside {}x{}",
            self.width(),
            self.height()
        );
        y as usize * self.width() as usize + x as usize
    }

    /// Fill the entire canvas
    pub fn reset(&mut self, rgb: [u8; 3], alpha: u8) {
        let [r, g, b] = rgb;
        let clr = SRgba8::new(r, g, b, alpha);
        for p in self.raster.pixels_mut() {
            *p = clr;
        }
    }

    /// Write one pixel
    pub fn write_pixel(&mut self, x: u32, y: u32, clr: SRgba8) {
        let i = self.index(x, y);
        self.raster.pixels_mut()[i] = clr;
    }

    /// Set the alpha of one pixel, keeping its color
    pub fn write_alpha(&mut self, x: u32, y: u32, alpha: u8) {
        let i = self.index(x, y) * PIXEL_BYTES;
        self.raster.as_u8_slice_mut()[i + 3] = alpha;
    }

    /// Read one pixel
    pub fn read_pixel(&self, x: u32, y: u32) -> SRgba8 {
        self.raster.pixels()[self.index(x, y)]
    }

    /// Read one pixel as RGBA bytes
    pub fn rgba(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y) * PIXEL_BYTES;
        let b = &self.raster.as_u8_slice()[i..i + PIXEL_BYTES];
        [b[0], b[1], b[2], b[3]]
    }

    /// Get one row of pixels, starting at `x`
    pub fn row(&self, x: u32, y: u32, width: u32) -> &[SRgba8] {
        if width == 0 {
            return &[];
        }
        let start = self.index(x, y);
        // last pixel must also be on this row
        self.index(x + width - 1, y);
        &self.raster.pixels()[start..start + width as usize]
    }

    /// Get mutable row of pixels, starting at `x`
    pub(crate) fn row_mut(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
    ) -> &mut [SRgba8] {
        if width == 0 {
            return &mut [];
        }
        let start = self.index(x, y);
        self.index(x + width - 1, y);
        &mut self.raster.pixels_mut()[start..start + width as usize]
    }

    /// Get all pixels, row-major
    pub fn pixels(&self) -> &[SRgba8] {
        self.raster.pixels()
    }

    /// Get a read-only window for presentation
    pub fn window(&self, viewport: Viewport) -> Window<'_> {
        Window::new(self, viewport.clip(self.width(), self.height()))
    }
}

impl SharedCanvas {
    /// Share a canvas
    pub fn new(canvas: Canvas) -> Self {
        SharedCanvas {
            inner: Arc::new(RwLock::new(canvas)),
        }
    }

    /// Read the canvas while holding the read lock
    pub fn read<T>(&self, f: impl FnOnce(&Canvas) -> T) -> T {
        let canvas = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&canvas)
    }

    /// Mutate the canvas while holding the write lock
    pub fn write<T>(&self, f: impl FnOnce(&mut Canvas) -> T) -> T {
        let mut canvas =
            self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut canvas)
    }

    /// Copy a window of the canvas under the read lock
    pub fn snapshot(&self, viewport: Viewport) -> Snapshot {
        self.read(|canvas| canvas.window(viewport).to_snapshot())
    }
}
