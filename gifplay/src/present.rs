// present.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Presentation of canvas windows
use crate::canvas::Canvas;
use crate::error::Result;
use pix::rgb::SRgba8;

/// Rectangle of the canvas to present, and where to put it on the display
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Viewport {
    /// Left edge of window on canvas
    pub x: u32,
    /// Top edge of window on canvas
    pub y: u32,
    /// Window width
    pub width: u32,
    /// Window height
    pub height: u32,
    /// Display destination X
    pub dest_x: u32,
    /// Display destination Y
    pub dest_y: u32,
}

/// Read-only view of a canvas window
///
/// Only valid while the canvas lock is held; use
/// [to_snapshot](#method.to_snapshot) to keep a copy.
pub struct Window<'a> {
    canvas: &'a Canvas,
    viewport: Viewport,
}

/// Owned copy of a canvas window
pub struct Snapshot {
    canvas: Canvas,
    dest_x: u32,
    dest_y: u32,
}

/// Consumer of presented canvas windows
pub trait Sink {
    /// Present one window (pixels, alpha, size, destination)
    fn present(&mut self, window: &Window<'_>) -> Result<()>;
}

/// Sink which discards all windows
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl Viewport {
    /// Create a viewport covering a whole canvas at the display origin
    pub fn full(width: u32, height: u32) -> Self {
        Viewport {
            width,
            height,
            ..Default::default()
        }
    }

    /// Set the display destination
    pub fn with_dest(mut self, dest_x: u32, dest_y: u32) -> Self {
        self.dest_x = dest_x;
        self.dest_y = dest_y;
        self
    }

    /// Map a screen onto a display, centered.
    ///
    /// Each axis larger than the display is cropped to its middle part;
    /// each smaller axis is placed in the middle of the display.
    pub fn centered(
        screen_width: u32,
        screen_height: u32,
        display_width: u32,
        display_height: u32,
    ) -> Self {
        let (x, dest_x, width) = center_axis(screen_width, display_width);
        let (y, dest_y, height) = center_axis(screen_height, display_height);
        Viewport {
            x,
            y,
            width,
            height,
            dest_x,
            dest_y,
        }
    }

    /// Clip the window to a canvas
    pub fn clip(self, canvas_width: u32, canvas_height: u32) -> Self {
        let x = self.x.min(canvas_width);
        let y = self.y.min(canvas_height);
        Viewport {
            x,
            y,
            width: self.width.min(canvas_width - x),
            height: self.height.min(canvas_height - y),
            ..self
        }
    }
}

/// Center one axis: (canvas offset, display offset, length)
fn center_axis(screen: u32, display: u32) -> (u32, u32, u32) {
    if screen > display {
        ((screen - display) / 2, 0, display)
    } else {
        (0, (display - screen) / 2, screen)
    }
}

impl<'a> Window<'a> {
    /// Create a window; viewport must already be clipped
    pub(crate) fn new(canvas: &'a Canvas, viewport: Viewport) -> Self {
        Window { canvas, viewport }
    }

    /// Get the window width
    pub fn width(&self) -> u32 {
        self.viewport.width
    }

    /// Get the window height
    pub fn height(&self) -> u32 {
        self.viewport.height
    }

    /// Get the display destination X
    pub fn dest_x(&self) -> u32 {
        self.viewport.dest_x
    }

    /// Get the display destination Y
    pub fn dest_y(&self) -> u32 {
        self.viewport.dest_y
    }

    /// Get one row of the window
    pub fn row(&self, y: u32) -> &'a [SRgba8] {
        assert!(y < self.height(), "window row {y} out of bounds");
        self.canvas
            .row(self.viewport.x, self.viewport.y + y, self.viewport.width)
    }

    /// Iterate over rows of the window
    pub fn rows(&self) -> impl Iterator<Item = &'a [SRgba8]> + '_ {
        (0..self.height()).map(move |y| self.row(y))
    }

    /// Get RGB color of a window pixel
    pub fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let [r, g, b, _] = self.rgba(x, y);
        [r, g, b]
    }

    /// Get alpha of a window pixel
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.rgba(x, y)[3]
    }

    /// Get RGBA bytes of a window pixel
    pub fn rgba(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(
            x < self.width() && y < self.height(),
            "window position ({x}, {y}) out of bounds"
        );
        self.canvas.rgba(self.viewport.x + x, self.viewport.y + y)
    }

    /// Copy the window
    pub fn to_snapshot(&self) -> Snapshot {
        let mut canvas = Canvas::new(self.width(), self.height());
        for (y, src) in (0..).zip(self.rows()) {
            canvas.row_mut(0, y, self.width()).copy_from_slice(src);
        }
        Snapshot {
            canvas,
            dest_x: self.dest_x(),
            dest_y: self.dest_y(),
        }
    }
}

impl Snapshot {
    /// Get a window covering the whole snapshot
    pub fn window(&self) -> Window<'_> {
        let viewport = Viewport::full(self.canvas.width(), self.canvas.height())
            .with_dest(self.dest_x, self.dest_y);
        Window::new(&self.canvas, viewport)
    }

    /// Get the snapshot width
    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    /// Get the snapshot height
    pub fn height(&self) -> u32 {
        self.canvas.height()
    }
}

impl Sink for NullSink {
    fn present(&mut self, _window: &Window<'_>) -> Result<()> {
        Ok(())
    }
}
