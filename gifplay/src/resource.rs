// resource.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! In-memory GIF resource
use crate::canvas::{Canvas, SharedCanvas};
use crate::color::ColorTable;
use crate::compose::Composition;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::frame::FrameRecord;
use crate::load;
use crate::present::Viewport;
use log::{debug, info};
use std::io::Read;

/// Decoded GIF animation, with its canvas
///
/// ## Example
/// ```
/// use gifplay::{ColorTable, Config, FrameRecord, GifResource};
///
/// # fn main() -> Result<(), gifplay::Error> {
/// let tbl = ColorTable::with_entries(&[[0, 0, 0], [0xFF, 0xFF, 0xFF]]);
/// let frame = FrameRecord::new(2, 2, vec![0, 1, 1, 0]).with_offset(1, 1);
/// let config = Config::default();
/// let res = GifResource::new(4, 4, Some(tbl), 0, vec![frame], config)?;
/// assert_eq!(res.frame_count(), 1);
/// # Ok(())
/// # }
/// ```
pub struct GifResource {
    /// Logical screen width
    screen_width: u16,
    /// Logical screen height
    screen_height: u16,
    /// Global color table
    global_color_table: Option<ColorTable>,
    /// Background color index
    background_idx: u8,
    /// Loop count from application extension
    loop_count: Option<u16>,
    /// All frames
    frames: Vec<FrameRecord>,
    /// Composited canvas (`None` after release)
    canvas: Option<SharedCanvas>,
    /// Next frame to play
    current_frame: usize,
    /// Loading / playback configuration
    config: Config,
}

impl GifResource {
    /// Load a GIF resource from a reader.
    ///
    /// The whole file is decoded and validated.  Nothing is returned on
    /// error; buffers already allocated are dropped.
    pub fn load<R: Read>(reader: R, config: Config) -> Result<Self> {
        load::read_resource(reader, config)
    }

    /// Create a GIF resource from decoded frame records
    pub fn new(
        screen_width: u16,
        screen_height: u16,
        global_color_table: Option<ColorTable>,
        background_idx: u8,
        frames: Vec<FrameRecord>,
        config: Config,
    ) -> Result<Self> {
        let res = GifResource {
            screen_width,
            screen_height,
            global_color_table,
            background_idx,
            loop_count: None,
            frames,
            canvas: None,
            current_frame: 0,
            config,
        };
        res.validate()?;
        let mut canvas =
            Canvas::new(u32::from(screen_width), u32::from(screen_height));
        res.composition().reset(&mut canvas);
        info!(
            "loaded {}x{} GIF: {} frames, {} raster bytes",
            screen_width,
            screen_height,
            res.frames.len(),
            res.raster_volume()
        );
        Ok(GifResource {
            canvas: Some(SharedCanvas::new(canvas)),
            ..res
        })
    }

    /// Set the loop count
    pub(crate) fn with_loop_count(mut self, loop_count: Option<u16>) -> Self {
        self.loop_count = loop_count;
        self
    }

    /// Validate screen, background and all frames
    fn validate(&self) -> Result<()> {
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(Error::InvalidScreenSize);
        }
        if self.frames.is_empty() {
            return Err(Error::NoFrames);
        }
        if let Some(max) = self.config.max_raster_volume() {
            if self.canvas_size() + self.raster_volume() > max {
                return Err(Error::TooLargeAnimation);
            }
        }
        if let Some(tbl) = self.background_table() {
            if usize::from(self.background_color_idx()) >= tbl.len() {
                return Err(Error::InvalidBackgroundIndex);
            }
        }
        let global = self.global_color_table.as_ref();
        for (n, frame) in self.frames.iter().enumerate() {
            debug!(
                "frame {n}: {}x{} at {},{} {:?}",
                frame.width(),
                frame.height(),
                frame.left(),
                frame.top(),
                frame.disposal()
            );
            frame.validate(
                u32::from(self.screen_width),
                u32::from(self.screen_height),
                global,
            )?;
        }
        Ok(())
    }

    /// Release the canvas and all frames.
    ///
    /// Playback must be stopped first.  Releasing twice is harmless.
    pub fn release(&mut self) {
        if self.canvas.take().is_some() {
            debug!("released {}x{} GIF", self.screen_width, self.screen_height);
        }
        self.frames = Vec::new();
        self.global_color_table = None;
        self.current_frame = 0;
    }

    /// Check if the resource has been released
    pub fn is_released(&self) -> bool {
        self.canvas.is_none()
    }

    /// Get the logical screen width
    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }

    /// Get the logical screen height
    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }

    /// Get the global color table
    pub fn global_color_table(&self) -> Option<&ColorTable> {
        self.global_color_table.as_ref()
    }

    /// Get the background color index (after override)
    pub fn background_color_idx(&self) -> u8 {
        self.config
            .background_override()
            .unwrap_or(self.background_idx)
    }

    /// Get the color table used for the background.
    ///
    /// This is the global table, or else the first frame's local table.
    fn background_table(&self) -> Option<&ColorTable> {
        self.global_color_table.as_ref().or_else(|| {
            self.frames
                .first()
                .and_then(FrameRecord::local_color_table)
        })
    }

    /// Get the resolved background color.
    ///
    /// Without any color table for the first frame, the background is
    /// black.
    pub fn background_color(&self) -> [u8; 3] {
        self.background_table()
            .and_then(|tbl| tbl.rgb(self.background_color_idx()))
            .unwrap_or_default()
    }

    /// Get the loop count from the application extension
    pub fn loop_count(&self) -> Option<u16> {
        self.loop_count
    }

    /// Get all frames
    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    /// Get the total frame count
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Get the combined raster volume of all frames, in bytes
    pub fn raster_volume(&self) -> usize {
        self.frames.iter().map(FrameRecord::image_sz).sum()
    }

    /// Get the size of the canvas, in bytes
    pub fn canvas_size(&self) -> usize {
        Canvas::byte_size(
            u32::from(self.screen_width),
            u32::from(self.screen_height),
        )
    }

    /// Get the index of the next frame to play
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Rewind to the first frame
    pub fn rewind(&mut self) {
        self.current_frame = 0;
    }

    /// Advance to the next frame, returning `true` on wrap to frame 0
    pub(crate) fn advance(&mut self) -> bool {
        self.current_frame += 1;
        if self.current_frame >= self.frames.len() {
            self.current_frame = 0;
            true
        } else {
            false
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check if transparency compositing is enabled
    pub fn transparency(&self) -> bool {
        self.config.transparency()
    }

    /// Get the shared canvas
    pub fn canvas(&self) -> Result<SharedCanvas> {
        self.canvas.clone().ok_or(Error::Released)
    }

    /// Get the presented window
    pub fn viewport(&self) -> Viewport {
        self.config.viewport().unwrap_or_else(|| {
            Viewport::full(
                u32::from(self.screen_width),
                u32::from(self.screen_height),
            )
        })
    }

    /// Set the presented window
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.config = self.config.clone().with_viewport(Some(viewport));
    }

    /// Get compositing parameters for this session
    pub fn composition(&self) -> Composition<'_> {
        Composition {
            global_color_table: self.global_color_table.as_ref(),
            background: self.background_color(),
            transparency: self.config.transparency(),
            disposal_override: self.config.disposal_override(),
            transparent_override: self.config.transparent_override(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    fn tbl() -> ColorTable {
        ColorTable::with_entries(&[[1, 2, 3], [4, 5, 6]])
    }

    fn frame() -> FrameRecord {
        FrameRecord::new(2, 2, vec![0, 1, 1, 0])
    }

    #[test]
    fn new_resets_canvas() -> Result<()> {
        let cfg = Config::default();
        let res = GifResource::new(3, 2, Some(tbl()), 1, vec![frame()], cfg)?;
        let canvas = res.canvas()?;
        assert_eq!(canvas.read(|c| (c.width(), c.height())), (3, 2));
        assert_eq!(canvas.read(|c| c.rgba(2, 1)), [4, 5, 6, 0xFF]);
        let config = Config::default().with_transparency(true);
        let res =
            GifResource::new(3, 2, Some(tbl()), 1, vec![frame()], config)?;
        assert_eq!(res.canvas()?.read(|c| c.rgba(2, 1)), [4, 5, 6, 0]);
        Ok(())
    }

    #[test]
    fn rejects_bad_input() {
        let err = |r: Result<GifResource>| r.err().map(|e| e.kind());
        let cfg = Config::default;
        assert_eq!(
            err(GifResource::new(0, 2, Some(tbl()), 0, vec![frame()], cfg())),
            Some(ErrorKind::CorruptInput)
        );
        assert!(matches!(
            GifResource::new(2, 2, Some(tbl()), 0, vec![], cfg()),
            Err(Error::NoFrames)
        ));
        assert!(matches!(
            GifResource::new(2, 2, Some(tbl()), 2, vec![frame()], cfg()),
            Err(Error::InvalidBackgroundIndex)
        ));
        assert!(matches!(
            GifResource::new(2, 2, None, 0, vec![frame()], cfg()),
            Err(Error::MissingColorTable)
        ));
        let f = frame().with_offset(1, 0);
        assert!(matches!(
            GifResource::new(2, 2, Some(tbl()), 0, vec![f], cfg()),
            Err(Error::InvalidFrameDimensions)
        ));
        let small = cfg().with_max_raster_volume(Some(7));
        assert_eq!(
            err(GifResource::new(
                2,
                2,
                Some(tbl()),
                0,
                vec![frame(), frame()],
                small
            )),
            Some(ErrorKind::ResourceExhausted)
        );
    }

    #[test]
    fn background() -> Result<()> {
        let cfg = Config::default().with_background_override(Some(0));
        let res = GifResource::new(2, 2, Some(tbl()), 1, vec![frame()], cfg)?;
        assert_eq!(res.background_color(), [1, 2, 3]);
        let f = frame().with_local_color_table(Some(tbl()));
        let res = GifResource::new(2, 2, None, 1, vec![f], Config::default())?;
        assert_eq!(res.background_color(), [4, 5, 6]);
        Ok(())
    }

    #[test]
    fn background_from_local_table() -> Result<()> {
        let local = ColorTable::with_entries(&[[9, 9, 9], [1, 1, 1]]);
        let f = FrameRecord::new(1, 1, vec![1])
            .with_local_color_table(Some(local.clone()));
        let cfg = Config::default;
        let res = GifResource::new(2, 2, None, 0, vec![f.clone()], cfg())?;
        assert_eq!(res.background_color(), [9, 9, 9]);
        // pixels not covered by the frame
        assert_eq!(res.canvas()?.read(|c| c.rgba(1, 1)), [9, 9, 9, 0xFF]);
        assert!(matches!(
            GifResource::new(2, 2, None, 2, vec![f], cfg()),
            Err(Error::InvalidBackgroundIndex)
        ));
        // later local tables are not used
        let f0 = FrameRecord::new(1, 1, vec![0]).with_offset(1, 1);
        let f1 = frame().with_local_color_table(Some(local));
        let g = Some(tbl());
        let res = GifResource::new(2, 2, g, 0, vec![f0, f1], cfg())?;
        assert_eq!(res.background_color(), [1, 2, 3]);
        Ok(())
    }

    #[test]
    fn ceiling_counts_canvas() {
        let dot = || vec![FrameRecord::new(1, 1, vec![0])];
        let max = |v| Config::default().with_max_raster_volume(Some(v));
        assert!(matches!(
            GifResource::new(4096, 4096, Some(tbl()), 0, dot(), max(16)),
            Err(Error::TooLargeAnimation)
        ));
        let cfg = Config::default();
        let res = GifResource::new(0xFFFF, 0xFFFF, Some(tbl()), 0, dot(), cfg);
        let kind = res.err().map(|e| e.kind());
        assert_eq!(kind, Some(ErrorKind::ResourceExhausted));
        // 2x2 canvas is 16 bytes, plus one byte of frame
        assert!(GifResource::new(2, 2, Some(tbl()), 0, dot(), max(16)).is_err());
        assert!(GifResource::new(2, 2, Some(tbl()), 0, dot(), max(17)).is_ok());
    }

    #[test]
    fn advance_wraps() -> Result<()> {
        let frames = vec![frame(), frame(), frame()];
        let mut res =
            GifResource::new(2, 2, Some(tbl()), 0, frames, Config::default())?;
        assert!(!res.advance());
        assert!(!res.advance());
        assert_eq!(res.current_frame(), 2);
        assert!(res.advance());
        assert_eq!(res.current_frame(), 0);
        Ok(())
    }

    #[test]
    fn release_twice() -> Result<()> {
        let cfg = Config::default();
        let mut res =
            GifResource::new(2, 2, Some(tbl()), 0, vec![frame()], cfg)?;
        assert!(!res.is_released());
        res.release();
        res.release();
        assert!(res.is_released());
        assert_eq!(res.frame_count(), 0);
        let kind = res.canvas().err().map(|e| e.kind());
        assert_eq!(kind, Some(ErrorKind::InvalidState));
        Ok(())
    }
}
