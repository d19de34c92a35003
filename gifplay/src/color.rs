// color.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Color tables
use pix::rgb::{SRgb8, SRgba8};

/// Number of channels in a color table entry
const CHANNELS: usize = 3;

/// Fully opaque alpha value
pub const OPAQUE: u8 = 0xFF;

/// Fully transparent alpha value
pub const TRANSPARENT: u8 = 0x00;

/// Global or local color table
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorTable {
    entries: Vec<[u8; CHANNELS]>,
}

impl ColorTable {
    /// Create a color table from packed RGB bytes.
    ///
    /// Trailing bytes which do not make a full entry are ignored.
    pub fn with_colors(colors: &[u8]) -> Self {
        let entries = colors
            .chunks_exact(CHANNELS)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        ColorTable { entries }
    }

    /// Create a color table from RGB triples
    pub fn with_entries(entries: &[[u8; 3]]) -> Self {
        ColorTable {
            entries: entries.to_vec(),
        }
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get one entry
    pub fn entry(&self, idx: u8) -> Option<SRgb8> {
        self.entries
            .get(usize::from(idx))
            .map(|[r, g, b]| SRgb8::new(*r, *g, *b))
    }

    /// Get one entry as raw RGB bytes
    pub fn rgb(&self, idx: u8) -> Option<[u8; 3]> {
        self.entries.get(usize::from(idx)).copied()
    }

    /// Resolve an index to a canvas pixel.
    ///
    /// Indices are checked when a resource is loaded; an index outside the
    /// table here is a bug.
    pub(crate) fn rgba(&self, idx: u8, alpha: u8) -> SRgba8 {
        let [r, g, b] = self.entries[usize::from(idx)];
        SRgba8::new(r, g, b, alpha)
    }
}
