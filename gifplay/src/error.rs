// error.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
use std::fmt;
use std::io;

/// Broad classes of [Error]s
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input data is malformed or inconsistent.
    CorruptInput,
    /// A configured limit was exceeded.
    ResourceExhausted,
    /// Operation requested on a released or never-loaded resource.
    InvalidState,
    /// Playback stopped by request.
    Cancelled,
}

/// Errors encountered while loading or playing an animation
#[derive(Debug)]
pub enum Error {
    /// A wrapped I/O error.
    Io(io::Error),
    /// Error from the GIF container reader.
    Decode(gift::Error),
    /// Logical screen has zero width or height.
    InvalidScreenSize,
    /// File contains no frames.
    NoFrames,
    /// Frame location / size larger than screen size.
    InvalidFrameDimensions,
    /// Frame raster length does not match its width and height.
    RasterSizeMismatch,
    /// Missing color table for a frame.
    MissingColorTable,
    /// Invalid color index in a frame.
    InvalidColorIndex,
    /// Background color index outside of the background color table.
    InvalidBackgroundIndex,
    /// Combined raster volume larger than
    /// [max_raster_volume](struct.Config.html#method.with_max_raster_volume).
    TooLargeAnimation,
    /// Resource has been released.
    Released,
    /// Playback was stopped.
    Cancelled,
}

/// Gifplay result type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Get the kind of error
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            Io(_) | Decode(_) => ErrorKind::CorruptInput,
            InvalidScreenSize | NoFrames | InvalidFrameDimensions => {
                ErrorKind::CorruptInput
            }
            RasterSizeMismatch | MissingColorTable | InvalidColorIndex => {
                ErrorKind::CorruptInput
            }
            InvalidBackgroundIndex => ErrorKind::CorruptInput,
            TooLargeAnimation => ErrorKind::ResourceExhausted,
            Released => ErrorKind::InvalidState,
            Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(fmt),
            Error::Decode(err) => err.fmt(fmt),
            _ => fmt::Debug::fmt(self, fmt),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::Decode(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<gift::Error> for Error {
    fn from(err: gift::Error) -> Self {
        match err {
            gift::Error::Io(err) => Error::Io(err),
            gift::Error::TooLargeImage => Error::TooLargeAnimation,
            gift::Error::InvalidFrameDimensions => Error::InvalidFrameDimensions,
            gift::Error::MissingColorTable => Error::MissingColorTable,
            gift::Error::InvalidColorIndex => Error::InvalidColorIndex,
            err => Error::Decode(err),
        }
    }
}
