//! Frame sources: where decoded frames come from.

pub(crate) mod ffmpeg;
pub(crate) mod memory;

use std::{fmt, path::PathBuf, str::FromStr};

use crate::{foundation::core::Frame, foundation::error::LightrailResult};

/// What to open: a capture device index or a video file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceId {
    /// Capture device index.
    Device(u32),
    /// Video file.
    Path(PathBuf),
}

impl SourceId {
    /// All-digit strings are device indices, anything else is a path.
    pub fn parse(s: &str) -> Self {
        if !s.is_empty()
            && s.bytes().all(|b| b.is_ascii_digit())
            && let Ok(idx) = s.parse::<u32>()
        {
            return Self::Device(idx);
        }
        Self::Path(PathBuf::from(s))
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::Device(0)
    }
}

impl FromStr for SourceId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(idx) => write!(f, "device #{idx}"),
            Self::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

/// Stream properties known once a source is open.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceInfo {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Samples per pixel of delivered frames.
    pub channels: u8,
    /// Nominal frame rate, when the container reports one.
    pub fps: Option<f64>,
}

/// An open stream of decoded frames.
pub trait FrameSource: Send {
    /// Stream properties, fixed once open.
    fn info(&self) -> SourceInfo;

    /// Next frame, or `Ok(None)` once the stream is exhausted. Blocks until a frame is ready.
    fn read(&mut self) -> LightrailResult<Option<Frame>>;

    /// Release the underlying handle. Reads after `close` report exhaustion.
    fn close(&mut self) -> LightrailResult<()> {
        Ok(())
    }
}

/// Opens sources by [`SourceId`].
pub trait SourceOpener {
    /// Open `id`. Failure is a [`LightrailError::SourceOpen`](crate::LightrailError::SourceOpen).
    fn open(&self, id: &SourceId) -> LightrailResult<Box<dyn FrameSource>>;
}

pub use ffmpeg::{FfmpegSource, FfmpegSourceOpener, is_ffprobe_on_path};
pub use memory::{MemorySource, MemorySourceOpener};

#[cfg(test)]
#[path = "../tests/unit/source/id.rs"]
mod tests;
