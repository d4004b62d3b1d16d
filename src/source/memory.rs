use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use crate::{
    foundation::core::{Frame, FrameShape},
    foundation::error::{LightrailError, LightrailResult},
    source::{FrameSource, SourceId, SourceInfo, SourceOpener},
};

/// In-memory source for tests, demos and synthetic input.
#[derive(Debug)]
pub struct MemorySource {
    shape: FrameShape,
    frames: VecDeque<Frame>,
    read_delay: Option<Duration>,
    closed: bool,
}

impl MemorySource {
    /// Source yielding `frames` in order; each must have `shape`.
    pub fn new(shape: FrameShape, frames: Vec<Frame>) -> LightrailResult<Self> {
        if let Some(bad) = frames.iter().position(|f| f.shape() != shape) {
            return Err(LightrailError::validation(format!(
                "memory source frame {bad} does not match the declared shape"
            )));
        }
        Ok(Self {
            shape,
            frames: frames.into(),
            read_delay: None,
            closed: false,
        })
    }

    /// Sleep this long inside every `read`, to imitate slow capture hardware.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Frames not yet read.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    /// True after `close`.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl FrameSource for MemorySource {
    fn info(&self) -> SourceInfo {
        SourceInfo {
            width: self.shape.width,
            height: self.shape.height,
            channels: self.shape.channels,
            fps: None,
        }
    }

    fn read(&mut self) -> LightrailResult<Option<Frame>> {
        if self.closed {
            return Ok(None);
        }
        if let Some(delay) = self.read_delay {
            std::thread::sleep(delay);
        }
        Ok(self.frames.pop_front())
    }

    fn close(&mut self) -> LightrailResult<()> {
        self.closed = true;
        self.frames.clear();
        Ok(())
    }
}

/// Hands out fresh [`MemorySource`]s over a fixed frame list and counts how often it was asked.
#[derive(Debug)]
pub struct MemorySourceOpener {
    shape: FrameShape,
    frames: Vec<Frame>,
    read_delay: Option<Duration>,
    opens: AtomicUsize,
}

impl MemorySourceOpener {
    /// Opener handing out copies of `frames`.
    pub fn new(shape: FrameShape, frames: Vec<Frame>) -> Self {
        Self {
            shape,
            frames,
            read_delay: None,
            opens: AtomicUsize::new(0),
        }
    }

    /// Apply [`MemorySource::with_read_delay`] to every opened source.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Number of `open` calls so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl SourceOpener for MemorySourceOpener {
    fn open(&self, id: &SourceId) -> LightrailResult<Box<dyn FrameSource>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(source = %id, frames = self.frames.len(), "opening memory source");
        let mut src = MemorySource::new(self.shape, self.frames.clone())?;
        if let Some(delay) = self.read_delay {
            src = src.with_read_delay(delay);
        }
        Ok(Box::new(src))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/memory.rs"]
mod tests;
