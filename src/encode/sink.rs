use crate::foundation::core::{Frame, FrameIndex};
use crate::foundation::error::{LightrailError, LightrailResult};

/// Configuration provided to a [`FrameSink`] when a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Interleaved samples per pixel.
    pub channels: u8,
    /// Declared playback rate of the output. Timing metadata only.
    pub fps: u32,
}

/// Sink contract for persisting composited frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order, between
/// one `begin` and one `end`. A frame is either fully handed over or not at all.
pub trait FrameSink {
    /// Start a run; called once before any frame.
    fn begin(&mut self, cfg: SinkConfig) -> LightrailResult<()>;
    /// Persist one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> LightrailResult<()>;
    /// Flush and finalize the output.
    fn end(&mut self) -> LightrailResult<()>;
}

/// Discards everything. Used when a run does not record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn begin(&mut self, _cfg: SinkConfig) -> LightrailResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, _frame: &Frame) -> LightrailResult<()> {
        Ok(())
    }

    fn end(&mut self) -> LightrailResult<()> {
        Ok(())
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    ended: bool,
    /// Frames in emission order.
    pub frames: Vec<(FrameIndex, Frame)>,
}

impl InMemorySink {
    /// Empty sink, not yet begun.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration from the last `begin`.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// True once `end` has been called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> LightrailResult<()> {
        self.cfg = Some(cfg);
        self.ended = false;
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> LightrailResult<()> {
        let Some(cfg) = self.cfg else {
            return Err(LightrailError::sink("push_frame before begin"));
        };
        if self.ended {
            return Err(LightrailError::sink("push_frame after end"));
        }
        if frame.width() != cfg.width
            || frame.height() != cfg.height
            || frame.channels() != cfg.channels
        {
            return Err(LightrailError::sink(format!(
                "frame size mismatch: got {}x{}x{}, expected {}x{}x{}",
                frame.width(),
                frame.height(),
                frame.channels(),
                cfg.width,
                cfg.height,
                cfg.channels
            )));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> LightrailResult<()> {
        self.ended = true;
        Ok(())
    }
}
