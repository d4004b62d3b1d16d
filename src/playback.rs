//! The compositing run: pull frames, resize, composite, show, record, repeat.

use std::time::Instant;

use crate::{
    composite::{Compositor, create_compositor},
    config::TrailConfig,
    display::Display,
    encode::sink::{FrameSink, NullSink, SinkConfig},
    feed::{AsyncFrameFeed, FeedPoll},
    foundation::core::{Frame, FrameIndex},
    foundation::error::LightrailResult,
    resize::Resizer,
    source::{FrameSource, SourceId, SourceOpener},
};

/// Lifecycle of one run: `Init -> Running -> (Stopped | Exhausted)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    /// Built, nothing opened yet.
    #[default]
    Init,
    /// Frames are flowing.
    Running,
    /// A quit was requested.
    Stopped,
    /// The source ran out of frames.
    Exhausted,
}

/// Counters collected over a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    /// How the run ended.
    pub state: PlaybackState,
    /// Distinct source frames that reached the compositor.
    pub frames_read: u64,
    /// Frames the capture thread published (async mode only).
    pub frames_captured: u64,
    /// Composites produced, one per tick.
    pub frames_composited: u64,
    /// Frames handed to the sink (0 when not recording).
    pub frames_written: u64,
    /// Ticks that re-used the previous tick's frame (async mode only).
    pub duplicate_ticks: u64,
}

/// Drives one compositor over one source.
#[derive(Debug)]
pub struct PlaybackLoop {
    cfg: TrailConfig,
    state: PlaybackState,
}

impl PlaybackLoop {
    /// Validates `cfg`; nothing is opened yet.
    pub fn new(cfg: TrailConfig) -> LightrailResult<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            state: PlaybackState::Init,
        })
    }

    /// The validated configuration.
    pub fn config(&self) -> &TrailConfig {
        &self.cfg
    }

    /// Where the last run got to.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Run until the source is exhausted, a quit is requested, or something fails.
    ///
    /// The source is opened before the sink, so a source that cannot be opened leaves no output
    /// file behind. On every exit path the source is closed and then the sink is finalized; the
    /// first error wins and teardown errors after it are only logged.
    #[tracing::instrument(skip_all, fields(source = %id, mode = ?self.cfg.mode))]
    pub fn run(
        &mut self,
        opener: &dyn SourceOpener,
        id: &SourceId,
        sink: Option<&mut dyn FrameSink>,
        display: &mut dyn Display,
    ) -> LightrailResult<PlaybackReport> {
        self.state = PlaybackState::Init;
        let compositor = create_compositor(&self.cfg)?;

        let mut source = opener.open(id)?;
        let info = source.info();
        let resizer =
            match Resizer::for_source(info.width, info.height, self.cfg.downscale_factor()) {
                Ok(r) => r,
                Err(e) => {
                    close_source(source.as_mut());
                    return Err(e);
                }
            };
        let (width, height) = resizer.output_dims();

        let recording = sink.is_some();
        let mut null = NullSink;
        let sink: &mut dyn FrameSink = match sink {
            Some(s) => s,
            None => &mut null,
        };

        if self.cfg.speed == 0 && recording {
            tracing::warn!("speed 0 gives the recording no frame rate; declaring 1 fps");
        }
        let sink_cfg = SinkConfig {
            width,
            height,
            channels: info.channels,
            fps: self.cfg.sink_fps(),
        };
        if let Err(e) = sink.begin(sink_cfg) {
            close_source(source.as_mut());
            return Err(e);
        }

        tracing::info!(
            compositor = compositor.name(),
            src_width = info.width,
            src_height = info.height,
            width,
            height,
            fps = sink_cfg.fps,
            recording,
            async_feed = self.cfg.async_feed,
            "playback started"
        );
        self.state = PlaybackState::Running;

        let mut tick = Tick {
            resizer,
            compositor,
            sink: &mut *sink,
            recording,
            display,
            next_index: FrameIndex(0),
            report: PlaybackReport::default(),
        };

        let outcome = if self.cfg.async_feed {
            self.run_async(source, &mut tick)
        } else {
            let outcome = run_sync(source.as_mut(), &mut tick);
            close_source_after(source.as_mut(), &outcome);
            outcome
        };
        let mut report = tick.report;

        let ended = sink.end();
        let state = match (outcome, ended) {
            (Ok(state), Ok(())) => state,
            (Ok(_), Err(e)) => {
                self.state = PlaybackState::Stopped;
                return Err(e);
            }
            (Err(e), ended) => {
                self.state = PlaybackState::Stopped;
                if let Err(end_err) = ended {
                    tracing::warn!(error = %end_err, "sink teardown failed after run error");
                }
                return Err(e);
            }
        };

        self.state = state;
        report.state = state;
        tracing::info!(
            state = ?report.state,
            read = report.frames_read,
            composited = report.frames_composited,
            written = report.frames_written,
            duplicates = report.duplicate_ticks,
            "playback finished"
        );
        Ok(report)
    }

    fn run_async(
        &self,
        source: Box<dyn FrameSource>,
        tick: &mut Tick<'_>,
    ) -> LightrailResult<PlaybackState> {
        let mut feed = AsyncFrameFeed::start(source)?;
        let interval = self.cfg.tick_interval();
        let mut deadline = Instant::now();

        let outcome = loop {
            match feed.poll() {
                Err(e) => break Err(e),
                Ok(FeedPoll::Exhausted) => break Ok(PlaybackState::Exhausted),
                Ok(FeedPoll::Frame { frame, fresh, .. }) => {
                    if fresh {
                        tick.report.frames_read += 1;
                    } else {
                        tick.report.duplicate_ticks += 1;
                    }
                    match tick.step(&frame) {
                        Err(e) => break Err(e),
                        Ok(true) => break Ok(PlaybackState::Stopped),
                        Ok(false) => {}
                    }
                }
            }

            deadline += interval;
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            } else {
                deadline = now;
            }
        };

        tick.report.frames_captured = feed.frames_published();
        match feed.join() {
            Ok(Some(mut source)) => close_source_after(source.as_mut(), &outcome),
            Ok(None) => {}
            Err(e) if outcome.is_ok() => return Err(e),
            Err(e) => tracing::warn!(error = %e, "capture thread teardown failed after run error"),
        }
        outcome
    }
}

/// Validate `cfg`, then run one playback over `id`.
///
/// Invalid configuration is reported before `opener` is touched.
pub fn run_trail(
    cfg: TrailConfig,
    opener: &dyn SourceOpener,
    id: &SourceId,
    sink: Option<&mut dyn FrameSink>,
    display: &mut dyn Display,
) -> LightrailResult<PlaybackReport> {
    PlaybackLoop::new(cfg)?.run(opener, id, sink, display)
}

fn run_sync(source: &mut dyn FrameSource, tick: &mut Tick<'_>) -> LightrailResult<PlaybackState> {
    loop {
        let Some(frame) = source.read()? else {
            return Ok(PlaybackState::Exhausted);
        };
        tick.report.frames_read += 1;
        if tick.step(&frame)? {
            return Ok(PlaybackState::Stopped);
        }
    }
}

/// Per-run pipeline state owned by the compositing thread.
struct Tick<'a> {
    resizer: Resizer,
    compositor: Box<dyn Compositor>,
    sink: &'a mut dyn FrameSink,
    recording: bool,
    display: &'a mut dyn Display,
    next_index: FrameIndex,
    report: PlaybackReport,
}

impl Tick<'_> {
    /// Resize, composite, show and record one frame. Returns true when a quit was requested.
    fn step(&mut self, frame: &Frame) -> LightrailResult<bool> {
        let small = self.resizer.apply(frame)?;
        let out = self.compositor.push(small)?;
        self.report.frames_composited += 1;

        self.display.show(&out)?;
        self.sink.push_frame(self.next_index, &out)?;
        if self.recording {
            self.report.frames_written += 1;
        }
        tracing::trace!(index = self.next_index.0, "tick");
        self.next_index = self.next_index.next();

        Ok(self.display.poll_quit())
    }
}

fn close_source(source: &mut dyn FrameSource) {
    if let Err(e) = source.close() {
        tracing::warn!(error = %e, "failed to close source");
    }
}

fn close_source_after(source: &mut dyn FrameSource, outcome: &LightrailResult<PlaybackState>) {
    close_source(source);
    if let Ok(state) = outcome {
        tracing::debug!(?state, "source closed");
    }
}

#[cfg(test)]
#[path = "../tests/unit/playback.rs"]
mod tests;
