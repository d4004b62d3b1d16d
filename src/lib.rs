//! Lightrail turns a live camera feed or a video file into a light-trail video.
//!
//! Every incoming frame is downscaled and handed to a [`Compositor`]:
//!
//! - [`EchoCompositor`] blends the last N frames (per-sample max mixed with the mean)
//! - [`ResidualCompositor`] keeps a decaying per-sample maximum over the whole stream
//!
//! A [`PlaybackLoop`] drives one compositor over one [`FrameSource`], shows each composite on a
//! [`Display`], and optionally records it through a [`FrameSink`] (`ffmpeg` on PATH for files).
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

mod composite;
/// Run configuration.
pub mod config;
mod display;
mod encode;
mod feed;
mod playback;
mod resize;
mod source;

pub use crate::foundation::core::{Frame, FrameIndex, FrameShape, quantize_u8};
pub use crate::foundation::error::{LightrailError, LightrailResult};
pub use crate::foundation::logging::init_logging;

pub use crate::composite::{Compositor, EchoCompositor, ResidualCompositor, create_compositor};
pub use crate::config::{BlendWeights, LoggingConfig, TrailConfig, TrailMode};
pub use crate::display::{Display, HeadlessDisplay, QuitSignal, SnapshotDisplay, write_png};
pub use crate::encode::ffmpeg::{
    EncodeConfig, FfmpegEncoder, FfmpegSink, VideoCodec, is_ffmpeg_on_path,
};
pub use crate::encode::sink::{FrameSink, InMemorySink, NullSink, SinkConfig};
pub use crate::feed::{AsyncFrameFeed, FeedPoll, FrameSlot};
pub use crate::playback::{PlaybackLoop, PlaybackReport, PlaybackState, run_trail};
pub use crate::resize::{Resizer, downscaled_dims, resize};
pub use crate::source::{
    FfmpegSource, FfmpegSourceOpener, FrameSource, MemorySource, MemorySourceOpener, SourceId,
    SourceInfo, SourceOpener, is_ffprobe_on_path,
};
