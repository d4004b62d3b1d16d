use std::{
    io::Write as _,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    encode::sink::{FrameSink, SinkConfig},
    foundation::core::{Frame, FrameIndex},
    foundation::error::{LightrailError, LightrailResult},
    foundation::process::StderrDrain,
};

/// Output codec, normally chosen from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoCodec {
    /// Motion JPEG, full-resolution chroma. Any frame size.
    Mjpeg,
    /// H.264 in yuv420p. Needs even dimensions.
    H264,
}

impl VideoCodec {
    /// `.avi`/`.mjpeg` -> MJPEG, everything else -> H.264.
    pub fn for_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("avi" | "mjpeg" | "mjpg") => Self::Mjpeg,
            _ => Self::H264,
        }
    }
}

/// Everything the encoder child process needs.
#[derive(Clone, Debug)]
pub struct EncodeConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Interleaved samples per pixel.
    pub channels: u8,
    /// Declared output frame rate.
    pub fps: u32,
    /// Output codec.
    pub codec: VideoCodec,
    /// Destination file.
    pub out_path: PathBuf,
    /// Replace an existing file instead of failing.
    pub overwrite: bool,
}

impl EncodeConfig {
    /// Reject sizes, rates and layouts the encoder cannot take.
    pub fn validate(&self) -> LightrailResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LightrailError::sink("encode width/height must be non-zero"));
        }
        if self.fps == 0 {
            return Err(LightrailError::sink("encode fps must be non-zero"));
        }
        if input_pix_fmt(self.channels).is_none() {
            return Err(LightrailError::sink(format!(
                "cannot encode frames with {} channels",
                self.channels
            )));
        }
        if self.codec == VideoCodec::H264
            && (!self.width.is_multiple_of(2) || !self.height.is_multiple_of(2))
        {
            return Err(LightrailError::sink(
                "encode width/height must be even for H.264 (yuv420p) output; use .avi for MJPEG",
            ));
        }
        Ok(())
    }
}

fn input_pix_fmt(channels: u8) -> Option<&'static str> {
    match channels {
        1 => Some("gray"),
        3 => Some("rgb24"),
        4 => Some("rgba"),
        _ => None,
    }
}

/// Whether an `ffmpeg` binary answers `-version`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> LightrailResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Streams raw frames into the system `ffmpeg` binary.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<StderrDrain>,
    frame_len: usize,
}

impl std::fmt::Debug for FfmpegEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegEncoder")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl FfmpegEncoder {
    /// Validate `cfg` and spawn `ffmpeg` reading raw frames from stdin.
    pub fn new(cfg: EncodeConfig) -> LightrailResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(LightrailError::sink(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(LightrailError::sink(
                "ffmpeg is required for recording, but was not found on PATH",
            ));
        }

        let in_fmt = input_pix_fmt(cfg.channels).unwrap_or("rgb24");
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.arg(if cfg.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            in_fmt,
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
        ]);
        match cfg.codec {
            VideoCodec::Mjpeg => cmd.args(["-c:v", "mjpeg", "-q:v", "3", "-pix_fmt", "yuvj444p"]),
            VideoCodec::H264 => cmd.args([
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ]),
        };
        cmd.arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            LightrailError::sink(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LightrailError::sink("failed to open ffmpeg stdin (unexpected)"))?;
        let stderr = StderrDrain::start(&mut child)
            .ok_or_else(|| LightrailError::sink("failed to open ffmpeg stderr (unexpected)"))?;

        tracing::info!(
            out = %cfg.out_path.display(),
            width = cfg.width,
            height = cfg.height,
            fps = cfg.fps,
            codec = ?cfg.codec,
            "recording"
        );

        Ok(Self {
            frame_len: cfg.width as usize * cfg.height as usize * usize::from(cfg.channels),
            cfg,
            child,
            stdin: Some(stdin),
            stderr: Some(stderr),
        })
    }

    /// Write one frame to the encoder.
    pub fn encode_frame(&mut self, frame: &Frame) -> LightrailResult<()> {
        if frame.width() != self.cfg.width
            || frame.height() != self.cfg.height
            || frame.channels() != self.cfg.channels
        {
            return Err(LightrailError::sink(format!(
                "frame size mismatch: got {}x{}x{}, expected {}x{}x{}",
                frame.width(),
                frame.height(),
                frame.channels(),
                self.cfg.width,
                self.cfg.height,
                self.cfg.channels
            )));
        }
        if frame.data().len() != self.frame_len {
            return Err(LightrailError::sink(
                "frame data size mismatch with width*height*channels",
            ));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(LightrailError::sink("ffmpeg encoder is already finalized"));
        };

        stdin.write_all(frame.data()).map_err(|e| {
            LightrailError::sink(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;

        Ok(())
    }

    /// Close stdin and wait for `ffmpeg`; a non-zero exit carries its stderr.
    pub fn finish(mut self) -> LightrailResult<()> {
        drop(self.stdin.take());

        let status = self.child.wait().map_err(|e| {
            LightrailError::sink(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr = match self.stderr.take() {
            Some(drain) => drain
                .finish()
                .map_err(|e| LightrailError::sink(format!("ffmpeg stderr read failed: {e}")))?,
            None => String::new(),
        };

        if !status.success() {
            return Err(LightrailError::sink(format!(
                "ffmpeg exited with status {status}: {stderr}"
            )));
        }

        Ok(())
    }
}

/// [`FrameSink`] that records to a video file; the encoder starts on `begin`.
#[derive(Debug)]
pub struct FfmpegSink {
    out_path: PathBuf,
    codec: VideoCodec,
    overwrite: bool,
    encoder: Option<FfmpegEncoder>,
}

impl FfmpegSink {
    /// Sink recording to `out_path`, overwriting by default.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        let out_path = out_path.into();
        Self {
            codec: VideoCodec::for_path(&out_path),
            out_path,
            overwrite: true,
            encoder: None,
        }
    }

    /// Fail on `begin` instead of replacing an existing file.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Destination file.
    pub fn out_path(&self) -> &Path {
        &self.out_path
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> LightrailResult<()> {
        if self.encoder.is_some() {
            return Err(LightrailError::sink("ffmpeg sink already started"));
        }
        self.encoder = Some(FfmpegEncoder::new(EncodeConfig {
            width: cfg.width,
            height: cfg.height,
            channels: cfg.channels,
            fps: cfg.fps,
            codec: self.codec,
            out_path: self.out_path.clone(),
            overwrite: self.overwrite,
        })?);
        Ok(())
    }

    fn push_frame(&mut self, _idx: FrameIndex, frame: &Frame) -> LightrailResult<()> {
        let Some(enc) = self.encoder.as_mut() else {
            return Err(LightrailError::sink("push_frame before begin"));
        };
        enc.encode_frame(frame)
    }

    fn end(&mut self) -> LightrailResult<()> {
        match self.encoder.take() {
            Some(enc) => enc.finish(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
