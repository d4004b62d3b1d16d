use std::{
    ffi::OsString,
    io::Read,
    process::{Child, ChildStdout, Command, Stdio},
};

use crate::{
    foundation::core::{Frame, FrameShape},
    foundation::error::{LightrailError, LightrailResult},
    foundation::process::StderrDrain,
    source::{FrameSource, SourceId, SourceInfo, SourceOpener},
};

/// Channels delivered by the decoder pipe (`rgb24`).
const PIPE_CHANNELS: u8 = 3;

/// Whether an `ffprobe` binary answers `-version`.
pub fn is_ffprobe_on_path() -> bool {
    Command::new("ffprobe")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Opens files and capture devices through the system `ffmpeg`/`ffprobe` binaries.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegSourceOpener;

impl SourceOpener for FfmpegSourceOpener {
    fn open(&self, id: &SourceId) -> LightrailResult<Box<dyn FrameSource>> {
        Ok(Box::new(FfmpegSource::open(id)?))
    }
}

/// Decodes a stream to raw RGB24 frames read from an `ffmpeg` child process.
pub struct FfmpegSource {
    info: SourceInfo,
    child: Child,
    stdout: Option<ChildStdout>,
    stderr: Option<StderrDrain>,
    frame_len: usize,
    frames_read: u64,
}

impl std::fmt::Debug for FfmpegSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegSource")
            .field("info", &self.info)
            .field("frames_read", &self.frames_read)
            .finish_non_exhaustive()
    }
}

/// `(input format, input path)` for ffmpeg's `-f`/`-i`.
fn input_args(id: &SourceId) -> LightrailResult<(Option<&'static str>, OsString)> {
    match id {
        SourceId::Path(p) => {
            if !p.is_file() {
                return Err(LightrailError::source_open(format!(
                    "input file '{}' does not exist",
                    p.display()
                )));
            }
            Ok((None, p.as_os_str().to_owned()))
        }
        SourceId::Device(idx) => {
            if cfg!(target_os = "linux") {
                Ok((Some("v4l2"), OsString::from(format!("/dev/video{idx}"))))
            } else {
                Err(LightrailError::source_open(
                    "capture devices are only supported through v4l2 on Linux",
                ))
            }
        }
    }
}

impl FfmpegSource {
    /// Inspect `id` with ffprobe and start decoding it.
    #[tracing::instrument]
    pub fn open(id: &SourceId) -> LightrailResult<Self> {
        let (format, input) = input_args(id)?;
        let stream = read_stream_meta(format, &input)?;
        let shape = FrameShape::new(stream.width, stream.height, PIPE_CHANNELS)
            .map_err(|e| LightrailError::source_open(format!("{id}: {e}")))?;

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .args(["-v", "error"]);
        if let Some(format) = format {
            cmd.args(["-f", format]);
        }
        cmd.arg("-i")
            .arg(&input)
            .args(["-an", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"]);

        let mut child = cmd.spawn().map_err(|e| {
            LightrailError::source_open(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            LightrailError::source_open("failed to open ffmpeg stdout (unexpected)")
        })?;
        let stderr = StderrDrain::start(&mut child);

        tracing::info!(
            source = %id,
            width = shape.width,
            height = shape.height,
            fps = ?stream.fps,
            "opened source"
        );

        Ok(Self {
            info: SourceInfo {
                width: shape.width,
                height: shape.height,
                channels: shape.channels,
                fps: stream.fps,
            },
            child,
            stdout: Some(stdout),
            stderr,
            frame_len: shape.sample_len(),
            frames_read: 0,
        })
    }

    fn finish_stream(&mut self) -> LightrailResult<()> {
        drop(self.stdout.take());
        let status = self
            .child
            .wait()
            .map_err(|e| LightrailError::source(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr = match self.stderr.take() {
            Some(drain) => drain
                .finish()
                .map_err(|e| LightrailError::source(format!("ffmpeg stderr read failed: {e}")))?,
            None => String::new(),
        };
        if status.success() {
            return Ok(());
        }
        Err(LightrailError::source(format!(
            "ffmpeg decoder exited with status {status}: {stderr}"
        )))
    }
}

impl FrameSource for FfmpegSource {
    fn info(&self) -> SourceInfo {
        self.info
    }

    fn read(&mut self) -> LightrailResult<Option<Frame>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut buf = vec![0u8; self.frame_len];
        let got = read_full(stdout, &mut buf)
            .map_err(|e| LightrailError::source(format!("failed to read from ffmpeg: {e}")))?;

        if got < self.frame_len {
            if got > 0 {
                tracing::warn!(
                    bytes = got,
                    expected = self.frame_len,
                    "dropping truncated trailing frame"
                );
            }
            tracing::debug!(frames = self.frames_read, "source exhausted");
            self.finish_stream()?;
            return Ok(None);
        }

        self.frames_read += 1;
        let shape = FrameShape::new(self.info.width, self.info.height, self.info.channels)?;
        Frame::new(shape, buf).map(Some)
    }

    fn close(&mut self) -> LightrailResult<()> {
        if self.stdout.take().is_some() {
            // Still streaming (quit before end of input, or a live device): stop the decoder.
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
        if let Some(drain) = self.stderr.take() {
            let _ = drain.finish();
        }
        Ok(())
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Read until `buf` is full or the stream ends. Returns the number of bytes read.
fn read_full(r: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[derive(Debug)]
struct StreamMeta {
    width: u32,
    height: u32,
    fps: Option<f64>,
}

fn read_stream_meta(format: Option<&str>, input: &OsString) -> LightrailResult<StreamMeta> {
    #[derive(serde::Deserialize)]
    struct FfprobeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct FfprobeOut {
        #[serde(default)]
        streams: Vec<FfprobeStream>,
    }

    let mut cmd = Command::new("ffprobe");
    cmd.args(["-v", "error", "-print_format", "json", "-show_streams"]);
    if let Some(format) = format {
        cmd.args(["-f", format]);
    }
    let out = cmd.arg(input).output().map_err(|e| {
        LightrailError::source_open(format!(
            "failed to run ffprobe (is it installed and on PATH?): {e}"
        ))
    })?;
    if !out.status.success() {
        return Err(LightrailError::source_open(format!(
            "ffprobe failed for '{}': {}",
            input.to_string_lossy(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: FfprobeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| LightrailError::source_open(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| LightrailError::source_open("no video stream found"))?;
    let width = video
        .width
        .ok_or_else(|| LightrailError::source_open("missing video width from ffprobe"))?;
    let height = video
        .height
        .ok_or_else(|| LightrailError::source_open("missing video height from ffprobe"))?;
    let fps = video
        .r_frame_rate
        .as_deref()
        .and_then(parse_ff_ratio)
        .map(|(num, den)| f64::from(num) / f64::from(den));

    Ok(StreamMeta { width, height, fps })
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let (a, b) = s.split_once('/')?;
    let a = a.parse::<u32>().ok()?;
    let b = b.parse::<u32>().ok()?;
    if a == 0 || b == 0 {
        return None;
    }
    Some((a, b))
}

#[cfg(test)]
#[path = "../../tests/unit/source/ffmpeg.rs"]
mod tests;
