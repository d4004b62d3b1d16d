//! Where composites are shown, and where a user's "quit" comes from.

use std::{
    io::BufRead,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
};

use anyhow::Context as _;

use crate::{
    foundation::core::Frame,
    foundation::error::{LightrailError, LightrailResult},
};

/// Shared "please stop" flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct QuitSignal(Arc<AtomicBool>);

impl QuitSignal {
    /// A fresh, unrequested signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder to stop.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested.
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Route Ctrl-C to this signal. Only one handler can be installed per process.
    pub fn install_ctrlc(&self) -> LightrailResult<()> {
        let flag = self.clone();
        ctrlc::set_handler(move || {
            tracing::info!("interrupt received, stopping");
            flag.request();
        })
        .context("install Ctrl-C handler")?;
        Ok(())
    }

    /// Watch `reader` line by line on a background thread; a line reading `q` requests a quit.
    ///
    /// The thread ends at the first `q`, at end of input, or on a read error.
    pub fn watch_for_quit_key<R>(&self, reader: R) -> LightrailResult<JoinHandle<()>>
    where
        R: BufRead + Send + 'static,
    {
        let flag = self.clone();
        let handle = std::thread::Builder::new()
            .name("lightrail-quit-key".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    let Ok(line) = line else { return };
                    if line.trim().eq_ignore_ascii_case("q") {
                        tracing::info!("quit key received, stopping");
                        flag.request();
                        return;
                    }
                }
            })
            .context("spawn quit key watcher")?;
        Ok(handle)
    }
}

/// Presentation surface for composites.
///
/// Quitting goes through a [`QuitSignal`]: the binary wires it to Ctrl-C and to a `q` line on
/// stdin ([`QuitSignal::watch_for_quit_key`]), so headless runs stop the same way a window would.
pub trait Display {
    /// Present one composite.
    fn show(&mut self, frame: &Frame) -> LightrailResult<()>;

    /// Non-blocking check for a user-issued quit.
    fn poll_quit(&mut self) -> bool;
}

/// Shows nothing; quits when its [`QuitSignal`] fires.
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    quit: QuitSignal,
    shown: u64,
}

impl HeadlessDisplay {
    /// Headless display following `quit`.
    pub fn new(quit: QuitSignal) -> Self {
        Self { quit, shown: 0 }
    }

    /// Frames passed to `show` so far.
    pub fn frames_shown(&self) -> u64 {
        self.shown
    }
}

impl Display for HeadlessDisplay {
    fn show(&mut self, _frame: &Frame) -> LightrailResult<()> {
        self.shown += 1;
        Ok(())
    }

    fn poll_quit(&mut self) -> bool {
        self.quit.is_requested()
    }
}

/// Writes the latest composite to a PNG every `every` frames, for watching a headless run.
#[derive(Debug)]
pub struct SnapshotDisplay {
    path: PathBuf,
    every: u64,
    shown: u64,
    quit: QuitSignal,
}

impl SnapshotDisplay {
    /// Snapshot `path` on the first frame and every `every` frames after it.
    pub fn new(path: impl Into<PathBuf>, every: u64, quit: QuitSignal) -> Self {
        Self {
            path: path.into(),
            every: every.max(1),
            shown: 0,
            quit,
        }
    }

    /// Where snapshots go.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Display for SnapshotDisplay {
    fn show(&mut self, frame: &Frame) -> LightrailResult<()> {
        self.shown += 1;
        if (self.shown - 1) % self.every != 0 {
            return Ok(());
        }
        write_png(&self.path, frame)
    }

    fn poll_quit(&mut self) -> bool {
        self.quit.is_requested()
    }
}

/// Write `frame` as a PNG, replacing `path` only once the new file is complete.
pub fn write_png(path: &Path, frame: &Frame) -> LightrailResult<()> {
    let color = match frame.channels() {
        1 => image::ColorType::L8,
        3 => image::ColorType::Rgb8,
        4 => image::ColorType::Rgba8,
        c => {
            return Err(LightrailError::validation(format!(
                "cannot write {c}-channel frame as png"
            )));
        }
    };

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    image::save_buffer_with_format(
        &tmp,
        frame.data(),
        frame.width(),
        frame.height(),
        color,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("move png into place at '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/display.rs"]
mod tests;
