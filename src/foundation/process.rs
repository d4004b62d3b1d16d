use std::{
    io::Read as _,
    process::Child,
    thread::JoinHandle,
};

/// Reads a child's piped stderr on a background thread.
///
/// A child writing to a full, unread pipe blocks, which in turn stalls whoever is feeding or
/// draining its stdin/stdout. Start the drain right after spawning.
#[derive(Debug)]
pub(crate) struct StderrDrain {
    handle: JoinHandle<std::io::Result<Vec<u8>>>,
}

impl StderrDrain {
    /// Take `child.stderr` and start reading it. `None` if stderr was not piped.
    pub(crate) fn start(child: &mut Child) -> Option<Self> {
        let mut stderr = child.stderr.take()?;
        let handle = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });
        Some(Self { handle })
    }

    /// Wait for the child to close stderr and return what it wrote, trimmed.
    pub(crate) fn finish(self) -> std::io::Result<String> {
        let bytes = self
            .handle
            .join()
            .map_err(|_| std::io::Error::other("stderr drain thread panicked"))??;
        Ok(String::from_utf8_lossy(&bytes).trim().to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/process.rs"]
mod tests;
