//! Background frame acquisition.
//!
//! A capture thread reads from a [`FrameSource`] as fast as the source allows and publishes
//! each frame into a single-slot mailbox, replacing whatever was there. The compositing loop
//! takes the newest frame on every tick without waiting for capture. Frames can be skipped
//! (producer faster than consumer) or seen twice (consumer faster than producer).

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
};

use crate::{
    foundation::core::Frame,
    foundation::error::{LightrailError, LightrailResult},
    source::{FrameSource, SourceInfo},
};

/// Single-slot, overwrite-on-publish mailbox.
///
/// Every publish gets the next sequence number (starting at 1). Readers always get a whole
/// frame together with its number, so a reader can never observe a number lower than one it
/// has already seen.
#[derive(Debug, Default)]
pub struct FrameSlot {
    inner: Mutex<SlotState>,
}

#[derive(Debug, Default)]
struct SlotState {
    seq: u64,
    frame: Option<Arc<Frame>>,
}

impl FrameSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot contents. Returns the new sequence number.
    pub fn publish(&self, frame: Frame) -> u64 {
        let frame = Arc::new(frame);
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.seq += 1;
        state.frame = Some(frame);
        state.seq
    }

    /// Newest frame and its sequence number, without removing it.
    pub fn latest(&self) -> Option<(u64, Arc<Frame>)> {
        let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.frame.as_ref().map(|f| (state.seq, Arc::clone(f)))
    }

    /// Sequence number of the last publish (0 if nothing was published).
    pub fn seq(&self) -> u64 {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).seq
    }
}

struct Shared {
    slot: FrameSlot,
    stop: AtomicBool,
    finished: AtomicBool,
    error: Mutex<Option<LightrailError>>,
}

/// Result of one non-blocking look at the feed.
#[derive(Debug, Clone)]
pub enum FeedPoll {
    /// The newest published frame.
    Frame {
        /// Publish number of this frame.
        seq: u64,
        /// The frame itself, shared with the slot.
        frame: Arc<Frame>,
        /// False when this is the same frame the previous poll returned.
        fresh: bool,
    },
    /// The source ran dry and its last frame has been handed out.
    Exhausted,
}

/// Capture thread plus the slot it feeds.
pub struct AsyncFrameFeed {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<Box<dyn FrameSource>>>,
    info: SourceInfo,
    last_seen: u64,
}

impl std::fmt::Debug for AsyncFrameFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFrameFeed")
            .field("info", &self.info)
            .field("last_seen", &self.last_seen)
            .field("published", &self.shared.slot.seq())
            .finish_non_exhaustive()
    }
}

impl AsyncFrameFeed {
    /// Read the first frame on the calling thread, then hand the source to a capture thread.
    ///
    /// The slot is therefore never empty while the feed runs. An empty source yields a feed
    /// that reports [`FeedPoll::Exhausted`] straight away.
    pub fn start(mut source: Box<dyn FrameSource>) -> LightrailResult<Self> {
        let info = source.info();
        let shared = Arc::new(Shared {
            slot: FrameSlot::new(),
            stop: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            error: Mutex::new(None),
        });

        let Some(first) = source.read()? else {
            shared.finished.store(true, Ordering::Release);
            source.close()?;
            return Ok(Self {
                shared,
                handle: None,
                info,
                last_seen: 0,
            });
        };
        shared.slot.publish(first);

        let worker = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("lightrail-capture".to_string())
            .spawn(move || produce(source, &worker))
            .map_err(|e| LightrailError::source(format!("failed to spawn capture thread: {e}")))?;

        Ok(Self {
            shared,
            handle: Some(handle),
            info,
            last_seen: 0,
        })
    }

    /// Properties of the captured source.
    pub fn info(&self) -> SourceInfo {
        self.info
    }

    /// Frames published so far.
    pub fn frames_published(&self) -> u64 {
        self.shared.slot.seq()
    }

    /// Newest frame, exhaustion, or the capture thread's read error. Never blocks on capture.
    pub fn poll(&mut self) -> LightrailResult<FeedPoll> {
        // `finished` first: once it is set, the slot holds the final frame and any read error
        // has already been stored.
        let finished = self.shared.finished.load(Ordering::Acquire);
        if let Some(err) = self
            .shared
            .error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            return Err(err);
        }

        match self.shared.slot.latest() {
            Some((seq, _)) if finished && seq == self.last_seen => Ok(FeedPoll::Exhausted),
            Some((seq, frame)) => {
                let fresh = seq != self.last_seen;
                self.last_seen = seq;
                Ok(FeedPoll::Frame { seq, frame, fresh })
            }
            None => Ok(FeedPoll::Exhausted),
        }
    }

    /// Ask the capture thread to stop after its current read.
    pub fn stop(&self) {
        self.shared.stop.store(true, Ordering::Release);
    }

    /// Stop the capture thread, wait for it, and get the source back for closing.
    pub fn join(mut self) -> LightrailResult<Option<Box<dyn FrameSource>>> {
        self.stop();
        let Some(handle) = self.handle.take() else {
            return Ok(None);
        };
        handle
            .join()
            .map(Some)
            .map_err(|_| LightrailError::source("capture thread panicked"))
    }
}

impl Drop for AsyncFrameFeed {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.handle.take()
            && let Ok(mut source) = handle.join()
        {
            let _ = source.close();
        }
    }
}

fn produce(mut source: Box<dyn FrameSource>, shared: &Shared) -> Box<dyn FrameSource> {
    while !shared.stop.load(Ordering::Acquire) {
        match source.read() {
            Ok(Some(frame)) => {
                shared.slot.publish(frame);
            }
            Ok(None) => {
                tracing::debug!(published = shared.slot.seq(), "capture source exhausted");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "capture read failed");
                *shared.error.lock().unwrap_or_else(PoisonError::into_inner) = Some(e);
                break;
            }
        }
    }
    shared.finished.store(true, Ordering::Release);
    source
}

#[cfg(test)]
#[path = "../tests/unit/feed.rs"]
mod tests;
