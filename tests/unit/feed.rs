use std::time::{Duration, Instant};

use super::*;
use crate::foundation::core::FrameShape;
use crate::source::MemorySource;

fn shape() -> FrameShape {
    FrameShape::new(2, 2, 1).unwrap()
}

fn numbered(n: u8) -> Vec<Frame> {
    (1..=n).map(|v| Frame::filled(shape(), v)).collect()
}

fn memory(n: u8, delay: Option<Duration>) -> Box<dyn FrameSource> {
    let mut src = MemorySource::new(shape(), numbered(n)).unwrap();
    if let Some(d) = delay {
        src = src.with_read_delay(d);
    }
    Box::new(src)
}

/// Poll until exhausted, returning `(seq, first sample, fresh)` for every frame seen.
fn drain(feed: &mut AsyncFrameFeed, pause: Duration) -> Vec<(u64, u8, bool)> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut seen = Vec::new();
    loop {
        assert!(Instant::now() < deadline, "feed never reported exhaustion");
        match feed.poll().unwrap() {
            FeedPoll::Frame { seq, frame, fresh } => seen.push((seq, frame.data()[0], fresh)),
            FeedPoll::Exhausted => return seen,
        }
        std::thread::sleep(pause);
    }
}

struct Endless {
    reads: u64,
}

impl FrameSource for Endless {
    fn info(&self) -> SourceInfo {
        SourceInfo {
            width: 2,
            height: 2,
            channels: 1,
            fps: None,
        }
    }

    fn read(&mut self) -> LightrailResult<Option<Frame>> {
        self.reads += 1;
        std::thread::sleep(Duration::from_millis(1));
        Ok(Some(Frame::filled(shape(), (self.reads % 256) as u8)))
    }
}

struct FailOnThird {
    reads: u32,
}

impl FrameSource for FailOnThird {
    fn info(&self) -> SourceInfo {
        SourceInfo {
            width: 2,
            height: 2,
            channels: 1,
            fps: None,
        }
    }

    fn read(&mut self) -> LightrailResult<Option<Frame>> {
        self.reads += 1;
        if self.reads == 3 {
            return Err(LightrailError::source("device unplugged"));
        }
        Ok(Some(Frame::filled(shape(), 0)))
    }
}

#[test]
fn slot_overwrites_and_numbers_publishes() {
    let slot = FrameSlot::new();
    assert!(slot.latest().is_none());
    assert_eq!(slot.publish(Frame::filled(shape(), 1)), 1);
    assert_eq!(slot.publish(Frame::filled(shape(), 2)), 2);
    let (seq, f) = slot.latest().unwrap();
    assert_eq!((seq, f.data()[0]), (2, 2));
    // Reading does not consume.
    assert_eq!(slot.latest().unwrap().0, 2);
    assert_eq!(slot.seq(), 2);
}

#[test]
fn observed_sequence_never_goes_backwards() {
    let mut feed = AsyncFrameFeed::start(memory(5, Some(Duration::from_millis(3)))).unwrap();
    let seen = drain(&mut feed, Duration::from_micros(500));
    assert!(!seen.is_empty());
    for pair in seen.windows(2) {
        assert!(pair[0].0 <= pair[1].0, "{seen:?}");
        assert!(pair[0].1 <= pair[1].1, "{seen:?}");
    }
    assert_eq!(seen.last().unwrap().1, 5, "final frame must be handed out");
    assert_eq!(feed.frames_published(), 5);
}

#[test]
fn fast_consumer_sees_duplicates() {
    let mut feed = AsyncFrameFeed::start(memory(5, Some(Duration::from_millis(20)))).unwrap();
    let seen = drain(&mut feed, Duration::from_millis(1));
    assert!(seen.iter().any(|&(_, _, fresh)| !fresh));
    let fresh = seen.iter().filter(|&&(_, _, fresh)| fresh).count();
    assert!(fresh <= 5);
}

#[test]
fn slow_consumer_skips_to_newest() {
    let mut feed = AsyncFrameFeed::start(memory(50, None)).unwrap();
    std::thread::sleep(Duration::from_millis(50));
    let seen = drain(&mut feed, Duration::from_millis(1));
    assert!(seen.len() < 50);
    assert_eq!(seen.last().unwrap().1, 50);
}

#[test]
fn empty_source_is_exhausted_immediately() {
    let mut feed = AsyncFrameFeed::start(memory(0, None)).unwrap();
    assert!(matches!(feed.poll().unwrap(), FeedPoll::Exhausted));
    assert!(feed.join().unwrap().is_none());
}

#[test]
fn read_error_reaches_the_consumer() {
    let mut feed = AsyncFrameFeed::start(Box::new(FailOnThird { reads: 0 })).unwrap();
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        assert!(Instant::now() < deadline, "error never surfaced");
        match feed.poll() {
            Err(e) => {
                assert!(e.to_string().contains("device unplugged"));
                break;
            }
            Ok(FeedPoll::Exhausted) => panic!("error reported as exhaustion"),
            Ok(FeedPoll::Frame { .. }) => std::thread::sleep(Duration::from_millis(1)),
        }
    }
}

#[test]
fn stop_ends_an_endless_capture_promptly() {
    let mut feed = AsyncFrameFeed::start(Box::new(Endless { reads: 0 })).unwrap();
    std::thread::sleep(Duration::from_millis(10));
    assert!(matches!(feed.poll().unwrap(), FeedPoll::Frame { .. }));

    let t0 = Instant::now();
    let source = feed.join().unwrap();
    assert!(source.is_some());
    assert!(t0.elapsed() < Duration::from_secs(1));
}
