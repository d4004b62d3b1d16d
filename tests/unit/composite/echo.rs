use super::*;
use crate::foundation::core::FrameShape;

fn shape() -> FrameShape {
    FrameShape::new(3, 2, 3).unwrap()
}

fn frame(seed: u8) -> Frame {
    let data = (0..shape().sample_len())
        .map(|i| (i as u8).wrapping_mul(37).wrapping_add(seed.wrapping_mul(91)))
        .collect();
    Frame::new(shape(), data).unwrap()
}

fn pixelwise_max(frames: &[Frame]) -> Vec<u8> {
    (0..shape().sample_len())
        .map(|i| frames.iter().map(|f| f.data()[i]).max().unwrap())
        .collect()
}

#[test]
fn rejects_zero_capacity_and_bad_weights() {
    assert!(EchoCompositor::new(0, BlendWeights::MAX_ONLY).is_err());
    let bad = BlendWeights {
        max: 0.5,
        mean: 0.2,
    };
    assert!(EchoCompositor::new(4, bad).is_err());
}

#[test]
fn max_only_output_is_exact_window_max() {
    let mut c = EchoCompositor::new(4, BlendWeights::MAX_ONLY).unwrap();
    let frames = (0..9).map(frame).collect::<Vec<_>>();
    for (i, f) in frames.iter().enumerate() {
        let out = c.push(f.clone()).unwrap();
        let lo = (i + 1).saturating_sub(4);
        assert_eq!(out.data(), pixelwise_max(&frames[lo..=i]).as_slice(), "push {i}");
    }
}

#[test]
fn window_never_exceeds_capacity_and_keeps_arrival_order() {
    let mut c = EchoCompositor::new(3, BlendWeights::BALANCED).unwrap();
    for i in 0..7u8 {
        c.push(frame(i)).unwrap();
        assert!(c.len() <= 3);
    }
    let kept = c.window().cloned().collect::<Vec<_>>();
    assert_eq!(kept, vec![frame(4), frame(5), frame(6)]);
}

#[test]
fn warm_up_uses_partial_window_without_padding() {
    let s = FrameShape::new(1, 1, 1).unwrap();
    let mut c = EchoCompositor::new(8, BlendWeights::new(0.0, 1.0).unwrap()).unwrap();
    c.push(Frame::filled(s, 100)).unwrap();
    let out = c.push(Frame::filled(s, 50)).unwrap();
    // Mean over two frames, not over eight.
    assert_eq!(out.data(), &[75]);
    assert_eq!(c.len(), 2);
}

#[test]
fn single_slot_window_returns_latest_frame_for_any_weights() {
    for w in [
        BlendWeights::MAX_ONLY,
        BlendWeights::BALANCED,
        BlendWeights::BRIGHT,
        BlendWeights::new(0.0, 1.0).unwrap(),
        BlendWeights::from_max(0.37).unwrap(),
    ] {
        let mut c = EchoCompositor::new(1, w).unwrap();
        for i in 0..5u8 {
            let f = frame(i);
            assert_eq!(c.push(f.clone()).unwrap(), f, "{w:?} push {i}");
        }
    }
}

#[test]
fn balanced_blend_truncates_mixed_statistics() {
    let s = FrameShape::new(1, 1, 1).unwrap();
    let mut c = EchoCompositor::new(2, BlendWeights::BALANCED).unwrap();
    c.push(Frame::filled(s, 0)).unwrap();
    let out = c.push(Frame::filled(s, 255)).unwrap();
    // max 255, mean 127.5: 255 * 0.6 + 127.5 * 0.4 = 204.0
    assert_eq!(out.data(), &[204]);

    let mut c = EchoCompositor::new(3, BlendWeights::BALANCED).unwrap();
    c.push(Frame::filled(s, 10)).unwrap();
    c.push(Frame::filled(s, 0)).unwrap();
    let out = c.push(Frame::filled(s, 0)).unwrap();
    // max 10, mean 3.33..: 10 * 0.6 + 3.33.. * 0.4 = 7.33.., truncated to 7
    assert_eq!(out.data(), &[7]);
}

#[test]
fn mismatched_frame_is_rejected_and_window_untouched() {
    let mut c = EchoCompositor::new(4, BlendWeights::MAX_ONLY).unwrap();
    c.push(frame(1)).unwrap();
    let other = Frame::filled(FrameShape::new(2, 2, 3).unwrap(), 0);
    assert!(c.push(other).is_err());
    assert_eq!(c.len(), 1);
}

#[test]
fn blend_sample_limits() {
    let mean_only = BlendWeights::new(0.0, 1.0).unwrap();
    assert_eq!(blend_sample(200, 100.0, BlendWeights::MAX_ONLY), 200);
    assert_eq!(blend_sample(200, 100.0, mean_only), 100);
    assert_eq!(blend_sample(200, 200.0, BlendWeights::BALANCED), 200);
    assert_eq!(blend_sample(255, 255.0, BlendWeights::BRIGHT), 255);
}

#[test]
fn uniform_window_is_reproduced_for_every_level_and_preset() {
    for w in [BlendWeights::BALANCED, BlendWeights::BRIGHT] {
        for v in 0..=255u8 {
            assert_eq!(blend_sample(v, f64::from(v), w), v, "{w:?} level {v}");
        }
    }
}

#[test]
fn weighted_sum_truncates_at_float_boundary() {
    // 3 * 0.6 + 0.5 * 0.4 lands just below 2.0 in f64.
    let s = FrameShape::new(1, 1, 1).unwrap();
    let mut c = EchoCompositor::new(6, BlendWeights::BALANCED).unwrap();
    c.push(Frame::filled(s, 3)).unwrap();
    let mut out = None;
    for _ in 0..5 {
        out = Some(c.push(Frame::filled(s, 0)).unwrap());
    }
    assert_eq!(out.unwrap().data(), &[1]);
}
