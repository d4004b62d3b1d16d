use super::*;

#[test]
fn quantize_truncates_toward_zero() {
    assert_eq!(quantize_u8(0.0), 0);
    assert_eq!(quantize_u8(0.999), 0);
    assert_eq!(quantize_u8(127.5), 127);
    assert_eq!(quantize_u8(254.999_999), 254);
    assert_eq!(quantize_u8(255.0), 255);
}

#[test]
fn quantize_clamps_out_of_range_and_nan() {
    assert_eq!(quantize_u8(-3.7), 0);
    assert_eq!(quantize_u8(300.2), 255);
    assert_eq!(quantize_u8(f64::NAN), 0);
    assert_eq!(quantize_u8(f64::INFINITY), 255);
}

#[test]
fn shape_rejects_empty_and_odd_channel_counts() {
    assert!(FrameShape::new(0, 4, 3).is_err());
    assert!(FrameShape::new(4, 0, 3).is_err());
    assert!(FrameShape::new(4, 4, 2).is_err());
    assert!(FrameShape::new(4, 4, 1).is_ok());
    assert!(FrameShape::new(4, 4, 4).is_ok());
}

#[test]
fn frame_new_checks_buffer_length() {
    let shape = FrameShape::new(2, 2, 3).unwrap();
    assert!(Frame::new(shape, vec![0; 11]).is_err());
    let f = Frame::new(shape, vec![0; 12]).unwrap();
    assert_eq!(f.data().len(), 12);
}

#[test]
fn compatibility_requires_identical_shape() {
    let a = Frame::filled(FrameShape::new(4, 2, 3).unwrap(), 0);
    let b = Frame::filled(FrameShape::new(4, 2, 3).unwrap(), 9);
    let c = Frame::filled(FrameShape::new(2, 4, 3).unwrap(), 0);
    let d = Frame::filled(FrameShape::new(4, 2, 4).unwrap(), 0);
    assert!(a.is_compatible(&b));
    assert!(!a.is_compatible(&c));
    assert!(!a.is_compatible(&d));
}

#[test]
fn sample_addresses_interleaved_rows() {
    let data = (0u8..12).collect::<Vec<_>>();
    let f = Frame::from_raw(2, 2, 3, data).unwrap();
    assert_eq!(f.sample(0, 0, 0), 0);
    assert_eq!(f.sample(1, 0, 2), 5);
    assert_eq!(f.sample(0, 1, 1), 7);
    assert_eq!(f.sample(1, 1, 2), 11);
}

#[test]
fn frame_index_next_saturates() {
    assert_eq!(FrameIndex(4).next(), FrameIndex(5));
    assert_eq!(FrameIndex(u64::MAX).next(), FrameIndex(u64::MAX));
}
