use super::*;

fn shape() -> FrameShape {
    FrameShape::new(2, 2, 3).unwrap()
}

#[test]
fn yields_frames_in_order_then_exhausts() {
    let frames = (0..3u8).map(|v| Frame::filled(shape(), v)).collect();
    let mut src = MemorySource::new(shape(), frames).unwrap();
    for v in 0..3u8 {
        assert_eq!(src.read().unwrap().unwrap().data()[0], v);
    }
    assert!(src.read().unwrap().is_none());
    assert!(src.read().unwrap().is_none());
}

#[test]
fn rejects_frames_of_another_shape() {
    let odd = Frame::filled(FrameShape::new(3, 2, 3).unwrap(), 0);
    assert!(MemorySource::new(shape(), vec![odd]).is_err());
}

#[test]
fn close_ends_the_stream() {
    let mut src = MemorySource::new(shape(), vec![Frame::filled(shape(), 1)]).unwrap();
    src.close().unwrap();
    assert!(src.is_closed());
    assert!(src.read().unwrap().is_none());
}

#[test]
fn opener_counts_opens_and_reports_info() {
    let opener = MemorySourceOpener::new(shape(), vec![Frame::filled(shape(), 5)]);
    assert_eq!(opener.open_count(), 0);
    let src = opener.open(&SourceId::Device(0)).unwrap();
    assert_eq!(opener.open_count(), 1);
    let info = src.info();
    assert_eq!((info.width, info.height, info.channels), (2, 2, 3));
}
