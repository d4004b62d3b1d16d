use super::*;

#[test]
fn ratio_parsing_accepts_rationals_only() {
    assert_eq!(parse_ff_ratio("30000/1001"), Some((30000, 1001)));
    assert_eq!(parse_ff_ratio("25/1"), Some((25, 1)));
    assert_eq!(parse_ff_ratio("0/0"), None);
    assert_eq!(parse_ff_ratio("30"), None);
    assert_eq!(parse_ff_ratio("a/b"), None);
}

#[test]
fn read_full_stops_at_end_of_stream() {
    let mut r = std::io::Cursor::new(vec![1u8, 2, 3, 4, 5]);
    let mut buf = [0u8; 3];
    assert_eq!(read_full(&mut r, &mut buf).unwrap(), 3);
    assert_eq!(buf, [1, 2, 3]);
    assert_eq!(read_full(&mut r, &mut buf).unwrap(), 2);
    assert_eq!(read_full(&mut r, &mut buf).unwrap(), 0);
}

#[test]
fn missing_input_file_is_a_source_open_error() {
    let id = SourceId::Path("definitely/not/here.mp4".into());
    let err = FfmpegSource::open(&id).unwrap_err();
    assert!(matches!(err, LightrailError::SourceOpen(_)), "{err}");
}
