use super::*;

#[test]
fn digits_parse_as_device_index() {
    assert_eq!(SourceId::parse("0"), SourceId::Device(0));
    assert_eq!(SourceId::parse("12"), SourceId::Device(12));
}

#[test]
fn everything_else_is_a_path() {
    assert_eq!(
        SourceId::parse("clip.mp4"),
        SourceId::Path(PathBuf::from("clip.mp4"))
    );
    assert_eq!(SourceId::parse("-1"), SourceId::Path(PathBuf::from("-1")));
    assert_eq!(SourceId::parse(""), SourceId::Path(PathBuf::new()));
    assert_eq!(
        SourceId::parse("99999999999"),
        SourceId::Path(PathBuf::from("99999999999"))
    );
}

#[test]
fn display_names_devices_and_paths() {
    assert_eq!(SourceId::Device(2).to_string(), "device #2");
    assert_eq!(SourceId::parse("a/b.avi").to_string(), "a/b.avi");
}
