use super::*;

fn with(f: impl FnOnce(&mut TrailConfig)) -> TrailConfig {
    let mut cfg = TrailConfig::default();
    f(&mut cfg);
    cfg
}

#[test]
fn defaults_are_valid() {
    TrailConfig::default().validate().unwrap();
}

#[test]
fn validation_rejects_out_of_range_values() {
    let bad = [
        with(|c| c.downscale = 0),
        with(|c| c.downscale = -2),
        with(|c| c.speed = -1),
        with(|c| c.decay = 0.0),
        with(|c| c.decay = 1.5),
        with(|c| c.decay = f64::NAN),
        with(|c| c.num_echoes = 0),
        with(|c| c.base_fps = 0),
        with(|c| {
            c.weights = BlendWeights {
                max: 0.7,
                mean: 0.7,
            }
        }),
    ];
    for cfg in bad {
        let err = cfg.validate().unwrap_err();
        assert!(err.is_config(), "{cfg:?} -> {err}");
    }
}

#[test]
fn validation_accepts_boundary_values() {
    with(|c| c.downscale = 1).validate().unwrap();
    with(|c| c.speed = 0).validate().unwrap();
    with(|c| c.decay = 1.0).validate().unwrap();
    with(|c| c.num_echoes = 1).validate().unwrap();
}

#[test]
fn weight_presets_sum_to_one() {
    for w in [
        BlendWeights::MAX_ONLY,
        BlendWeights::BALANCED,
        BlendWeights::BRIGHT,
    ] {
        w.validate().unwrap();
        assert_eq!(w.max + w.mean, 1.0);
    }
}

#[test]
fn from_max_fills_in_the_mean_share() {
    let w = BlendWeights::from_max(0.25).unwrap();
    assert_eq!(w.mean, 0.75);
    assert!(BlendWeights::from_max(1.5).is_err());
    assert!(BlendWeights::new(-0.1, 1.1).is_err());
}

#[test]
fn sink_fps_scales_with_speed_and_never_hits_zero() {
    assert_eq!(with(|c| c.speed = 1).sink_fps(), 30);
    assert_eq!(with(|c| c.speed = 3).sink_fps(), 90);
    assert_eq!(with(|c| c.speed = 0).sink_fps(), 1);
}

#[test]
fn json_overrides_only_named_fields() {
    let cfg = TrailConfig::from_json_str(r#"{ "mode": "residual", "decay": 0.9 }"#).unwrap();
    assert_eq!(cfg.mode, TrailMode::Residual);
    assert_eq!(cfg.decay, 0.9);
    assert_eq!(cfg.downscale, 4);
    assert_eq!(cfg.weights, BlendWeights::BALANCED);
}

#[test]
fn json_rejects_unknown_fields() {
    let err = TrailConfig::from_json_str(r#"{ "num_echos": 3 }"#).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn json_file_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trail.json");
    std::fs::write(&path, r#"{ "num_echoes": 8, "weights": { "max": 1.0, "mean": 0.0 } }"#)
        .unwrap();
    let cfg = TrailConfig::from_json_path(&path).unwrap();
    assert_eq!(cfg.num_echoes, 8);
    assert_eq!(cfg.weights, BlendWeights::MAX_ONLY);

    assert!(TrailConfig::from_json_path(&dir.path().join("missing.json")).is_err());
}
