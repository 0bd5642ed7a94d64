use desktop_melt::melt::settings::MeltSettings;
use desktop_melt::melt::settings_store::{load_from_path, save_to_path, MELT_SETTINGS_FILE_NAME};
use tempfile::tempdir;

#[test]
fn settings_round_trip_through_disk() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("nested").join(MELT_SETTINGS_FILE_NAME);
    let settings = MeltSettings {
        tick_interval_ms: 50,
        tremor_seconds: 5.0,
        spawn_probability: 0.25,
        max_sprites: Some(64),
        clamp_on_bounce: true,
        seed: Some(99),
        icon_paths: vec!["skull.png".into()],
        ..MeltSettings::default()
    };

    save_to_path(&path, &settings).expect("save");
    let loaded = load_from_path(&path).expect("load");

    assert_eq!(loaded, settings);
}

#[test]
fn missing_or_blank_file_yields_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(MELT_SETTINGS_FILE_NAME);
    assert_eq!(load_from_path(&path).expect("missing"), MeltSettings::default());

    std::fs::write(&path, "  \n").expect("write");
    assert_eq!(load_from_path(&path).expect("blank"), MeltSettings::default());
}

#[test]
fn loaded_values_are_sanitized() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(MELT_SETTINGS_FILE_NAME);
    std::fs::write(
        &path,
        r#"{ "tick_interval_ms": 0, "spawn_probability": 3.0, "tremor_seconds": -1 }"#,
    )
    .expect("write");

    let loaded = load_from_path(&path).expect("load");

    assert_eq!(loaded.tick_interval_ms, 1);
    assert_eq!(loaded.spawn_probability, 1.0);
    assert_eq!(loaded.tremor_seconds, 0.0);
}

#[test]
fn invalid_json_error_names_the_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(MELT_SETTINGS_FILE_NAME);
    std::fs::write(&path, "{ not json").expect("write");

    let err = load_from_path(&path).expect_err("invalid json");

    assert!(format!("{err:#}").contains(MELT_SETTINGS_FILE_NAME));
}
