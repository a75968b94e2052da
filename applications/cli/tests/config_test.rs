/// Configuration loading from files and environment
use orcplay_cli::{AppConfig, CliError};
use orcplay_playback::VolumeCurve;
use std::collections::HashMap;
use tempfile::TempDir;

fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
    )
}

#[test]
fn file_values_are_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orcplay.toml");
    std::fs::write(
        &path,
        r#"
[player]
volume = 40
volume_curve = "decibel"
auto_advance = true

[player.channels]
level = "rms"

[simulation]
level = 0.9
limit_secs = 5.0
"#,
    )
    .unwrap();

    let config = AppConfig::load_with_env(Some(&path), env(&[])).unwrap();
    assert_eq!(config.player.volume, 40);
    assert_eq!(config.player.volume_curve, VolumeCurve::Decibel);
    assert!(config.player.auto_advance);
    assert_eq!(config.player.channels.level, "rms");
    // Unset channels keep their defaults
    assert_eq!(config.player.channels.volume, "vol");
    assert_eq!(config.simulation.level, 0.9);
    assert_eq!(config.simulation.limit_secs, Some(5.0));
}

#[test]
fn environment_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orcplay.toml");
    std::fs::write(&path, "[player]\nvolume = 40\n").unwrap();

    let config = AppConfig::load_with_env(
        Some(&path),
        env(&[
            ("ORCPLAY_PLAYER__VOLUME", "65"),
            ("ORCPLAY_PLAYER__FRAME_RATE_HZ", "30"),
            ("ORCPLAY_SIMULATION__LEVEL", "0.25"),
        ]),
    )
    .unwrap();

    assert_eq!(config.player.volume, 65);
    assert_eq!(config.player.frame_rate_hz, 30);
    assert_eq!(config.simulation.level, 0.25);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let err = AppConfig::load_with_env(Some(&path), env(&[])).unwrap_err();
    assert!(matches!(err, CliError::Config(_)));
}

#[test]
fn invalid_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orcplay.toml");
    std::fs::write(&path, "[player]\nwaveform_columns = 0\n").unwrap();
    assert!(AppConfig::load_with_env(Some(&path), env(&[])).is_err());

    let err = AppConfig::load_with_env(Some(&path), env(&[("ORCPLAY_SIMULATION__LEVEL", "2.0")]));
    assert!(err.is_err());
}
