//! Integration tests for configuration file loading

use mixtape_common::config::{resolve_data_folder, TomlConfig};
use mixtape_common::{Error, FadeCurve};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

#[test]
fn test_load_full_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        port = 7001
        data_folder = "/srv/mixtape"
        allowed_extensions = ["mp3", "wav"]

        [mixing]
        transition_ms = 2500
        lowpass_cutoff_hz = 3000.0
        fade_curve = "cosine"
        shuffle = false

        [video]
        ffmpeg_path = "/usr/local/bin/ffmpeg"
        fps = 2

        [downloads]
        allow_unscoped = true
        "#
    )
    .unwrap();

    let config = TomlConfig::load(file.path()).unwrap();
    assert_eq!(config.port, 7001);
    assert_eq!(config.data_folder, Some(PathBuf::from("/srv/mixtape")));
    assert_eq!(config.allowed_extensions, vec!["mp3", "wav"]);
    assert_eq!(config.mixing.transition_ms, 2500);
    assert_eq!(config.mixing.fade_curve, FadeCurve::SCurve);
    assert!(!config.mixing.shuffle);
    assert_eq!(config.video.ffmpeg_path, PathBuf::from("/usr/local/bin/ffmpeg"));
    assert_eq!(config.video.fps, 2);
    assert_eq!(config.video.preset, "ultrafast");
    assert!(config.downloads.allow_unscoped);
}

#[test]
fn test_explicit_missing_file_is_error() {
    let result = TomlConfig::load_or_default(Some(std::path::Path::new(
        "/nonexistent/mixtape/config.toml",
    )));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_toml_data_folder_used_without_cli() {
    let config = TomlConfig {
        data_folder: Some(PathBuf::from("/from/toml")),
        ..TomlConfig::default()
    };
    // Only meaningful when the environment override is absent
    if std::env::var(mixtape_common::config::DATA_FOLDER_ENV).is_err() {
        assert_eq!(resolve_data_folder(None, &config), PathBuf::from("/from/toml"));
    }
}
