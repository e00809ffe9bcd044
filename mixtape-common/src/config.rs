//! Configuration loading and data folder resolution
//!
//! Configuration is fixed at process start. Sources, highest priority first:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default

use crate::{Error, FadeCurve, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "MIXTAPE_CONFIG";

/// Environment variable naming the data folder
pub const DATA_FOLDER_ENV: &str = "MIXTAPE_DATA_FOLDER";

/// Audio file suffixes accepted when scanning an upload folder
pub const DEFAULT_AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "m4a", "aac", "ogg"];

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// HTTP server port
    pub port: u16,

    /// Base folder for produced artifacts and uploads
    pub data_folder: Option<PathBuf>,

    /// Output directory override (defaults to `<data_folder>/output`)
    pub output_dir: Option<PathBuf>,

    /// Upload directory override (defaults to `<data_folder>/uploaded`)
    pub upload_dir: Option<PathBuf>,

    /// Allow-listed audio extensions, without the leading dot
    pub allowed_extensions: Vec<String>,

    pub mixing: MixingConfig,
    pub video: VideoConfig,
    pub description: DescriptionConfig,
    pub downloads: DownloadConfig,
    pub logging: LoggingConfig,
}

/// Crossfade mixing defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MixingConfig {
    /// Transition length between adjacent tracks
    pub transition_ms: u64,
    /// Low-pass cutoff applied to both sides of each transition
    pub lowpass_cutoff_hz: f32,
    pub fade_curve: FadeCurve,
    /// Shuffle the scanned folder before mixing
    pub shuffle: bool,
    /// Default output file name
    pub output_name: String,
}

/// External video encoder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub ffmpeg_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub preset: String,
    pub audio_bitrate: String,
    pub output_name: String,
}

/// Boilerplate appended to generated descriptions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptionConfig {
    pub footer: String,
    pub hashtags: Vec<String>,
}

/// Download endpoint policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Serve any readable path instead of only the output and upload folders
    pub allow_unscoped: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when RUST_LOG is unset
    pub level: String,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: 5750,
            data_folder: None,
            output_dir: None,
            upload_dir: None,
            allowed_extensions: DEFAULT_AUDIO_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            mixing: MixingConfig::default(),
            video: VideoConfig::default(),
            description: DescriptionConfig::default(),
            downloads: DownloadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for MixingConfig {
    fn default() -> Self {
        Self {
            transition_ms: 6000,
            lowpass_cutoff_hz: 4000.0,
            fade_curve: FadeCurve::Linear,
            shuffle: true,
            output_name: "mixtape.mp3".to_string(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            width: 1280,
            height: 720,
            fps: 1,
            preset: "ultrafast".to_string(),
            audio_bitrate: "192k".to_string(),
            output_name: "mixtape_vid.mp4".to_string(),
        }
    }
}

impl Default for DescriptionConfig {
    fn default() -> Self {
        Self {
            footer: concat!(
                "💽 Download/Listen links:\n",
                "You can find these tracks online.\n\n",
                "🎧 Follow for more mixes!"
            )
            .to_string(),
            hashtags: vec![
                "#Mixtape".to_string(),
                "#DJMix".to_string(),
                "#HouseMusic".to_string(),
                "#MusicMix".to_string(),
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from an explicit path, or the platform config file, or defaults.
    ///
    /// An explicit path that cannot be read is an error; a missing platform
    /// file is not.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::load(Path::new(&path));
        }
        match default_config_file() {
            Some(path) => Self::load(&path),
            None => {
                debug!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Allow-list normalized to lowercase without leading dots
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.allowed_extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }
}

/// Data folder resolution:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATA_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.data_folder {
        return path.clone();
    }

    default_data_folder()
}

/// Platform config file, if one exists
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("mixtape").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/mixtape/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default data folder path
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("mixtape"))
        .unwrap_or_else(|| PathBuf::from("./mixtape_data"))
}
