//! Runtime configuration for mixtape-server
//!
//! Built once at startup from the TOML file and command-line arguments, then
//! shared read-only through `AppState`.

use std::path::{Path, PathBuf};

use mixtape_common::config::{DescriptionConfig, MixingConfig, TomlConfig, VideoConfig};
use tracing::info;

use crate::audio::AudioEncoder;
use crate::description::DescriptionOptions;
use crate::error::Result;
use crate::mixer::{MixSettings, Mixer};
use crate::video::VideoRenderer;

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub data_folder: PathBuf,

    /// Produced mixtapes and videos
    pub output_dir: PathBuf,

    /// Per-prefix upload folders
    pub upload_dir: PathBuf,

    /// Lowercase extensions without dots
    pub allowed_extensions: Vec<String>,

    pub mixing: MixingConfig,
    pub video: VideoConfig,
    pub description: DescriptionConfig,

    /// Serve any readable path from `/download`
    pub allow_unscoped_downloads: bool,
}

impl ServiceConfig {
    /// Combine a loaded TOML config with the resolved data folder and port
    pub fn from_toml(toml: &TomlConfig, data_folder: PathBuf, port: u16) -> Self {
        let output_dir = toml
            .output_dir
            .clone()
            .unwrap_or_else(|| data_folder.join("output"));
        let upload_dir = toml
            .upload_dir
            .clone()
            .unwrap_or_else(|| data_folder.join("uploaded"));

        Self {
            port,
            data_folder,
            output_dir,
            upload_dir,
            allowed_extensions: toml.normalized_extensions(),
            mixing: toml.mixing.clone(),
            video: toml.video.clone(),
            description: toml.description.clone(),
            allow_unscoped_downloads: toml.downloads.allow_unscoped,
        }
    }

    /// Defaults rooted at `data_folder`
    pub fn with_data_folder(data_folder: impl Into<PathBuf>) -> Self {
        let toml = TomlConfig::default();
        Self::from_toml(&toml, data_folder.into(), toml.port)
    }

    /// Create the output and upload directories
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.output_dir, &self.upload_dir] {
            if !dir.exists() {
                std::fs::create_dir_all(dir)?;
                info!("Created directory: {}", dir.display());
            }
        }
        Ok(())
    }

    /// Upload folder for a job prefix
    pub fn prefix_dir(&self, job_prefix: &str) -> PathBuf {
        self.upload_dir.join(job_prefix)
    }

    pub fn output_path(&self, output_name: &str) -> PathBuf {
        self.output_dir.join(output_name)
    }

    /// Folders `/download` may serve from
    pub fn download_roots(&self) -> [&Path; 2] {
        [&self.output_dir, &self.upload_dir]
    }

    pub fn mixer(&self, transition_ms: Option<u64>) -> Mixer {
        let mut settings = MixSettings::from(&self.mixing);
        if let Some(ms) = transition_ms {
            settings.transition_ms = ms;
        }
        Mixer::new(settings)
    }

    pub fn audio_encoder(&self) -> AudioEncoder {
        AudioEncoder::new(self.video.ffmpeg_path.clone())
    }

    pub fn video_renderer(&self) -> VideoRenderer {
        VideoRenderer::new(self.video.clone(), self.output_dir.clone())
    }

    pub fn description_options(&self) -> DescriptionOptions {
        DescriptionOptions::from(self.description.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = ServiceConfig::with_data_folder("/srv/mixtape");
        assert_eq!(config.output_dir, PathBuf::from("/srv/mixtape/output"));
        assert_eq!(config.upload_dir, PathBuf::from("/srv/mixtape/uploaded"));
        assert_eq!(config.prefix_dir("gig"), PathBuf::from("/srv/mixtape/uploaded/gig"));
        assert!(!config.allow_unscoped_downloads);
        assert!(config.allowed_extensions.contains(&"flac".to_string()));
    }

    #[test]
    fn test_explicit_dirs_win() {
        let toml = TomlConfig::from_toml_str(
            r#"
            output_dir = "/var/out"
            [downloads]
            allow_unscoped = true
            "#,
        )
        .unwrap();
        let config = ServiceConfig::from_toml(&toml, PathBuf::from("/data"), 8080);
        assert_eq!(config.output_dir, PathBuf::from("/var/out"));
        assert_eq!(config.upload_dir, PathBuf::from("/data/uploaded"));
        assert!(config.allow_unscoped_downloads);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_mixer_override() {
        let config = ServiceConfig::with_data_folder("/tmp/x");
        assert_eq!(config.mixer(None).settings().transition_ms, 6000);
        assert_eq!(config.mixer(Some(2500)).settings().transition_ms, 2500);
    }
}
