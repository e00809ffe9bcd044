//! Static-image video rendering
//!
//! The image is scaled to the target resolution into a temporary still, then
//! looped against the audio with the external encoder. The temporary still is
//! removed whether or not rendering succeeds.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use mixtape_common::config::VideoConfig;
use mixtape_common::uuid_utils;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};

/// Renders a still image plus an audio file into a video
#[derive(Debug, Clone)]
pub struct VideoRenderer {
    config: VideoConfig,
    output_dir: PathBuf,
}

impl VideoRenderer {
    pub fn new(config: VideoConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render `image` over `audio` into `<output_dir>/<output_name>`.
    pub async fn render(&self, image: &Path, audio: &Path, output_name: &str) -> Result<PathBuf> {
        if !image.exists() {
            return Err(Error::NotFound(format!("Image not found: {}", image.display())));
        }
        if !audio.exists() {
            return Err(Error::NotFound(format!("Audio not found: {}", audio.display())));
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;

        let still = self.output_dir.join(format!(
            "temp_resized_{}.jpg",
            uuid_utils::to_simple_string(&uuid_utils::generate())
        ));
        let output = self.output_dir.join(output_name);

        info!(
            "Rendering video {} from {} + {}",
            output.display(),
            image.display(),
            audio.display()
        );

        let result = self.render_with_still(image, audio, &still, &output).await;

        if let Err(e) = tokio::fs::remove_file(&still).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove temporary image {}: {}", still.display(), e);
            }
        }

        result.map(|_| output)
    }

    async fn render_with_still(
        &self,
        image: &Path,
        audio: &Path,
        still: &Path,
        output: &Path,
    ) -> Result<()> {
        self.run(self.scale_args(image, still)).await?;
        debug!(
            "Scaled {} to {}x{}",
            image.display(),
            self.config.width,
            self.config.height
        );
        self.run(self.mux_args(still, audio, output)).await
    }

    /// Arguments that scale `image` to the configured resolution
    pub fn scale_args(&self, image: &Path, still: &Path) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            image.into(),
            "-vf".into(),
            format!("scale={}:{}", self.config.width, self.config.height).into(),
            "-frames:v".into(),
            "1".into(),
            still.into(),
        ]
    }

    /// Arguments that loop `still` for the length of `audio`
    pub fn mux_args(&self, still: &Path, audio: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-loglevel".into(),
            "error".into(),
            "-loop".into(),
            "1".into(),
            "-i".into(),
            still.into(),
            "-i".into(),
            audio.into(),
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            self.config.preset.clone().into(),
            "-tune".into(),
            "stillimage".into(),
            "-r".into(),
            self.config.fps.to_string().into(),
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            self.config.audio_bitrate.clone().into(),
            "-shortest".into(),
            output.into(),
        ]
    }

    async fn run(&self, args: Vec<OsString>) -> Result<()> {
        let tool = self.config.ffmpeg_path.display().to_string();

        let output = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .output()
            .await
            .map_err(|e| Error::ExternalTool {
                tool: tool.clone(),
                status: "not started".to_string(),
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("{} failed: {}", tool, stderr);
            return Err(Error::ExternalTool {
                tool,
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(())
    }
}
