//! Audio serialization
//!
//! WAV targets are written directly with hound as 16-bit PCM. Any other
//! extension is written to a temporary WAV first and transcoded by the
//! external encoder. On failure no partial output or temporary file is left
//! behind.

use std::path::{Path, PathBuf};
use std::process::Command;

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{debug, info, warn};

use super::types::AudioBuffer;
use crate::error::{Error, Result};

/// Bitrate passed to the external encoder for lossy targets
const TRANSCODE_BITRATE: &str = "192k";

/// Writes mixed audio to disk in the format implied by the file extension.
#[derive(Debug, Clone)]
pub struct AudioEncoder {
    ffmpeg_path: PathBuf,
}

impl AudioEncoder {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Serialize `buffer` to `output`, returning the written path.
    pub fn encode(&self, buffer: &AudioBuffer, output: &Path) -> Result<PathBuf> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let result = if is_wav(output) {
            write_wav(buffer, output)
        } else {
            self.write_transcoded(buffer, output)
        };

        match result {
            Ok(()) => {
                info!(
                    "Wrote {} frames ({}ms) to {}",
                    buffer.frames(),
                    buffer.duration_ms(),
                    output.display()
                );
                Ok(output.to_path_buf())
            }
            Err(e) => {
                remove_if_exists(output);
                Err(e)
            }
        }
    }

    fn write_transcoded(&self, buffer: &AudioBuffer, output: &Path) -> Result<()> {
        let temp_wav = temp_wav_path(output);
        write_wav(buffer, &temp_wav)?;

        debug!(
            "Transcoding {} -> {} with {}",
            temp_wav.display(),
            output.display(),
            self.ffmpeg_path.display()
        );

        let result = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .args(["-loglevel", "error"])
            .arg("-i")
            .arg(&temp_wav)
            .args(["-vn", "-ar", "44100", "-ac", "2", "-b:a", TRANSCODE_BITRATE])
            .arg(output)
            .output();

        remove_if_exists(&temp_wav);

        let output_status = result.map_err(|e| Error::ExternalTool {
            tool: self.ffmpeg_path.display().to_string(),
            status: "not started".to_string(),
            stderr: e.to_string(),
        })?;

        if !output_status.status.success() {
            let stderr = String::from_utf8_lossy(&output_status.stderr);
            return Err(Error::ExternalTool {
                tool: self.ffmpeg_path.display().to_string(),
                status: output_status.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(())
    }
}

impl Default for AudioEncoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

/// Write `buffer` as 16-bit integer PCM WAV
pub fn write_wav(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    let spec = WavSpec {
        channels: buffer.channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| Error::Encode(format!("Failed to create {}: {}", path.display(), e)))?;

    for &sample in &buffer.samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(value)
            .map_err(|e| Error::Encode(format!("Failed to write {}: {}", path.display(), e)))?;
    }

    writer
        .finalize()
        .map_err(|e| Error::Encode(format!("Failed to finalize {}: {}", path.display(), e)))?;

    Ok(())
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

fn temp_wav_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial.wav");
    output.with_file_name(name)
}

fn remove_if_exists(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}
