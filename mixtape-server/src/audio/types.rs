//! Core audio data types
//!
//! Samples are f32 in [-1.0, 1.0], interleaved by channel:
//! `[L, R, L, R, ...]` for stereo.

use std::path::Path;

use mixtape_common::time::frames_to_ms;
use tracing::debug;

use super::resampler::Resampler;
use crate::error::{Error, Result};

/// Standard sample rate every track is normalized to before mixing
pub const TARGET_SAMPLE_RATE: u32 = 44100;

/// Standard channel count every track is normalized to before mixing
pub const TARGET_CHANNELS: u16 = 2;

/// Decoded PCM audio held fully in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved PCM samples
    pub samples: Vec<f32>,

    /// Frames per second
    pub sample_rate: u32,

    /// Interleaved channel count
    pub channels: u16,
}

impl AudioBuffer {
    /// Create a buffer from interleaved samples.
    ///
    /// Trailing samples that do not form a whole frame are dropped.
    pub fn new(mut samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1);
        let whole = samples.len() - samples.len() % channels as usize;
        samples.truncate(whole);
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Create a silent buffer of `frames` frames
    pub fn silent(frames: usize, sample_rate: u32, channels: u16) -> Self {
        Self::new(vec![0.0; frames * channels.max(1) as usize], sample_rate, channels)
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in milliseconds (truncated)
    pub fn duration_ms(&self) -> u64 {
        frames_to_ms(self.frames(), self.sample_rate)
    }

    /// Duration in whole seconds (truncated)
    pub fn duration_secs(&self) -> u64 {
        self.duration_ms() / 1000
    }

    /// Interleaved samples for frames `start..end`
    pub fn frame_range(&self, start: usize, end: usize) -> &[f32] {
        let ch = self.channels as usize;
        let end = end.min(self.frames());
        let start = start.min(end);
        &self.samples[start * ch..end * ch]
    }

    /// True when already at the mixing rate and channel count
    pub fn is_normalized(&self) -> bool {
        self.sample_rate == TARGET_SAMPLE_RATE && self.channels == TARGET_CHANNELS
    }

    /// Fold to two channels.
    ///
    /// Mono is duplicated into both channels. Layouts wider than stereo keep
    /// the first two channels, which symphonia orders as front-left and
    /// front-right.
    pub fn into_stereo(self) -> Self {
        match self.channels {
            2 => self,
            1 => {
                let mut stereo = Vec::with_capacity(self.samples.len() * 2);
                for &sample in &self.samples {
                    stereo.push(sample);
                    stereo.push(sample);
                }
                Self::new(stereo, self.sample_rate, 2)
            }
            n => {
                let n = n as usize;
                let mut stereo = Vec::with_capacity(self.frames() * 2);
                for frame in self.samples.chunks_exact(n) {
                    stereo.push(frame[0]);
                    stereo.push(frame[1]);
                }
                Self::new(stereo, self.sample_rate, 2)
            }
        }
    }

    /// Normalize to stereo at 44.1kHz so buffers can be overlaid sample by sample
    pub fn normalize(self) -> Result<Self> {
        if self.is_normalized() {
            return Ok(self);
        }

        debug!(
            "Normalizing buffer: {}Hz/{}ch -> {}Hz/{}ch",
            self.sample_rate, self.channels, TARGET_SAMPLE_RATE, TARGET_CHANNELS
        );

        let stereo = self.into_stereo();
        if stereo.sample_rate == TARGET_SAMPLE_RATE {
            return Ok(stereo);
        }
        if stereo.sample_rate == 0 {
            return Err(Error::Resample("Source sample rate is zero".to_string()));
        }

        let resampled = Resampler::resample(&stereo.samples, stereo.sample_rate, stereo.channels)?;
        Ok(Self::new(resampled, TARGET_SAMPLE_RATE, TARGET_CHANNELS))
    }
}

/// File stem used as a track's display name
pub fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
