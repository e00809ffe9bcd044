//! Crossfade mixtape mixer
//!
//! Joins tracks end to end. Each join overlaps the tail of the running mix
//! with the head of the next track: the tail fades out, the head fades in,
//! both pass through a low-pass filter, and the two are summed.
//!
//! Every track is normalized to stereo 44.1kHz first, so the output length is
//! `Σ len(track) - Σ overlap` where each overlap is
//! `min(transition, len(track), len(mix so far))`.

use std::path::{Path, PathBuf};

use mixtape_common::config::MixingConfig;
use mixtape_common::human_time::format_duration_ms;
use mixtape_common::time::ms_to_frames;
use mixtape_common::FadeCurve;
use tracing::{debug, info};

use crate::audio::{AudioBuffer, AudioEncoder, LowPassFilter, SimpleDecoder, TARGET_SAMPLE_RATE};
use crate::error::{Error, Result};

/// Default crossfade length
pub const DEFAULT_TRANSITION_MS: u64 = 6000;

/// Default low-pass cutoff applied inside transitions
pub const DEFAULT_LOWPASS_CUTOFF_HZ: f32 = 4000.0;

/// Crossfade parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixSettings {
    pub transition_ms: u64,
    pub lowpass_cutoff_hz: f32,
    pub fade_curve: FadeCurve,
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            transition_ms: DEFAULT_TRANSITION_MS,
            lowpass_cutoff_hz: DEFAULT_LOWPASS_CUTOFF_HZ,
            fade_curve: FadeCurve::Linear,
        }
    }
}

impl From<&MixingConfig> for MixSettings {
    fn from(config: &MixingConfig) -> Self {
        Self {
            transition_ms: config.transition_ms,
            lowpass_cutoff_hz: config.lowpass_cutoff_hz,
            fade_curve: config.fade_curve,
        }
    }
}

/// Frames shared by the outgoing mix and the incoming track.
///
/// Never longer than either operand, so a transition longer than a track
/// crossfades over the whole of the shorter side.
pub fn overlap_frames(transition_frames: usize, track_frames: usize, mix_frames: usize) -> usize {
    transition_frames.min(track_frames).min(mix_frames)
}

/// Stateless crossfade mixer
#[derive(Debug, Clone, Default)]
pub struct Mixer {
    settings: MixSettings,
}

impl Mixer {
    pub fn new(settings: MixSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MixSettings {
        &self.settings
    }

    /// Transition length in frames at the mixing rate
    pub fn transition_frames(&self) -> usize {
        ms_to_frames(self.settings.transition_ms, TARGET_SAMPLE_RATE)
    }

    /// Start an empty mixtape accumulator
    pub fn start(&self) -> Mixtape<'_> {
        Mixtape {
            mixer: self,
            buffer: None,
            track_count: 0,
        }
    }

    /// Mix in-memory tracks in list order.
    ///
    /// A single track is returned normalized and otherwise untouched.
    pub fn mix(&self, tracks: Vec<AudioBuffer>) -> Result<AudioBuffer> {
        let mut mixtape = self.start();
        for track in tracks {
            mixtape.push(track)?;
        }
        mixtape.finish()
    }

    /// Decode `paths` in order, mix them, and write the result to `output`.
    ///
    /// Tracks are decoded one at a time so only the running mix and the
    /// current track are held in memory.
    pub fn mix_files(
        &self,
        paths: &[PathBuf],
        output: &Path,
        encoder: &AudioEncoder,
    ) -> Result<PathBuf> {
        if paths.is_empty() {
            return Err(Error::InvalidInput("No tracks provided".to_string()));
        }

        info!(
            "Mixing {} tracks into {} (transition {}ms, cutoff {}Hz, curve {})",
            paths.len(),
            output.display(),
            self.settings.transition_ms,
            self.settings.lowpass_cutoff_hz,
            self.settings.fade_curve
        );

        let mut mixtape = self.start();
        for path in paths {
            let track = SimpleDecoder::decode_file(path)?;
            debug!("Decoded {} ({})", path.display(), format_duration_ms(track.duration_ms()));
            mixtape.push(track)?;
            debug!("Mix holds {} tracks, {} frames", mixtape.track_count(), mixtape.frames());
        }

        let mixed = mixtape.finish()?;
        encoder.encode(&mixed, output)
    }

    /// Join `track` onto the end of `mix` with a crossfade.
    ///
    /// Both buffers must already be normalized.
    fn crossfade_into(&self, mut mix: AudioBuffer, track: &AudioBuffer) -> AudioBuffer {
        let channels = mix.channels as usize;
        let overlap = overlap_frames(self.transition_frames(), track.frames(), mix.frames());

        debug!(
            "Crossfading {} frames (mix {} frames, track {} frames)",
            overlap,
            mix.frames(),
            track.frames()
        );

        let split = (mix.frames() - overlap) * channels;
        let mut outgoing = mix.samples.split_off(split);
        let mut incoming = track.frame_range(0, overlap).to_vec();

        self.shape(&mut outgoing, FadeDirection::Out, channels);
        self.shape(&mut incoming, FadeDirection::In, channels);

        for (out, inc) in outgoing.iter_mut().zip(&incoming) {
            *out = (*out + inc).clamp(-1.0, 1.0);
        }

        mix.samples.reserve(outgoing.len() + track.samples.len() - incoming.len());
        mix.samples.extend_from_slice(&outgoing);
        mix.samples.extend_from_slice(track.frame_range(overlap, track.frames()));
        mix
    }

    /// Apply the fade envelope then the low-pass filter to one side of a transition
    fn shape(&self, samples: &mut [f32], direction: FadeDirection, channels: usize) {
        let frames = samples.len() / channels;
        if frames == 0 {
            return;
        }

        let curve = self.settings.fade_curve;
        for (idx, frame) in samples.chunks_exact_mut(channels).enumerate() {
            let position = idx as f32 / frames as f32;
            let gain = match direction {
                FadeDirection::In => curve.calculate_fade_in(position),
                FadeDirection::Out => curve.calculate_fade_out(position),
            };
            for sample in frame {
                *sample *= gain;
            }
        }

        LowPassFilter::new(self.settings.lowpass_cutoff_hz, TARGET_SAMPLE_RATE, channels as u16)
            .process_in_place(samples);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadeDirection {
    In,
    Out,
}

/// Running mix, built one track at a time in playback order
pub struct Mixtape<'a> {
    mixer: &'a Mixer,
    buffer: Option<AudioBuffer>,
    track_count: usize,
}

impl Mixtape<'_> {
    /// Normalize `track` and append it with a crossfade
    pub fn push(&mut self, track: AudioBuffer) -> Result<()> {
        let track = track.normalize()?;
        self.track_count += 1;

        self.buffer = Some(match self.buffer.take() {
            None => track,
            Some(mix) => self.mixer.crossfade_into(mix, &track),
        });

        Ok(())
    }

    pub fn track_count(&self) -> usize {
        self.track_count
    }

    /// Current mix length in frames
    pub fn frames(&self) -> usize {
        self.buffer.as_ref().map(AudioBuffer::frames).unwrap_or(0)
    }

    /// Final mix. Fails if no track was pushed.
    pub fn finish(self) -> Result<AudioBuffer> {
        let mixed = self
            .buffer
            .ok_or_else(|| Error::InvalidInput("No tracks provided".to_string()))?;

        info!(
            "Mixtape complete: {} tracks, {}",
            self.track_count,
            format_duration_ms(mixed.duration_ms())
        );

        Ok(mixed)
    }
}
