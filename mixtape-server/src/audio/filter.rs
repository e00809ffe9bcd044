//! One-pole low-pass filter used to soften crossfade regions.
//!
//! RC smoothing per channel: `y[n] = y[n-1] + α·(x[n] - y[n-1])` with
//! `α = dt / (RC + dt)`, `RC = 1 / (2π·cutoff)`, `dt = 1 / sample_rate`.
//! The first frame passes through unchanged and seeds the state.

use std::f32::consts::PI;

/// Stateful low-pass filter over interleaved samples.
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    alpha: f32,
    channels: usize,
    last: Vec<f32>,
    primed: bool,
}

impl LowPassFilter {
    pub fn new(cutoff_hz: f32, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1) as usize;
        Self {
            alpha: Self::alpha(cutoff_hz, sample_rate),
            channels,
            last: vec![0.0; channels],
            primed: false,
        }
    }

    /// Smoothing coefficient for `cutoff_hz` at `sample_rate`.
    ///
    /// Non-positive or non-finite cutoffs disable filtering (α = 1).
    pub fn alpha(cutoff_hz: f32, sample_rate: u32) -> f32 {
        if !cutoff_hz.is_finite() || cutoff_hz <= 0.0 || sample_rate == 0 {
            return 1.0;
        }
        let rc = 1.0 / (cutoff_hz * 2.0 * PI);
        let dt = 1.0 / sample_rate as f32;
        dt / (rc + dt)
    }

    /// Filter interleaved samples in place
    pub fn process_in_place(&mut self, samples: &mut [f32]) {
        let mut frames = samples.chunks_exact_mut(self.channels);

        if !self.primed {
            let Some(first) = frames.next() else {
                return;
            };
            self.last.copy_from_slice(first);
            self.primed = true;
        }

        for frame in frames {
            for (sample, last) in frame.iter_mut().zip(self.last.iter_mut()) {
                *last += self.alpha * (*sample - *last);
                *sample = *last;
            }
        }
    }
}
