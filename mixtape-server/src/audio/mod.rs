//! Audio decoding, normalization, filtering and serialization
//!
//! **Pipeline:** symphonia decode → channel fold → rubato resample → mix →
//! hound WAV write (→ external transcode for compressed targets)

pub mod decoder;
pub mod encoder;
pub mod filter;
pub mod resampler;
pub mod types;

pub use decoder::SimpleDecoder;
pub use encoder::AudioEncoder;
pub use filter::LowPassFilter;
pub use resampler::Resampler;
pub use types::{AudioBuffer, TARGET_CHANNELS, TARGET_SAMPLE_RATE};
