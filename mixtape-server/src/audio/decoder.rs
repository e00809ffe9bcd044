//! Audio decoder using symphonia
//!
//! Decodes MP3, FLAC, AAC/M4A, Vorbis and WAV files to interleaved f32 PCM at
//! the file's native rate and channel count. Normalization to the mixing
//! format happens in [`AudioBuffer::normalize`](super::AudioBuffer::normalize).

use crate::error::{Error, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::{AudioBuffer as PlanarBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{CodecParameters, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, warn};

use super::types::AudioBuffer;

/// Simple whole-file audio decoder.
pub struct SimpleDecoder;

impl SimpleDecoder {
    /// Decode entire audio file to PCM samples.
    ///
    /// # Errors
    /// - Failed to open file
    /// - Unsupported audio format
    /// - Corrupt stream or no decodable audio
    pub fn decode_file(path: &Path) -> Result<AudioBuffer> {
        debug!("Decoding entire file: {}", path.display());

        let (mut format, track_id, codec_params) = Self::open(path)?;

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode(format!("Sample rate not found: {}", path.display())))?;

        let channels = codec_params
            .channels
            .map(|c| c.count() as u16)
            .ok_or_else(|| Error::Decode(format!("Channel count not found: {}", path.display())))?;

        debug!("Audio format: sample_rate={}, channels={}", sample_rate, channels);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!("Reached end of file");
                    break;
                }
                Err(e) => {
                    return Err(Error::Decode(format!(
                        "Error reading packet from {}: {}",
                        path.display(),
                        e
                    )));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => Self::append_interleaved(&decoded, &mut samples),
                Err(SymphoniaError::DecodeError(e)) => {
                    // Corrupt frame: skip it and keep going
                    warn!("Decode error in {}: {}", path.display(), e);
                    continue;
                }
                Err(e) => {
                    return Err(Error::Decode(format!(
                        "Failed to decode {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }

        if samples.is_empty() {
            return Err(Error::Decode(format!(
                "No audio decoded from {}",
                path.display()
            )));
        }

        debug!(
            "Decoded {} samples ({} frames)",
            samples.len(),
            samples.len() / channels.max(1) as usize
        );

        Ok(AudioBuffer::new(samples, sample_rate, channels))
    }

    /// Duration of a file in milliseconds.
    ///
    /// Uses the frame count from the container header when present and falls
    /// back to a full decode otherwise.
    pub fn probe_duration_ms(path: &Path) -> Result<u64> {
        let (_format, _track_id, codec_params) = Self::open(path)?;

        if let (Some(n_frames), Some(rate)) = (codec_params.n_frames, codec_params.sample_rate) {
            if rate > 0 {
                let ms = n_frames.saturating_mul(1000) / rate as u64;
                debug!("Header duration for {}: {}ms", path.display(), ms);
                return Ok(ms);
            }
        }

        debug!("No frame count in header, decoding {}", path.display());
        Ok(Self::decode_file(path)?.duration_ms())
    }

    /// Probe the container and select the first decodable track
    fn open(path: &Path) -> Result<(Box<dyn FormatReader>, u32, CodecParameters)> {
        let file = File::open(path)
            .map_err(|e| Error::Decode(format!("Failed to open file {}: {}", path.display(), e)))?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| {
                Error::Decode(format!("Failed to probe format of {}: {}", path.display(), e))
            })?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode(format!("No audio track found in {}", path.display())))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        Ok((format, track_id, codec_params))
    }

    /// Append a decoded packet to `output` as interleaved f32
    fn append_interleaved(decoded: &AudioBufferRef, output: &mut Vec<f32>) {
        match decoded {
            AudioBufferRef::F32(buf) => Self::interleave_planar(buf, output),
            AudioBufferRef::F64(buf) => Self::interleave_planar(buf, output),
            AudioBufferRef::S32(buf) => Self::interleave_planar(buf, output),
            AudioBufferRef::S24(buf) => Self::interleave_planar(buf, output),
            AudioBufferRef::S16(buf) => Self::interleave_planar(buf, output),
            AudioBufferRef::S8(buf) => Self::interleave_planar(buf, output),
            AudioBufferRef::U32(buf) => Self::interleave_planar(buf, output),
            AudioBufferRef::U24(buf) => Self::interleave_planar(buf, output),
            AudioBufferRef::U16(buf) => Self::interleave_planar(buf, output),
            AudioBufferRef::U8(buf) => Self::interleave_planar(buf, output),
        }
    }

    /// Interleave one planar symphonia buffer, converting each sample to f32
    fn interleave_planar<S>(buf: &PlanarBuffer<S>, output: &mut Vec<f32>)
    where
        S: Sample,
        f32: FromSample<S>,
    {
        let num_channels = buf.spec().channels.count();
        let num_frames = buf.frames();
        output.reserve(num_frames * num_channels);

        for frame_idx in 0..num_frames {
            for ch_idx in 0..num_channels {
                output.push(f32::from_sample(buf.chan(ch_idx)[frame_idx]));
            }
        }
    }
}
