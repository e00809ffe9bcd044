//! Sample-count and millisecond conversions

/// Convert a millisecond span to a frame count at `sample_rate`.
///
/// Rounds down, matching millisecond slicing of the decoded audio.
pub fn ms_to_frames(ms: u64, sample_rate: u32) -> usize {
    ((ms as u128 * sample_rate as u128) / 1000) as usize
}

/// Convert a frame count at `sample_rate` to whole milliseconds (truncated).
pub fn frames_to_ms(frames: usize, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }
    ((frames as u128 * 1000) / sample_rate as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ms_to_frames_at_cd_rate() {
        assert_eq!(ms_to_frames(0, 44100), 0);
        assert_eq!(ms_to_frames(1000, 44100), 44100);
        assert_eq!(ms_to_frames(6000, 44100), 264_600);
        // 1ms at 44.1kHz is 44.1 frames, truncated
        assert_eq!(ms_to_frames(1, 44100), 44);
    }

    #[test]
    fn test_frames_to_ms_truncates() {
        assert_eq!(frames_to_ms(44100, 44100), 1000);
        assert_eq!(frames_to_ms(44099, 44100), 999);
        assert_eq!(frames_to_ms(10, 0), 0);
    }

    #[test]
    fn test_ms_to_frames_large_value() {
        // One hour should not overflow
        assert_eq!(ms_to_frames(3_600_000, 48000), 172_800_000);
    }
}
