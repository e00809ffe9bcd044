//! Human-readable time formatting
//!
//! Tracklist timestamps use zero-padded `MM:SS`. Minutes are not wrapped into
//! hours, so a two hour offset renders as `120:00`.

/// Format whole seconds as `MM:SS`.
///
/// # Examples
///
/// ```
/// use mixtape_common::human_time::format_timestamp;
///
/// assert_eq!(format_timestamp(0), "00:00");
/// assert_eq!(format_timestamp(180), "03:00");
/// assert_eq!(format_timestamp(3725), "62:05");
/// ```
pub fn format_timestamp(seconds: u64) -> String {
    let minutes = seconds / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}", minutes, secs)
}

/// Format milliseconds as `M:SS.s` for log output
pub fn format_duration_ms(ms: u64) -> String {
    let total_secs = ms / 1000;
    let tenths = (ms % 1000) / 100;
    format!("{}:{:02}.{}", total_secs / 60, total_secs % 60, tenths)
}
