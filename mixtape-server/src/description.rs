//! Timestamped tracklist descriptions

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use mixtape_common::config::DescriptionConfig;
use mixtape_common::human_time::format_timestamp;
use tracing::debug;

use crate::audio::{types::display_name, SimpleDecoder};
use crate::error::{Error, Result};

/// Text around the tracklist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionOptions {
    pub mixtape_name: String,
    pub genre: String,

    /// Timestamp of the first track, in seconds
    pub start_offset_secs: u64,

    pub hashtags: Vec<String>,
    pub footer: String,
}

impl Default for DescriptionOptions {
    fn default() -> Self {
        DescriptionConfig::default().into()
    }
}

impl From<DescriptionConfig> for DescriptionOptions {
    fn from(config: DescriptionConfig) -> Self {
        Self {
            mixtape_name: "Mixtape".to_string(),
            genre: "Mix".to_string(),
            start_offset_secs: 0,
            hashtags: config.hashtags,
            footer: config.footer,
        }
    }
}

/// One tracklist line: display name and whole-second duration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracklistEntry {
    pub name: String,
    pub duration_secs: u64,
}

impl TracklistEntry {
    /// Probe `path` for its duration
    pub fn from_file(path: &Path) -> Result<Self> {
        let duration_ms = SimpleDecoder::probe_duration_ms(path)?;
        Ok(Self {
            name: display_name(path),
            duration_secs: duration_ms / 1000,
        })
    }
}

/// Build a description for tracks in playback order.
///
/// Each track's timestamp is the offset plus the truncated durations of all
/// earlier tracks.
pub fn generate_description(paths: &[PathBuf], options: &DescriptionOptions) -> Result<String> {
    if paths.is_empty() {
        return Err(Error::InvalidInput("No tracks provided".to_string()));
    }

    let entries = paths
        .iter()
        .map(|p| TracklistEntry::from_file(p))
        .collect::<Result<Vec<_>>>()?;

    debug!("Generating description for {} tracks", entries.len());
    render_description(&entries, options)
}

/// Format already-probed entries
pub fn render_description(
    entries: &[TracklistEntry],
    options: &DescriptionOptions,
) -> Result<String> {
    if entries.is_empty() {
        return Err(Error::InvalidInput("No tracks provided".to_string()));
    }

    let mut text = format!(
        "🔥 {} 🔥\nGenre: {}\n\n🎵 Tracklist:\n",
        options.mixtape_name, options.genre
    );

    let mut offset = options.start_offset_secs;
    for entry in entries {
        // Writing to a String cannot fail
        let _ = writeln!(text, "{} - {}", format_timestamp(offset), entry.name);
        offset += entry.duration_secs;
    }

    text.push('\n');
    text.push_str(&options.footer);
    text.push_str("\n\n");
    text.push_str(&options.hashtags.join(" "));
    Ok(text)
}
