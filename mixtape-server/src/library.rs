//! Track folder scanning
//!
//! A job prefix maps to one flat folder of uploads. Only the folder's direct
//! children are considered.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};

/// Audio files directly inside `folder` whose extension is in `allowed`.
///
/// Extensions compare case-insensitively and may be given with or without a
/// leading dot. Hidden files are skipped. Results are sorted by file name.
pub fn scan_folder(folder: &Path, allowed: &[String]) -> Result<Vec<PathBuf>> {
    if !folder.exists() {
        return Err(Error::NotFound(format!(
            "Folder not found: {}",
            folder.display()
        )));
    }
    if !folder.is_dir() {
        return Err(Error::InvalidInput(format!(
            "Not a directory: {}",
            folder.display()
        )));
    }

    let allowed: Vec<String> = allowed
        .iter()
        .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
        .collect();

    let mut files = Vec::new();
    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", folder.display(), e);
                continue;
            }
        };

        if entry.file_type().is_file() && has_allowed_extension(entry.path(), &allowed) {
            files.push(entry.into_path());
        }
    }

    debug!("Found {} audio files in {}", files.len(), folder.display());
    Ok(files)
}

/// Shuffle a track list in place
pub fn shuffle_tracks(tracks: &mut [PathBuf]) {
    tracks.shuffle(&mut rand::thread_rng());
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

fn has_allowed_extension(path: &Path, allowed: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| allowed.iter().any(|a| a.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}
