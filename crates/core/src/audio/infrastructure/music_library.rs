use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::shared::constants::AUDIO_EXTENSIONS;

/// Background tracks available in a directory.
#[derive(Debug, Clone, Default)]
pub struct MusicLibrary {
    tracks: Vec<PathBuf>,
}

impl MusicLibrary {
    /// Scans `dir` (non-recursively) for audio files. A missing or unreadable
    /// directory gives an empty library.
    pub fn scan(dir: &Path) -> Self {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::info!("No music directory at {} ({e})", dir.display());
                return Self::default();
            }
        };
        let mut tracks: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_audio_file(p))
            .collect();
        tracks.sort();
        log::debug!("Found {} music tracks in {}", tracks.len(), dir.display());
        Self { tracks }
    }

    pub fn tracks(&self) -> &[PathBuf] {
        &self.tracks
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Path> {
        self.tracks.choose(rng).map(PathBuf::as_path)
    }
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            AUDIO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
