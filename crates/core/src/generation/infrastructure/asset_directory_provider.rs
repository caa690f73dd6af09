use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::generation::domain::asset_provider::{ImageProvider, SpeechProvider};
use crate::shared::constants::{AUDIO_EXTENSIONS, IMAGE_EXTENSIONS};

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("no {kind} for scene {} in {} (expected scene_{index}_{kind}.{{{}}})", .index + 1, .dir.display(), .extensions.join(","))]
    Missing {
        index: usize,
        kind: &'static str,
        dir: PathBuf,
        extensions: &'static [&'static str],
    },
}

/// Serves pre-generated scene assets from a directory.
///
/// Files follow `scene_{i}_image.{png,jpg,jpeg,webp}` and
/// `scene_{i}_audio.{mp3,wav,m4a,aac}` with a zero-based `i`.
#[derive(Debug, Clone)]
pub struct AssetDirectoryProvider {
    dir: PathBuf,
}

impl AssetDirectoryProvider {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn find(
        &self,
        index: usize,
        kind: &'static str,
        extensions: &'static [&'static str],
    ) -> Result<PathBuf, AssetError> {
        extensions
            .iter()
            .flat_map(|ext| [ext.to_string(), ext.to_uppercase()])
            .map(|ext| self.dir.join(format!("scene_{index}_{kind}.{ext}")))
            .find(|path| path.is_file())
            .ok_or_else(|| AssetError::Missing {
                index,
                kind,
                dir: self.dir.clone(),
                extensions,
            })
    }
}

impl ImageProvider for AssetDirectoryProvider {
    fn generate_image(
        &mut self,
        prompt: &str,
        scene_index: usize,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = self.find(scene_index, "image", IMAGE_EXTENSIONS)?;
        log::debug!("Scene {} image '{prompt}' -> {}", scene_index + 1, path.display());
        Ok(path)
    }
}

impl SpeechProvider for AssetDirectoryProvider {
    fn generate_speech(
        &mut self,
        _text: &str,
        scene_index: usize,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = self.find(scene_index, "audio", AUDIO_EXTENSIONS)?;
        log::debug!("Scene {} audio -> {}", scene_index + 1, path.display());
        Ok(path)
    }
}
