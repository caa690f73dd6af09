use std::fs;
use std::path::{Path, PathBuf};

use crate::assembly::domain::clip_concatenator::ClipConcatenator;
use crate::assembly::domain::final_artifact::FinalArtifact;
use crate::composition::domain::scene::SceneClip;
use crate::video::domain::video_reader::VideoReader;

use super::error::PipelineError;

/// Joins scene clips in script order and measures the result.
///
/// The reported duration, frame rate and size come from reading the written
/// file back, not from the clips' own bookkeeping.
pub struct SequenceAssembler {
    concatenator: Box<dyn ClipConcatenator>,
    probe: Box<dyn VideoReader>,
}

impl SequenceAssembler {
    pub fn new(concatenator: Box<dyn ClipConcatenator>, probe: Box<dyn VideoReader>) -> Self {
        Self {
            concatenator,
            probe,
        }
    }

    /// Writes `clips` end to end into `destination`. A single clip is moved
    /// into place as-is.
    pub fn assemble(
        &mut self,
        clips: &[SceneClip],
        destination: &Path,
    ) -> Result<FinalArtifact, PipelineError> {
        let first = clips
            .first()
            .ok_or_else(|| PipelineError::Assembly("no scene clips to assemble".into()))?;

        if clips.len() == 1 {
            move_or_copy(&first.path, destination)?;
        } else {
            let paths: Vec<PathBuf> = clips.iter().map(|c| c.path.clone()).collect();
            self.concatenator
                .concatenate(&paths, destination)
                .map_err(PipelineError::Assembly)?;
        }

        let artifact = self.measure(destination)?;
        let expected: f64 = clips.iter().map(|c| c.duration).sum();
        if !artifact.matches_duration(expected, 0.1) {
            log::warn!(
                "Assembled video lasts {:.2}s but scenes add up to {expected:.2}s",
                artifact.duration
            );
        }
        Ok(artifact)
    }

    fn measure(&mut self, path: &Path) -> Result<FinalArtifact, PipelineError> {
        let opened = self.probe.open(path);
        self.probe.close();
        let metadata = opened.map_err(PipelineError::Assembly)?;

        let duration = if metadata.duration > 0.0 {
            metadata.duration
        } else if metadata.fps > 0.0 {
            metadata.total_frames as f64 / metadata.fps
        } else {
            0.0
        };

        Ok(FinalArtifact {
            path: path.to_path_buf(),
            duration,
            fps: metadata.fps,
            width: metadata.width,
            height: metadata.height,
            file_size_bytes: fs::metadata(path)?.len(),
        })
    }
}

/// Renames `from` to `to`, copying when they sit on different filesystems.
fn move_or_copy(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}
