use std::fmt;

use thiserror::Error;

use super::script::ScriptError;

/// Step of a scene render that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneStage {
    Assets,
    Image,
    Audio,
    Transcription,
    Render,
    Mux,
}

impl fmt::Display for SceneStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SceneStage::Assets => "asset generation",
            SceneStage::Image => "image loading",
            SceneStage::Audio => "audio decoding",
            SceneStage::Transcription => "transcription",
            SceneStage::Render => "frame rendering",
            SceneStage::Mux => "audio muxing",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid script: {0}")]
    Validation(#[from] ScriptError),
    /// `index` is zero-based; the message shows the 1-based scene number.
    #[error("scene {} failed during {stage}: {source}", .index + 1)]
    Scene {
        index: usize,
        stage: SceneStage,
        #[source]
        source: Box<dyn std::error::Error>,
    },
    #[error("assembly failed: {0}")]
    Assembly(#[source] Box<dyn std::error::Error>),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn scene(
        index: usize,
        stage: SceneStage,
        source: impl Into<Box<dyn std::error::Error>>,
    ) -> Self {
        PipelineError::Scene {
            index,
            stage,
            source: source.into(),
        }
    }

    /// Zero-based index of the scene that failed, when the failure is
    /// scene-scoped.
    pub fn scene_index(&self) -> Option<usize> {
        match self {
            PipelineError::Scene { index, .. } => Some(*index),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_error_reports_one_based_number() {
        let err = PipelineError::scene(2, SceneStage::Image, "corrupt png");
        assert_eq!(
            err.to_string(),
            "scene 3 failed during image loading: corrupt png"
        );
        assert_eq!(err.scene_index(), Some(2));
    }

    #[test]
    fn test_validation_error_wraps_script_error() {
        let err: PipelineError = ScriptError::Empty.into();
        assert!(matches!(err, PipelineError::Validation(ScriptError::Empty)));
        assert_eq!(err.scene_index(), None);
    }
}
