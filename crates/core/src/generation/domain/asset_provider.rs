use std::path::{Path, PathBuf};

use crate::audio::domain::transcript::TranscriptWord;

/// Produces the still image for a scene from its description.
///
/// Implementations may return a cached or pre-generated file.
pub trait ImageProvider: Send {
    fn generate_image(
        &mut self,
        prompt: &str,
        scene_index: usize,
    ) -> Result<PathBuf, Box<dyn std::error::Error>>;
}

/// Produces the narration audio for a scene. The length of this audio is
/// the scene's duration.
pub trait SpeechProvider: Send {
    fn generate_speech(
        &mut self,
        text: &str,
        scene_index: usize,
    ) -> Result<PathBuf, Box<dyn std::error::Error>>;
}

/// Word-level timestamps for narration audio.
///
/// `Ok(None)` means no word timings are available, which callers treat the
/// same as having no transcription service.
pub trait TranscriptionProvider: Send {
    fn transcribe_with_word_timestamps(
        &mut self,
        audio: &Path,
    ) -> Result<Option<Vec<TranscriptWord>>, Box<dyn std::error::Error>>;
}
