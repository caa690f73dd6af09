use std::path::PathBuf;

use crate::audio::domain::transcript::TranscriptWord;
use crate::captions::domain::word_event::TimingSource;

use super::motion::MotionKind;

/// Everything needed to render one scene. Consumed by a single composition.
#[derive(Clone, Debug)]
pub struct SceneAssets {
    /// Zero-based position in the script.
    pub index: usize,
    pub image_path: PathBuf,
    pub audio_path: PathBuf,
    pub voiceover_text: String,
    pub scene_description: String,
    /// Word timestamps from a transcription service, when available.
    pub external_timing: Option<Vec<TranscriptWord>>,
}

/// A rendered scene: video, captions and soundtrack muxed into one file.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneClip {
    pub index: usize,
    pub path: PathBuf,
    /// Frame-aligned duration in seconds.
    pub duration: f64,
    pub frame_count: usize,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub motion: Option<MotionKind>,
    pub caption_words: usize,
    pub timing_source: TimingSource,
}

/// Frames needed to show `duration` seconds at `fps`, never fewer than one.
pub fn frame_count_for(duration: f64, fps: f64) -> usize {
    if !(duration.is_finite() && fps > 0.0) {
        return 1;
    }
    ((duration * fps).round() as usize).max(1)
}
