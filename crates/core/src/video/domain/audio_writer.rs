use crate::audio::domain::audio_segment::AudioSegment;
use std::path::Path;

/// Domain interface for encoding a soundtrack into a rendered clip.
pub trait AudioWriter: Send {
    /// Encode the AudioSegment and mux it into an existing video-only file,
    /// replacing it in place.
    fn write_audio(
        &self,
        video_path: &Path,
        audio: &AudioSegment,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
