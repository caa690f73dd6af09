use super::audio_segment::AudioSegment;
use super::transcript::TranscriptWord;

/// Speech-to-text over decoded narration.
///
/// Input is mono at [`WHISPER_SAMPLE_RATE`](crate::shared::constants::WHISPER_SAMPLE_RATE).
/// Words come back in spoken order with times relative to the segment start.
pub trait SpeechRecognizer: Send {
    fn transcribe(
        &self,
        audio: &AudioSegment,
    ) -> Result<Vec<TranscriptWord>, Box<dyn std::error::Error>>;
}
