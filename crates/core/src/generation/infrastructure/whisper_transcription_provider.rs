use std::path::Path;

use crate::audio::domain::speech_recognizer::SpeechRecognizer;
use crate::audio::domain::transcript::TranscriptWord;
use crate::generation::domain::asset_provider::TranscriptionProvider;
use crate::shared::constants::WHISPER_SAMPLE_RATE;
use crate::video::domain::audio_reader::AudioReader;

/// Transcribes narration locally: decodes the file to 16 kHz mono and runs
/// it through a [`SpeechRecognizer`].
pub struct WhisperTranscriptionProvider {
    audio_reader: Box<dyn AudioReader>,
    recognizer: Box<dyn SpeechRecognizer>,
}

impl WhisperTranscriptionProvider {
    pub fn new(audio_reader: Box<dyn AudioReader>, recognizer: Box<dyn SpeechRecognizer>) -> Self {
        Self {
            audio_reader,
            recognizer,
        }
    }
}

impl TranscriptionProvider for WhisperTranscriptionProvider {
    fn transcribe_with_word_timestamps(
        &mut self,
        audio: &Path,
    ) -> Result<Option<Vec<TranscriptWord>>, Box<dyn std::error::Error>> {
        let Some(segment) = self.audio_reader.read_audio(audio, WHISPER_SAMPLE_RATE)? else {
            return Ok(None);
        };
        if segment.is_empty() {
            return Ok(None);
        }

        let words = self.recognizer.transcribe(&segment)?;
        log::debug!(
            "Transcribed {} words from {}",
            words.len(),
            audio.display()
        );
        Ok((!words.is_empty()).then_some(words))
    }
}
