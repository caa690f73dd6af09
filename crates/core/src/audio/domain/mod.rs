pub mod audio_segment;
pub mod background_music;
pub mod speech_recognizer;
pub mod transcript;
