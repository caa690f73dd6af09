pub mod music_library;
pub mod whisper_recognizer;
