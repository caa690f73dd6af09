pub mod asset_directory_provider;
pub mod whisper_transcription_provider;
