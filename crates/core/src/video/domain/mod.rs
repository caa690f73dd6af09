pub mod audio_reader;
pub mod audio_writer;
pub mod video_reader;
pub mod video_writer;
