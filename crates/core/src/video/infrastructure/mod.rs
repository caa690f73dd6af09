pub mod ffmpeg_audio_reader;
pub mod ffmpeg_audio_writer;
pub mod ffmpeg_reader;
pub mod ffmpeg_writer;
pub mod image_file_reader;
