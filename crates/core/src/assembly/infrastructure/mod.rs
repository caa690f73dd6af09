pub mod ffmpeg_concatenator;
