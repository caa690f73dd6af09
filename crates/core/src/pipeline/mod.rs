pub mod assemble_clips_use_case;
pub mod compose_scene_use_case;
pub mod error;
pub mod generate_video_use_case;
pub mod pipeline_logger;
pub mod script;
