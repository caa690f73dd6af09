pub mod clip_concatenator;
pub mod final_artifact;
