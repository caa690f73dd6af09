pub mod frame_renderer;
pub mod motion;
pub mod scene;
