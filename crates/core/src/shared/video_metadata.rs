use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    /// Container duration in seconds (0.0 when unknown or for still images).
    pub duration: f64,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Metadata for a render target of the given size and rate.
    pub fn for_output(width: u32, height: u32, fps: f64) -> Self {
        Self {
            width,
            height,
            fps,
            total_frames: 0,
            duration: 0.0,
            codec: String::new(),
            source_path: None,
        }
    }

    /// Frame rate rounded for encoders that need an integral rate.
    pub fn integral_fps(&self) -> i32 {
        let fps = self.fps.round() as i32;
        if fps <= 0 {
            30
        } else {
            fps
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_output() {
        let meta = VideoMetadata::for_output(1080, 1920, 30.0);
        assert_eq!(meta.width, 1080);
        assert_eq!(meta.height, 1920);
        assert_eq!(meta.fps, 30.0);
        assert_eq!(meta.total_frames, 0);
        assert_eq!(meta.source_path, None);
    }

    #[test]
    fn test_integral_fps_rounds() {
        let meta = VideoMetadata::for_output(10, 10, 29.97);
        assert_eq!(meta.integral_fps(), 30);
    }

    #[test]
    fn test_integral_fps_defaults_for_stills() {
        // Images are represented as single-frame video with fps=0
        let meta = VideoMetadata::for_output(10, 10, 0.0);
        assert_eq!(meta.integral_fps(), 30);
    }
}
