use std::path::PathBuf;

/// The assembled video as measured by reading the written file back.
#[derive(Clone, Debug, PartialEq)]
pub struct FinalArtifact {
    pub path: PathBuf,
    pub duration: f64,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub file_size_bytes: u64,
}

impl FinalArtifact {
    pub fn file_size_mb(&self) -> f64 {
        self.file_size_bytes as f64 / (1024.0 * 1024.0)
    }

    /// True when the measured duration is within one frame (plus `slack`
    /// seconds) of `expected`.
    pub fn matches_duration(&self, expected: f64, slack: f64) -> bool {
        let frame = if self.fps > 0.0 { 1.0 / self.fps } else { 0.0 };
        (self.duration - expected).abs() <= frame + slack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn artifact(duration: f64) -> FinalArtifact {
        FinalArtifact {
            path: PathBuf::from("story.mp4"),
            duration,
            fps: 30.0,
            width: 1080,
            height: 1920,
            file_size_bytes: 3 * 1024 * 1024,
        }
    }

    #[test]
    fn test_file_size_mb() {
        assert_relative_eq!(artifact(15.0).file_size_mb(), 3.0);
    }

    #[test]
    fn test_matches_duration_within_one_frame() {
        let a = artifact(15.03);
        assert!(a.matches_duration(15.0, 0.0));
        assert!(!a.matches_duration(14.9, 0.0));
        assert!(a.matches_duration(14.9, 0.1));
    }
}
