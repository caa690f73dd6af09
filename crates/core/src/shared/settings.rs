use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::captions::domain::caption_style::{CaptionStyle, DisplayMode};
use crate::captions::domain::word_timing_resolver::TimingConfig;
use crate::composition::domain::motion::MotionKind;

use super::constants::{
    DEFAULT_FPS, DEFAULT_HEIGHT, DEFAULT_WIDTH, MAX_PAN_INTENSITY, MAX_ZOOM_INTENSITY,
    WHISPER_MODEL_NAME,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Target video bitrate in bits per second.
    pub bitrate: usize,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            bitrate: 8_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionSettings {
    pub enabled: bool,
    pub font_size: f32,
    pub font_color: String,
    pub stroke_color: String,
    pub stroke_width: u32,
    pub font_name: String,
    pub fallback_font_name: String,
    pub display_mode: DisplayMode,
    pub max_chars_per_line: usize,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            font_size: 90.0,
            font_color: "white".to_string(),
            stroke_color: "black".to_string(),
            stroke_width: 4,
            font_name: "Montserrat-Bold".to_string(),
            fallback_font_name: "DejaVuSans-Bold".to_string(),
            display_mode: DisplayMode::SingleWordPop,
            max_chars_per_line: 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub word_display_duration: f64,
    pub word_transition_gap: f64,
    pub whisper_enabled: bool,
    pub whisper_model: String,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            word_display_duration: 0.6,
            word_transition_gap: 0.1,
            whisper_enabled: true,
            whisper_model: WHISPER_MODEL_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    pub enabled: bool,
    pub zoom_intensity: f64,
    pub pan_intensity: f64,
    /// Use this motion for every scene instead of picking one at random.
    pub pinned: Option<MotionKind>,
    /// Seed for reproducible motion selection.
    pub seed: Option<u64>,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            zoom_intensity: 0.15,
            pan_intensity: 0.05,
            pinned: None,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicSettings {
    pub enabled: bool,
    pub directory: PathBuf,
    pub music_volume: f32,
    pub voiceover_volume: f32,
    pub fade_duration: f64,
}

impl Default for MusicSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("music"),
            music_volume: 0.15,
            voiceover_volume: 1.0,
            fade_duration: 1.0,
        }
    }
}

/// Every recognized rendering option, persisted as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub video: VideoSettings,
    pub captions: CaptionSettings,
    pub timing: TimingSettings,
    pub motion: MotionSettings,
    pub music: MusicSettings,
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Synthesium").join("settings.json"))
    }

    /// Loads the per-user settings file, falling back to defaults when it is
    /// missing or unreadable.
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_or_default(&path))
            .unwrap_or_default()
    }

    /// Like [`Settings::from_file`], but a missing file silently yields the
    /// defaults and a broken one yields them with a warning.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}, using default settings");
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Rejects unusable values and clamps motion intensities into range.
    pub fn validate(mut self) -> Result<Self, SettingsError> {
        if self.video.width == 0 || self.video.height == 0 {
            return Err(SettingsError::Invalid(format!(
                "Video dimensions must be positive, got {}x{}",
                self.video.width, self.video.height
            )));
        }
        if self.video.width % 2 != 0 || self.video.height % 2 != 0 {
            return Err(SettingsError::Invalid(format!(
                "Video dimensions must be even for YUV420 encoding, got {}x{}",
                self.video.width, self.video.height
            )));
        }
        if !(self.video.fps > 0.0 && self.video.fps.is_finite()) {
            return Err(SettingsError::Invalid(format!(
                "Frame rate must be positive, got {}",
                self.video.fps
            )));
        }
        if !(self.captions.font_size > 0.0 && self.captions.font_size.is_finite()) {
            return Err(SettingsError::Invalid(format!(
                "Caption font size must be positive, got {}",
                self.captions.font_size
            )));
        }
        if !(self.timing.word_display_duration > 0.0 && self.timing.word_display_duration.is_finite())
            || !(self.timing.word_transition_gap >= 0.0 && self.timing.word_transition_gap.is_finite())
        {
            return Err(SettingsError::Invalid(format!(
                "Word duration must be positive and gap non-negative, got {} / {}",
                self.timing.word_display_duration, self.timing.word_transition_gap
            )));
        }
        if !(self.music.fade_duration >= 0.0 && self.music.fade_duration.is_finite()) {
            return Err(SettingsError::Invalid(format!(
                "Music fade duration must be non-negative, got {}",
                self.music.fade_duration
            )));
        }
        self.motion.zoom_intensity = self.motion.zoom_intensity.clamp(0.0, MAX_ZOOM_INTENSITY);
        self.motion.pan_intensity = self.motion.pan_intensity.clamp(0.0, MAX_PAN_INTENSITY);
        self.music.music_volume = self.music.music_volume.max(0.0);
        self.music.voiceover_volume = self.music.voiceover_volume.max(0.0);
        Ok(self)
    }

    pub fn caption_style(&self) -> CaptionStyle {
        CaptionStyle::from_settings(&self.captions)
    }

    pub fn timing_config(&self) -> TimingConfig {
        TimingConfig {
            word_duration: self.timing.word_display_duration,
            gap: self.timing.word_transition_gap,
            display_mode: self.captions.display_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_defaults_match_vertical_short_format() {
        let s = Settings::default();
        assert_eq!((s.video.width, s.video.height), (1080, 1920));
        assert_relative_eq!(s.video.fps, 30.0);
        assert!(s.captions.enabled);
        assert!(s.motion.enabled);
        assert_eq!(s.captions.display_mode, DisplayMode::SingleWordPop);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "video": { "fps": 24 }, "captions": { "enabled": false } }"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_relative_eq!(s.video.fps, 24.0);
        assert_eq!(s.video.width, 1080);
        assert!(!s.captions.enabled);
        assert_eq!(s.captions.font_name, "Montserrat-Bold");
    }

    #[test]
    fn test_motion_kind_and_display_mode_parse_snake_case() {
        let json = r#"{
            "motion": { "pinned": "zoom_in_pan" },
            "captions": { "display_mode": "progressive" }
        }"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.motion.pinned, Some(MotionKind::ZoomInPan));
        assert_eq!(s.captions.display_mode, DisplayMode::Progressive);
    }

    #[test]
    fn test_validate_clamps_intensities() {
        let mut s = Settings::default();
        s.motion.zoom_intensity = 0.9;
        s.motion.pan_intensity = -1.0;
        let s = s.validate().unwrap();
        assert_relative_eq!(s.motion.zoom_intensity, 0.3);
        assert_relative_eq!(s.motion.pan_intensity, 0.0);
    }

    #[test]
    fn test_validate_rejects_zero_fps() {
        let mut s = Settings::default();
        s.video.fps = 0.0;
        assert!(matches!(s.validate(), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_odd_dimensions() {
        let mut s = Settings::default();
        s.video.width = 1081;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_from_file_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Settings::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("settings.json"));
    }

    #[test]
    fn test_from_file_missing_is_read_error() {
        let err = Settings::from_file(Path::new("/nonexistent/settings.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[rstest]
    #[case::font_size(|s: &mut Settings| s.captions.font_size = f32::NAN)]
    #[case::word_duration(|s: &mut Settings| s.timing.word_display_duration = f64::NAN)]
    #[case::word_gap(|s: &mut Settings| s.timing.word_transition_gap = f64::NAN)]
    #[case::fade(|s: &mut Settings| s.music.fade_duration = f64::NAN)]
    #[case::infinite_duration(|s: &mut Settings| s.timing.word_display_duration = f64::INFINITY)]
    fn test_validate_rejects_non_finite(#[case] corrupt: fn(&mut Settings)) {
        let mut s = Settings::default();
        corrupt(&mut s);
        assert!(matches!(s.validate(), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn test_load_or_default_falls_back_on_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "video": { "fps": "fast" } }"#).unwrap();
        assert_eq!(Settings::load_or_default(&path), Settings::default());
    }

    #[test]
    fn test_load_or_default_reads_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "video": { "fps": 25 } }"#).unwrap();
        assert_relative_eq!(Settings::load_or_default(&path).video.fps, 25.0);
        assert_eq!(
            Settings::load_or_default(&dir.path().join("absent.json")),
            Settings::default()
        );
    }

    #[test]
    fn test_timing_config_reflects_settings() {
        let mut s = Settings::default();
        s.timing.word_display_duration = 0.5;
        s.timing.word_transition_gap = 0.2;
        let cfg = s.timing_config();
        assert_relative_eq!(cfg.word_duration, 0.5);
        assert_relative_eq!(cfg.gap, 0.2);
    }
}
