pub const DEFAULT_WIDTH: u32 = 1080;
pub const DEFAULT_HEIGHT: u32 = 1920;
pub const DEFAULT_FPS: f64 = 30.0;

/// Sample rate used for every mixed scene soundtrack (AAC-friendly).
pub const AUDIO_SAMPLE_RATE: u32 = 44100;

pub const WHISPER_MODEL_NAME: &str = "ggml-base.en.bin";
/// Models are fetched as `{WHISPER_MODEL_BASE_URL}/{file name}`.
pub const WHISPER_MODEL_BASE_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Shortest time a synthesized caption word stays on screen.
pub const MIN_WORD_DISPLAY_SECS: f64 = 0.3;

/// External timings within this distance of the audio duration are used as-is.
pub const RECONCILE_TOLERANCE_SECS: f64 = 0.5;

/// Fraction of expected words a transcript must contain to be trusted.
pub const TRANSCRIPT_MATCH_THRESHOLD: f64 = 0.6;

/// Pan amount applied while zooming in, relative to a pure pan.
pub const ZOOM_PAN_FACTOR: f64 = 0.3;

pub const MAX_ZOOM_INTENSITY: f64 = 0.3;
pub const MAX_PAN_INTENSITY: f64 = 0.1;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "aac"];
