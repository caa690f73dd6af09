use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use synthesium_core::assembly::infrastructure::ffmpeg_concatenator::FfmpegConcatenator;
use synthesium_core::audio::domain::background_music::BackgroundMusic;
use synthesium_core::audio::infrastructure::music_library::MusicLibrary;
use synthesium_core::audio::infrastructure::whisper_recognizer::WhisperRecognizer;
use synthesium_core::captions::domain::caption_renderer::CaptionRenderer;
use synthesium_core::captions::domain::word_timing_resolver::WordTimingResolver;
use synthesium_core::captions::infrastructure::glyph_caption_renderer::{
    default_font_dirs, GlyphCaptionRenderer,
};
use synthesium_core::composition::domain::motion::{MotionKind, MotionPicker};
use synthesium_core::generation::domain::asset_provider::TranscriptionProvider;
use synthesium_core::generation::infrastructure::asset_directory_provider::AssetDirectoryProvider;
use synthesium_core::generation::infrastructure::whisper_transcription_provider::WhisperTranscriptionProvider;
use synthesium_core::pipeline::assemble_clips_use_case::SequenceAssembler;
use synthesium_core::pipeline::compose_scene_use_case::{CompositionOptions, SceneCompositor};
use synthesium_core::pipeline::generate_video_use_case::{
    GenerateVideoUseCase, Soundtrack, VideoReport, WorkDir,
};
use synthesium_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use synthesium_core::pipeline::script::Script;
use synthesium_core::shared::constants::WHISPER_MODEL_BASE_URL;
use synthesium_core::shared::model_resolver;
use synthesium_core::shared::settings::Settings;
use synthesium_core::video::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use synthesium_core::video::infrastructure::ffmpeg_audio_writer::FfmpegAudioWriter;
use synthesium_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use synthesium_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use synthesium_core::video::infrastructure::image_file_reader::ImageFileReader;

/// Renders a captioned vertical video from a scene script.
#[derive(Parser)]
#[command(name = "synthesium")]
struct Cli {
    /// Scene script: a JSON array of {sceneDescription, voiceoverText}.
    script: PathBuf,

    /// Output video file (defaults to the script name with .mp4).
    output: Option<PathBuf>,

    /// Directory holding scene_{i}_image.* and scene_{i}_audio.* files
    /// (defaults to the script's directory).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Settings file to use instead of the per-user settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output frame rate.
    #[arg(long)]
    fps: Option<f64>,

    /// Render without captions.
    #[arg(long)]
    no_captions: bool,

    /// Keep every image static.
    #[arg(long)]
    no_motion: bool,

    /// Use this camera move for every scene: zoom_in, zoom_out, pan_left,
    /// pan_right or zoom_in_pan.
    #[arg(long)]
    motion: Option<MotionKind>,

    /// Seed for reproducible motion and music selection.
    #[arg(long)]
    seed: Option<u64>,

    /// Render without background music.
    #[arg(long)]
    no_music: bool,

    /// Directory of background music tracks.
    #[arg(long)]
    music_dir: Option<PathBuf>,

    /// List the background music tracks found and exit.
    #[arg(long)]
    music_info: bool,

    /// Skip Whisper and always synthesize caption timings.
    #[arg(long)]
    no_whisper: bool,

    /// Directory for per-scene clips.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Keep per-scene clips after a successful render.
    #[arg(long)]
    keep_intermediates: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    if cli.music_info {
        print_music_info(&settings);
        return Ok(());
    }

    if !cli.script.exists() {
        return Err(format!("Script not found: {}", cli.script.display()).into());
    }
    let script = Script::from_file(&cli.script)?;
    log::info!("Loaded {} scenes from {}", script.len(), cli.script.display());

    let assets_dir = cli
        .assets
        .clone()
        .or_else(|| cli.script.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&cli.script));
    let work_dir = cli
        .work_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join(format!("synthesium-{}", process::id())));

    let provider = AssetDirectoryProvider::new(&assets_dir);
    let mut use_case = GenerateVideoUseCase::new(
        Box::new(provider.clone()),
        Box::new(provider),
        build_transcription(&settings),
        build_compositor(&settings),
        SequenceAssembler::new(Box::new(FfmpegConcatenator), Box::new(FfmpegReader::new())),
        settings.motion.enabled.then(|| {
            MotionPicker::new(
                settings.motion.seed,
                settings.motion.pinned,
                settings.motion.zoom_intensity,
                settings.motion.pan_intensity,
            )
        }),
        Some(build_soundtrack(&settings)),
        WorkDir {
            path: work_dir,
            keep_intermediates: cli.keep_intermediates,
        },
    );

    let mut logger = StdoutPipelineLogger::default();
    let report = use_case.execute(&script, &output, &mut logger)?;
    print_report(&report);
    Ok(())
}

fn load_settings(cli: &Cli) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load(),
    };
    if let Some(fps) = cli.fps {
        settings.video.fps = fps;
    }
    if cli.no_captions {
        settings.captions.enabled = false;
    }
    if cli.no_motion {
        settings.motion.enabled = false;
    }
    if cli.motion.is_some() {
        settings.motion.pinned = cli.motion;
    }
    if cli.seed.is_some() {
        settings.motion.seed = cli.seed;
    }
    if cli.no_music {
        settings.music.enabled = false;
    }
    if let Some(dir) = &cli.music_dir {
        settings.music.directory = dir.clone();
    }
    if cli.no_whisper {
        settings.timing.whisper_enabled = false;
    }
    Ok(settings.validate()?)
}

fn build_compositor(settings: &Settings) -> SceneCompositor {
    let style = settings.caption_style();
    let caption_renderer: Option<Box<dyn CaptionRenderer>> = if settings.captions.enabled {
        let renderer = GlyphCaptionRenderer::load(&style, &default_font_dirs());
        renderer
            .has_font()
            .then(|| Box::new(renderer) as Box<dyn CaptionRenderer>)
    } else {
        None
    };

    SceneCompositor::new(
        Box::new(ImageFileReader::new()),
        Box::new(FfmpegAudioReader),
        Box::new(FfmpegWriter::new().with_bitrate(settings.video.bitrate)),
        Box::new(FfmpegAudioWriter),
        caption_renderer,
        WordTimingResolver::new(settings.timing_config()),
        CompositionOptions {
            width: settings.video.width,
            height: settings.video.height,
            fps: settings.video.fps,
            captions_enabled: settings.captions.enabled,
            style,
        },
    )
}

/// Whisper word timings, when enabled and the model can be resolved.
fn build_transcription(settings: &Settings) -> Option<Box<dyn TranscriptionProvider>> {
    if !settings.captions.enabled || !settings.timing.whisper_enabled {
        return None;
    }
    let name = &settings.timing.whisper_model;
    log::info!("Resolving model: {name}");
    let url = format!("{WHISPER_MODEL_BASE_URL}/{name}");
    let model_path =
        match model_resolver::resolve(name, &url, None, Some(Box::new(download_progress))) {
            Ok(path) => path,
            Err(e) => {
                eprintln!();
                log::warn!("Whisper unavailable ({e}), caption timings will be synthesized");
                return None;
            }
        };
    eprintln!();

    match WhisperRecognizer::new(&model_path) {
        Ok(recognizer) => Some(Box::new(WhisperTranscriptionProvider::new(
            Box::new(FfmpegAudioReader),
            Box::new(recognizer),
        ))),
        Err(e) => {
            log::warn!("Whisper unavailable ({e}), caption timings will be synthesized");
            None
        }
    }
}

fn build_soundtrack(settings: &Settings) -> Soundtrack {
    let track = if settings.music.enabled {
        let library = MusicLibrary::scan(&settings.music.directory);
        let mut rng = StdRng::seed_from_u64(settings.motion.seed.unwrap_or_else(rand::random));
        let track = library.choose(&mut rng).map(Path::to_path_buf);
        if track.is_none() {
            log::info!(
                "No music tracks in {}, rendering without music",
                settings.music.directory.display()
            );
        }
        track
    } else {
        None
    };

    Soundtrack {
        mixer: BackgroundMusic {
            music_volume: settings.music.music_volume,
            voiceover_volume: settings.music.voiceover_volume,
            fade_duration: settings.music.fade_duration,
        },
        track,
        audio_reader: Box::new(FfmpegAudioReader),
        audio_writer: Box::new(FfmpegAudioWriter),
    }
}

fn print_music_info(settings: &Settings) {
    let dir = &settings.music.directory;
    let library = MusicLibrary::scan(dir);
    if library.is_empty() {
        println!("No music tracks in {}", dir.display());
        return;
    }
    println!("{} music tracks in {}:", library.tracks().len(), dir.display());
    for track in library.tracks() {
        let name = track.file_name().unwrap_or(track.as_os_str());
        println!("  {}", name.to_string_lossy());
    }
}

fn print_report(report: &VideoReport) {
    println!("Video created: {}", report.output_path.display());
    println!("  Duration:   {:.1}s", report.duration);
    println!("  Resolution: {}x{} @ {:.0} fps", report.width, report.height, report.fps);
    println!("  Size:       {:.1} MB", report.file_size_mb());
    println!("  Scenes:     {}", report.scene_count);
    println!(
        "  Render:     {:.1}s ({:.2}x realtime)",
        report.generation_time.as_secs_f64(),
        report.realtime_factor()
    );
}

fn default_output(script: &Path) -> PathBuf {
    let stem = script
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    PathBuf::from(format!("{stem}.mp4"))
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading speech model... {pct}%");
    } else {
        eprint!("\rDownloading speech model... {downloaded} bytes");
    }
}
