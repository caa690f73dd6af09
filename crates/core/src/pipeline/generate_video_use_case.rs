use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::audio::domain::background_music::BackgroundMusic;
use crate::composition::domain::motion::MotionPicker;
use crate::composition::domain::scene::{SceneAssets, SceneClip};
use crate::generation::domain::asset_provider::{
    ImageProvider, SpeechProvider, TranscriptionProvider,
};
use crate::shared::constants::AUDIO_SAMPLE_RATE;
use crate::video::domain::audio_reader::AudioReader;
use crate::video::domain::audio_writer::AudioWriter;

use super::assemble_clips_use_case::SequenceAssembler;
use super::compose_scene_use_case::SceneCompositor;
use super::error::{PipelineError, SceneStage};
use super::pipeline_logger::PipelineLogger;
use super::script::Script;

/// Measured properties of a finished video.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoReport {
    pub output_path: PathBuf,
    pub duration: f64,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub file_size_bytes: u64,
    pub scene_count: usize,
    pub generation_time: Duration,
}

impl VideoReport {
    pub fn file_size_mb(&self) -> f64 {
        self.file_size_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Seconds of video produced per second of processing.
    pub fn realtime_factor(&self) -> f64 {
        let secs = self.generation_time.as_secs_f64();
        if secs > 0.0 {
            self.duration / secs
        } else {
            0.0
        }
    }
}

/// Final audio pass over the assembled video: narration level plus an
/// optional music bed.
pub struct Soundtrack {
    pub mixer: BackgroundMusic,
    pub track: Option<PathBuf>,
    pub audio_reader: Box<dyn AudioReader>,
    pub audio_writer: Box<dyn AudioWriter>,
}

impl Soundtrack {
    fn is_noop(&self) -> bool {
        self.track.is_none() && self.mixer.voiceover_volume == 1.0
    }

    /// Re-mixes the audio of `video` in place.
    fn apply(&self, video: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let Some(voiceover) = self.audio_reader.read_audio(video, AUDIO_SAMPLE_RATE)? else {
            log::warn!("{} has no audio to mix", video.display());
            return Ok(());
        };

        let music = match &self.track {
            Some(track) => match self.audio_reader.read_audio(track, AUDIO_SAMPLE_RATE) {
                Ok(Some(music)) if !music.is_empty() => {
                    log::info!("Mixing background music {}", track.display());
                    Some(music)
                }
                Ok(_) => {
                    log::warn!("{} has no audio, using narration only", track.display());
                    None
                }
                Err(e) => {
                    log::warn!(
                        "Failed to decode music {}: {e}, using narration only",
                        track.display()
                    );
                    None
                }
            },
            None => None,
        };

        let mixed = self.mixer.mix(&voiceover, music.as_ref());
        self.audio_writer.write_audio(video, &mixed)
    }
}

/// Where per-scene clips go and whether they survive a successful run.
#[derive(Debug, Clone)]
pub struct WorkDir {
    pub path: PathBuf,
    pub keep_intermediates: bool,
}

/// Turns a script into one finished video.
///
/// Scenes are generated and composed strictly in script order. The first
/// failure aborts the run and leaves nothing at the output path.
pub struct GenerateVideoUseCase {
    image_provider: Box<dyn ImageProvider>,
    speech_provider: Box<dyn SpeechProvider>,
    transcription: Option<Box<dyn TranscriptionProvider>>,
    compositor: SceneCompositor,
    assembler: SequenceAssembler,
    motion: Option<MotionPicker>,
    soundtrack: Option<Soundtrack>,
    work_dir: WorkDir,
}

impl GenerateVideoUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        image_provider: Box<dyn ImageProvider>,
        speech_provider: Box<dyn SpeechProvider>,
        transcription: Option<Box<dyn TranscriptionProvider>>,
        compositor: SceneCompositor,
        assembler: SequenceAssembler,
        motion: Option<MotionPicker>,
        soundtrack: Option<Soundtrack>,
        work_dir: WorkDir,
    ) -> Self {
        Self {
            image_provider,
            speech_provider,
            transcription,
            compositor,
            assembler,
            motion,
            soundtrack,
            work_dir,
        }
    }

    pub fn execute(
        &mut self,
        script: &Script,
        output: &Path,
        logger: &mut dyn PipelineLogger,
    ) -> Result<VideoReport, PipelineError> {
        script.validate()?;
        let started = Instant::now();
        let total = script.len();

        fs::create_dir_all(&self.work_dir.path)?;
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut clips = Vec::with_capacity(total);
        for (index, scene) in script.scenes().iter().enumerate() {
            logger.scene(index, total);
            let assets = self.generate_assets(
                index,
                &scene.scene_description,
                &scene.voiceover_text,
                logger,
            )?;
            let motion = self.motion.as_mut().map(MotionPicker::next_spec);
            let clip_path = self.work_dir.path.join(format!("scene_{index}.mp4"));
            let clip = self.compositor.compose(assets, motion, &clip_path, logger)?;
            logger.metric("scene_seconds", clip.duration);
            clips.push(clip);
        }

        let partial = PartialOutput::new(output);
        let assemble_started = Instant::now();
        let mut artifact = self.assembler.assemble(&clips, partial.path())?;
        logger.timing("assemble", elapsed_ms(assemble_started));

        if let Some(soundtrack) = self.soundtrack.as_ref().filter(|s| !s.is_noop()) {
            let mix_started = Instant::now();
            soundtrack
                .apply(partial.path())
                .map_err(PipelineError::Assembly)?;
            artifact.file_size_bytes = fs::metadata(partial.path())?.len();
            logger.timing("music", elapsed_ms(mix_started));
        }

        partial.commit()?;
        self.clean_work_dir(&clips);

        let report = VideoReport {
            output_path: output.to_path_buf(),
            duration: artifact.duration,
            fps: artifact.fps,
            width: artifact.width,
            height: artifact.height,
            file_size_bytes: artifact.file_size_bytes,
            scene_count: total,
            generation_time: started.elapsed(),
        };
        logger.info(&format!(
            "Created {} ({:.1}s, {} scenes)",
            output.display(),
            report.duration,
            total
        ));
        logger.summary();
        Ok(report)
    }

    fn generate_assets(
        &mut self,
        index: usize,
        description: &str,
        voiceover: &str,
        logger: &mut dyn PipelineLogger,
    ) -> Result<SceneAssets, PipelineError> {
        let started = Instant::now();
        let image_path = self
            .image_provider
            .generate_image(description, index)
            .map_err(|e| PipelineError::scene(index, SceneStage::Assets, e))?;
        let audio_path = self
            .speech_provider
            .generate_speech(voiceover, index)
            .map_err(|e| PipelineError::scene(index, SceneStage::Assets, e))?;
        logger.timing("assets", elapsed_ms(started));

        let external_timing = match self.transcription.as_mut() {
            Some(provider) => {
                let started = Instant::now();
                let words = match provider.transcribe_with_word_timestamps(&audio_path) {
                    Ok(words) => words,
                    Err(e) => {
                        log::warn!(
                            "Transcription failed for scene {}: {e}, synthesizing captions",
                            index + 1
                        );
                        None
                    }
                };
                logger.timing("transcribe", elapsed_ms(started));
                words
            }
            None => None,
        };

        Ok(SceneAssets {
            index,
            image_path,
            audio_path,
            voiceover_text: voiceover.to_string(),
            scene_description: description.to_string(),
            external_timing,
        })
    }

    fn clean_work_dir(&self, clips: &[SceneClip]) {
        if self.work_dir.keep_intermediates {
            log::info!("Keeping scene clips in {}", self.work_dir.path.display());
            return;
        }
        for clip in clips {
            if clip.path.exists() {
                if let Err(e) = fs::remove_file(&clip.path) {
                    log::warn!("Failed to remove {}: {e}", clip.path.display());
                }
            }
        }
        // Only succeeds when nothing else lives there
        let _ = fs::remove_dir(&self.work_dir.path);
    }
}

/// A sibling temp file that replaces the destination on `commit` and is
/// removed if dropped uncommitted.
struct PartialOutput {
    temp: PathBuf,
    destination: PathBuf,
    committed: bool,
}

impl PartialOutput {
    fn new(destination: &Path) -> Self {
        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output.mp4".to_string());
        let temp = destination.with_file_name(format!(".{name}.partial.mp4"));
        Self {
            temp,
            destination: destination.to_path_buf(),
            committed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.temp
    }

    fn commit(mut self) -> std::io::Result<()> {
        fs::rename(&self.temp, &self.destination)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialOutput {
    fn drop(&mut self) {
        if !self.committed && self.temp.exists() {
            let _ = fs::remove_file(&self.temp);
        }
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
