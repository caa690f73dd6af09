use std::path::Path;
use std::time::Instant;

use crate::captions::domain::caption_renderer::{CaptionBitmap, CaptionRenderer};
use crate::captions::domain::caption_style::CaptionStyle;
use crate::captions::domain::caption_track::CaptionTrack;
use crate::captions::domain::word_event::{TimingSource, WordTiming};
use crate::captions::domain::word_timing_resolver::WordTimingResolver;
use crate::composition::domain::frame_renderer::{cover_resize, render_viewport};
use crate::composition::domain::motion::{MotionSpec, Viewport};
use crate::composition::domain::scene::{frame_count_for, SceneAssets, SceneClip};
use crate::shared::constants::AUDIO_SAMPLE_RATE;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::audio_reader::AudioReader;
use crate::video::domain::audio_writer::AudioWriter;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::error::{PipelineError, SceneStage};
use super::pipeline_logger::PipelineLogger;

/// Output geometry and caption switches shared by every scene of a video.
#[derive(Debug, Clone)]
pub struct CompositionOptions {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub captions_enabled: bool,
    pub style: CaptionStyle,
}

/// Renders one scene: the still image under its camera move, the caption
/// track on top, and the voiceover muxed in.
///
/// Collaborators are reused across scenes. Every reader and writer opened
/// for a scene is closed before `compose` returns, on failure too.
pub struct SceneCompositor {
    image_reader: Box<dyn VideoReader>,
    audio_reader: Box<dyn AudioReader>,
    writer: Box<dyn VideoWriter>,
    audio_writer: Box<dyn AudioWriter>,
    caption_renderer: Option<Box<dyn CaptionRenderer>>,
    resolver: WordTimingResolver,
    options: CompositionOptions,
}

impl SceneCompositor {
    pub fn new(
        image_reader: Box<dyn VideoReader>,
        audio_reader: Box<dyn AudioReader>,
        writer: Box<dyn VideoWriter>,
        audio_writer: Box<dyn AudioWriter>,
        caption_renderer: Option<Box<dyn CaptionRenderer>>,
        resolver: WordTimingResolver,
        options: CompositionOptions,
    ) -> Self {
        Self {
            image_reader,
            audio_reader,
            writer,
            audio_writer,
            caption_renderer,
            resolver,
            options,
        }
    }

    pub fn options(&self) -> &CompositionOptions {
        &self.options
    }

    /// Renders `assets` into `output`. `motion` of `None` keeps the image
    /// static for the whole clip.
    ///
    /// The clip lasts as long as the voiceover, rounded to whole frames.
    pub fn compose(
        &mut self,
        assets: SceneAssets,
        motion: Option<MotionSpec>,
        output: &Path,
        logger: &mut dyn PipelineLogger,
    ) -> Result<SceneClip, PipelineError> {
        let index = assets.index;
        let fps = self.options.fps;

        let started = Instant::now();
        let mut audio = self
            .audio_reader
            .read_audio(&assets.audio_path, AUDIO_SAMPLE_RATE)
            .map_err(|e| PipelineError::scene(index, SceneStage::Audio, e))?
            .ok_or_else(|| {
                PipelineError::scene(
                    index,
                    SceneStage::Audio,
                    format!("{} has no audio track", assets.audio_path.display()),
                )
            })?;
        logger.timing("audio", elapsed_ms(started));

        let audio_duration = audio.duration();
        let frame_count = frame_count_for(audio_duration, fps);
        let clip_duration = frame_count as f64 / fps;

        let started = Instant::now();
        let timing = if self.options.captions_enabled {
            self.resolver.resolve(
                &assets.voiceover_text,
                audio_duration,
                assets.external_timing.as_deref(),
            )
        } else {
            WordTiming {
                events: Vec::new(),
                source: TimingSource::Synthesized,
            }
        };
        logger.timing("timing", elapsed_ms(started));
        let source = timing.source;
        let track = CaptionTrack::new(
            timing.events,
            self.resolver.config().display_mode,
            self.options.style.max_chars_per_line,
        );
        logger.metric("caption_words", track.events().len() as f64);

        let started = Instant::now();
        let base = self
            .load_base_image(&assets.image_path)
            .map_err(|e| PipelineError::scene(index, SceneStage::Image, e))?;
        logger.timing("image", elapsed_ms(started));

        let started = Instant::now();
        let metadata =
            VideoMetadata::for_output(self.options.width, self.options.height, fps);
        self.writer
            .open(output, &metadata)
            .map_err(|e| PipelineError::scene(index, SceneStage::Render, e))?;
        let rendered = self.render_frames(&base, &track, motion, frame_count, logger);
        let closed = self.writer.close();
        rendered
            .and(closed)
            .map_err(|e| PipelineError::scene(index, SceneStage::Render, e))?;
        logger.timing("render", elapsed_ms(started));

        let started = Instant::now();
        audio.fit_to_duration(clip_duration);
        self.audio_writer
            .write_audio(output, &audio)
            .map_err(|e| PipelineError::scene(index, SceneStage::Mux, e))?;
        logger.timing("mux", elapsed_ms(started));

        log::debug!(
            "Scene {} composed: {frame_count} frames, {clip_duration:.2}s, {} caption words ({source:?})",
            index + 1,
            track.events().len()
        );

        Ok(SceneClip {
            index,
            path: output.to_path_buf(),
            duration: clip_duration,
            frame_count,
            fps,
            width: self.options.width,
            height: self.options.height,
            motion: motion.map(|m| m.kind),
            caption_words: track.events().len(),
            timing_source: source,
        })
    }

    /// Decodes the still and fits it to the output frame.
    fn load_base_image(&mut self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        let decoded = match self.image_reader.open(path) {
            Ok(_) => self.image_reader.frames().next().unwrap_or_else(|| {
                Err(format!("{} contains no image", path.display()).into())
            }),
            Err(e) => Err(e),
        };
        self.image_reader.close();

        let frame = decoded?;
        let image = frame
            .into_image()
            .ok_or("decoded image has an invalid buffer size")?;
        let fitted = cover_resize(&image, self.options.width, self.options.height);
        Ok(Frame::from_image(fitted, 0))
    }

    fn render_frames(
        &mut self,
        base: &Frame,
        track: &CaptionTrack,
        motion: Option<MotionSpec>,
        frame_count: usize,
        logger: &mut dyn PipelineLogger,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let fps = self.options.fps;
        let duration = frame_count as f64 / fps;
        let style = &self.options.style;
        let mut cached: Option<(usize, Option<CaptionBitmap>)> = None;

        for i in 0..frame_count {
            let t = i as f64 / fps;
            let viewport = motion
                .map(|m| m.viewport_at(t, duration))
                .unwrap_or(Viewport::IDENTITY);
            let mut frame = render_viewport(base, viewport, i);

            if let (Some(renderer), Some(cue)) =
                (self.caption_renderer.as_mut(), track.cue_at(t))
            {
                let stale = cached.as_ref().map_or(true, |(key, _)| *key != cue.key);
                if stale {
                    cached = Some((cue.key, renderer.render(&cue.text, style)));
                }
                if let Some((_, Some(bitmap))) = &cached {
                    bitmap.overlay_centered(&mut frame, style.font_color, style.stroke_color);
                }
            }

            self.writer.write(&frame)?;
            logger.progress(i + 1, frame_count);
        }
        Ok(())
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
