use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Adapts a scene still to the [`VideoReader`] interface.
///
/// Treats the image as a one-frame video with `fps=0` and `total_frames=1`.
/// Decoding goes through ffmpeg first, which is much faster for large JPEGs,
/// and falls back to the `image` crate for formats the linked ffmpeg build
/// lacks.
pub struct ImageFileReader {
    frame: Option<Frame>,
    metadata: Option<VideoMetadata>,
}

// Safety: ImageFileReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for ImageFileReader {}

impl ImageFileReader {
    pub fn new() -> Self {
        Self {
            frame: None,
            metadata: None,
        }
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

fn decode_single_frame(
    ictx: &mut ffmpeg_next::format::context::Input,
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    video_stream_index: usize,
) -> Result<Frame, Box<dyn std::error::Error>> {
    for (stream, packet) in ictx.packets() {
        if stream.index() != video_stream_index {
            continue;
        }
        decoder.send_packet(&packet)?;
        if let Some(frame) = try_receive_frame(decoder, scaler, width, height)? {
            return Ok(frame);
        }
    }

    // Flush decoder for formats that buffer the single frame
    let _ = decoder.send_eof();
    try_receive_frame(decoder, scaler, width, height)?
        .ok_or_else(|| "Failed to decode image".into())
}

fn try_receive_frame(
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
    let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
    if decoder.receive_frame(&mut decoded).is_ok() {
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&decoded, &mut rgb_frame)?;
        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        Ok(Some(Frame::new(pixels, width, height, 0)))
    } else {
        Ok(None)
    }
}

fn decode_with_ffmpeg(path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
    ffmpeg_next::init()?;

    let mut ictx = ffmpeg_next::format::input(path)?;

    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or("No image data found")?;

    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
    let mut decoder = codec_ctx.decoder().video()?;

    let width = decoder.width();
    let height = decoder.height();

    let mut scaler = ffmpeg_next::software::scaling::Context::get(
        decoder.format(),
        width,
        height,
        ffmpeg_next::format::Pixel::RGB24,
        width,
        height,
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )?;

    let video_stream_index = stream.index();
    decode_single_frame(
        &mut ictx,
        &mut decoder,
        &mut scaler,
        width,
        height,
        video_stream_index,
    )
}

fn decode_with_image_crate(path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
    let image = image::open(path)?.to_rgb8();
    Ok(Frame::from_image(image, 0))
}

impl VideoReader for ImageFileReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        if !path.is_file() {
            return Err(format!("Image not found: {}", path.display()).into());
        }
        let frame = decode_with_ffmpeg(path).or_else(|e| {
            log::debug!("ffmpeg could not decode {}: {e}", path.display());
            decode_with_image_crate(path)
        })?;

        let metadata = VideoMetadata {
            width: frame.width(),
            height: frame.height(),
            fps: 0.0,
            total_frames: 1,
            duration: 0.0,
            codec: String::new(),
            source_path: Some(path.to_path_buf()),
        };
        self.frame = Some(frame);
        self.metadata = Some(metadata.clone());
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        if self.frame.is_none() {
            return Box::new(std::iter::once(Err("ImageFileReader: not opened".into())));
        }
        Box::new(self.frame.take().into_iter().map(Ok))
    }

    fn close(&mut self) {
        self.frame = None;
        self.metadata = None;
    }
}
