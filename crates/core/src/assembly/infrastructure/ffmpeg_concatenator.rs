use std::path::{Path, PathBuf};

use crate::assembly::domain::clip_concatenator::ClipConcatenator;

/// Stream-copies scene clips into one MP4 with ffmpeg-next.
///
/// Packets are not re-encoded. Each clip's timestamps are shifted by the
/// accumulated end time of the video streams before it, so scene `i + 1`
/// starts on the frame after scene `i` ends.
pub struct FfmpegConcatenator;

impl ClipConcatenator for FfmpegConcatenator {
    fn concatenate(
        &self,
        clips: &[PathBuf],
        output: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        let first = clips.first().ok_or("No clips to concatenate")?;

        let template = ffmpeg_next::format::input(first)?;
        let mut octx = ffmpeg_next::format::output(output)?;

        // Input stream index -> output stream index, for video and audio only
        let mut stream_map: Vec<Option<usize>> = Vec::new();
        let mut media: Vec<ffmpeg_next::media::Type> = Vec::new();
        for ist in template.streams() {
            let medium = ist.parameters().medium();
            if medium != ffmpeg_next::media::Type::Video
                && medium != ffmpeg_next::media::Type::Audio
            {
                stream_map.push(None);
                continue;
            }
            let mut ost = octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
            ost.set_parameters(ist.parameters());
            unsafe {
                (*ost.parameters().as_mut_ptr()).codec_tag = 0;
            }
            stream_map.push(Some(ost.index()));
            media.push(medium);
        }
        drop(template);

        if !media.contains(&ffmpeg_next::media::Type::Video) {
            return Err(format!("{} has no video stream", first.display()).into());
        }

        octx.write_header()?;
        let out_time_bases: Vec<ffmpeg_next::Rational> =
            octx.streams().map(|s| s.time_base()).collect();
        let mut last_dts: Vec<Option<i64>> = vec![None; out_time_bases.len()];

        let mut offset = 0.0;
        for clip in clips {
            let clip_length = append_clip(
                clip,
                &mut octx,
                &stream_map,
                &out_time_bases,
                &mut last_dts,
                offset,
            )?;
            log::debug!(
                "Appended {} at {offset:.3}s ({clip_length:.3}s)",
                clip.display()
            );
            offset += clip_length;
        }

        octx.write_trailer()?;
        log::info!(
            "Concatenated {} clips into {} ({offset:.2}s)",
            clips.len(),
            output.display()
        );
        Ok(())
    }
}

/// Copies every packet of `clip` shifted by `offset` seconds and returns the
/// clip's video length in seconds.
fn append_clip(
    clip: &Path,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_map: &[Option<usize>],
    out_time_bases: &[ffmpeg_next::Rational],
    last_dts: &mut [Option<i64>],
    offset: f64,
) -> Result<f64, Box<dyn std::error::Error>> {
    let mut ictx = ffmpeg_next::format::input(clip)?;
    if ictx.nb_streams() as usize != stream_map.len() {
        return Err(format!(
            "{} has {} streams, expected {}",
            clip.display(),
            ictx.nb_streams(),
            stream_map.len()
        )
        .into());
    }

    let in_info: Vec<(ffmpeg_next::Rational, bool, f64)> = ictx
        .streams()
        .map(|s| {
            let is_video = s.parameters().medium() == ffmpeg_next::media::Type::Video;
            let rate = s.rate();
            let frame_secs = if rate.numerator() > 0 {
                rate.denominator() as f64 / rate.numerator() as f64
            } else {
                0.0
            };
            (s.time_base(), is_video, frame_secs)
        })
        .collect();

    let mut video_end: f64 = 0.0;
    for (stream, mut packet) in ictx.packets() {
        let src = stream.index();
        let Some(dst) = stream_map.get(src).copied().flatten() else {
            continue;
        };
        let (in_tb, is_video, frame_secs) = in_info[src];
        let out_tb = out_time_bases[dst];

        if is_video {
            if let Some(pts) = packet.pts() {
                let start = seconds(pts, in_tb);
                let length = if packet.duration() > 0 {
                    seconds(packet.duration(), in_tb)
                } else {
                    frame_secs
                };
                video_end = video_end.max(start + length);
            }
        }

        packet.rescale_ts(in_tb, out_tb);
        let shift = ticks(offset, out_tb);
        let pts = packet.pts().map(|p| p + shift);
        let mut dts = packet.dts().map(|d| d + shift);

        // Muxers reject non-increasing dts across the clip boundary
        if let (Some(d), Some(prev)) = (dts, last_dts[dst]) {
            if d <= prev {
                dts = Some(prev + 1);
            }
        }
        let pts = match (pts, dts) {
            (Some(p), Some(d)) if p < d => Some(d),
            _ => pts,
        };
        if dts.is_some() {
            last_dts[dst] = dts;
        }

        packet.set_pts(pts);
        packet.set_dts(dts);
        packet.set_position(-1);
        packet.set_stream(dst);
        packet.write_interleaved(octx)?;
    }

    if video_end <= 0.0 && ictx.duration() > 0 {
        video_end = ictx.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE);
    }
    Ok(video_end)
}

fn seconds(ts: i64, time_base: ffmpeg_next::Rational) -> f64 {
    ts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

fn ticks(secs: f64, time_base: ffmpeg_next::Rational) -> i64 {
    if time_base.numerator() == 0 {
        return 0;
    }
    (secs * time_base.denominator() as f64 / time_base.numerator() as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::audio_segment::AudioSegment;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::audio_writer::AudioWriter;
    use crate::video::domain::video_reader::VideoReader;
    use crate::video::domain::video_writer::VideoWriter;
    use crate::video::infrastructure::ffmpeg_audio_writer::FfmpegAudioWriter;
    use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
    use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;
    use approx::assert_relative_eq;

    fn scene_clip(path: &Path, frames: usize, shade: u8) {
        let mut writer = FfmpegWriter::new();
        writer
            .open(path, &VideoMetadata::for_output(64, 64, 10.0))
            .unwrap();
        for i in 0..frames {
            writer
                .write(&Frame::new(vec![shade; 64 * 64 * 3], 64, 64, i))
                .unwrap();
        }
        writer.close().unwrap();
        let audio = AudioSegment::silence(frames as f64 / 10.0, 44100, 1);
        FfmpegAudioWriter.write_audio(path, &audio).unwrap();
    }

    #[test]
    fn test_concatenated_duration_is_sum_of_clips() {
        let dir = tempfile::tempdir().unwrap();
        let clips: Vec<PathBuf> = (0..3)
            .map(|i| {
                let path = dir.path().join(format!("scene_{i}.mp4"));
                scene_clip(&path, 10, 60 * i as u8);
                path
            })
            .collect();
        let output = dir.path().join("final.mp4");

        FfmpegConcatenator.concatenate(&clips, &output).unwrap();

        let mut reader = FfmpegReader::new();
        let meta = reader.open(&output).unwrap();
        assert_eq!((meta.width, meta.height), (64, 64));
        assert_relative_eq!(meta.duration, 3.0, epsilon = 0.15);
        let frames: Vec<_> = reader.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 30);
    }

    #[test]
    fn test_scenes_stay_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let dark = dir.path().join("dark.mp4");
        let bright = dir.path().join("bright.mp4");
        scene_clip(&dark, 5, 20);
        scene_clip(&bright, 5, 230);
        let output = dir.path().join("final.mp4");

        FfmpegConcatenator
            .concatenate(&[dark, bright], &output)
            .unwrap();

        let mut reader = FfmpegReader::new();
        reader.open(&output).unwrap();
        let frames: Vec<_> = reader.frames().map(|f| f.unwrap()).collect();
        assert!(frames[2].pixel(32, 32)[0] < 100);
        assert!(frames[7].pixel(32, 32)[0] > 150);
    }

    #[test]
    fn test_empty_clip_list_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FfmpegConcatenator.concatenate(&[], &dir.path().join("out.mp4"));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_clip_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FfmpegConcatenator.concatenate(
            &[dir.path().join("missing.mp4")],
            &dir.path().join("out.mp4"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_ticks_and_seconds_convert() {
        let tb = ffmpeg_next::Rational(1, 90000);
        assert_eq!(ticks(1.5, tb), 135000);
        assert_relative_eq!(seconds(135000, tb), 1.5);
    }
}
