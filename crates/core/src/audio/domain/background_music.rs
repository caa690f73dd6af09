use super::audio_segment::AudioSegment;

/// Levels and fades applied when laying a music bed under narration.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundMusic {
    pub music_volume: f32,
    pub voiceover_volume: f32,
    pub fade_duration: f64,
}

impl Default for BackgroundMusic {
    fn default() -> Self {
        Self {
            music_volume: 0.15,
            voiceover_volume: 1.0,
            fade_duration: 1.0,
        }
    }
}

impl BackgroundMusic {
    /// Loops or trims `track` to exactly `duration` seconds, scales it to the
    /// music volume and fades both ends when the result is long enough.
    pub fn fit(&self, track: &AudioSegment, duration: f64) -> AudioSegment {
        let channels = track.channels().max(1) as usize;
        let rate = track.sample_rate();
        let target_frames = (duration.max(0.0) * rate as f64).round() as usize;
        let target_len = target_frames * channels;

        let source = track.samples();
        let samples: Vec<f32> = if source.is_empty() {
            vec![0.0; target_len]
        } else {
            source
                .iter()
                .cycle()
                .take(target_len)
                .map(|s| s * self.music_volume)
                .collect()
        };

        let mut fitted = AudioSegment::new(samples, rate, channels as u16);
        if self.fade_duration > 0.0 && duration > 2.0 * self.fade_duration {
            let fade_frames = (self.fade_duration * rate as f64).round() as usize;
            apply_fades(fitted.samples_mut(), channels, fade_frames);
        }
        fitted
    }

    /// Sums the scaled narration with a fitted music bed, clamped to
    /// [-1, 1]. The result always has the narration's length.
    pub fn mix(&self, voiceover: &AudioSegment, music: Option<&AudioSegment>) -> AudioSegment {
        let mut mixed = voiceover.clone();
        mixed.apply_gain(self.voiceover_volume);

        if let Some(music) = music {
            if music.sample_rate() != voiceover.sample_rate()
                || music.channels() != voiceover.channels()
            {
                log::warn!(
                    "Music format {} Hz/{}ch does not match narration {} Hz/{}ch, skipping music",
                    music.sample_rate(),
                    music.channels(),
                    voiceover.sample_rate(),
                    voiceover.channels()
                );
            } else {
                let bed = self.fit(music, voiceover.duration());
                for (out, m) in mixed.samples_mut().iter_mut().zip(bed.samples()) {
                    *out += m;
                }
            }
        }

        for s in mixed.samples_mut() {
            *s = s.clamp(-1.0, 1.0);
        }
        mixed
    }
}

fn apply_fades(samples: &mut [f32], channels: usize, fade_frames: usize) {
    let total_frames = samples.len() / channels;
    if fade_frames == 0 || total_frames == 0 {
        return;
    }
    for frame in 0..fade_frames.min(total_frames) {
        let gain = frame as f32 / fade_frames as f32;
        for c in 0..channels {
            samples[frame * channels + c] *= gain;
            samples[(total_frames - 1 - frame) * channels + c] *= gain;
        }
    }
}
