/// A segment of decoded audio: interleaved PCM samples normalized to [-1.0, 1.0].
///
/// Scene soundtracks are mono; the channel count is kept for decoded input.
#[derive(Clone, Debug)]
pub struct AudioSegment {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioSegment {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Silence lasting `duration` seconds.
    pub fn silence(duration: f64, sample_rate: u32, channels: u16) -> Self {
        let mut seg = Self::new(Vec::new(), sample_rate, channels);
        seg.fit_to_duration(duration);
        seg
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Pads with silence or truncates so the segment lasts `duration` seconds,
    /// rounded to whole sample frames.
    pub fn fit_to_duration(&mut self, duration: f64) {
        let frames = (duration.max(0.0) * self.sample_rate as f64).round() as usize;
        self.samples.resize(frames * self.channels as usize, 0.0);
    }

    pub fn apply_gain(&mut self, gain: f32) {
        if gain == 1.0 {
            return;
        }
        for s in &mut self.samples {
            *s *= gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_segment_with_correct_fields() {
        let samples = vec![0.0f32; 16000];
        let seg = AudioSegment::new(samples.clone(), 16000, 1);
        assert_eq!(seg.samples(), &samples[..]);
        assert_eq!(seg.sample_rate(), 16000);
        assert_eq!(seg.channels(), 1);
    }

    #[test]
    fn test_duration_mono() {
        let seg = AudioSegment::new(vec![0.0; 48000], 16000, 1);
        assert_eq!(seg.duration(), 3.0);
    }

    #[test]
    fn test_duration_stereo() {
        let seg = AudioSegment::new(vec![0.0; 96000], 48000, 2);
        assert_eq!(seg.duration(), 1.0);
    }

    #[test]
    fn test_fit_to_duration_pads_with_silence() {
        let mut seg = AudioSegment::new(vec![0.5; 100], 1000, 1);
        seg.fit_to_duration(0.25);
        assert_eq!(seg.samples().len(), 250);
        assert_eq!(seg.samples()[99], 0.5);
        assert_eq!(seg.samples()[100], 0.0);
    }

    #[test]
    fn test_fit_to_duration_truncates_whole_frames() {
        let mut seg = AudioSegment::new(vec![0.1; 400], 100, 2);
        seg.fit_to_duration(1.5);
        assert_eq!(seg.samples().len(), 300);
        assert_eq!(seg.duration(), 1.5);
    }

    #[test]
    fn test_silence() {
        let seg = AudioSegment::silence(0.5, 16000, 1);
        assert_eq!(seg.samples().len(), 8000);
        assert!(seg.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_apply_gain() {
        let mut seg = AudioSegment::new(vec![0.5, -0.5], 16000, 1);
        seg.apply_gain(0.5);
        assert_eq!(seg.samples(), &[0.25, -0.25]);
    }

    #[test]
    fn test_samples_mut() {
        let mut seg = AudioSegment::new(vec![0.0; 100], 16000, 1);
        seg.samples_mut()[50] = 1.0;
        assert_eq!(seg.samples()[50], 1.0);
    }
}
