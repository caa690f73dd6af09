/// One recognized word with its position in the narration, in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptWord {
    pub word: String,
    pub start_time: f64,
    pub end_time: f64,
    pub confidence: f32,
}

impl TranscriptWord {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// The word with surrounding whitespace removed. Recognizers usually
    /// emit a leading space.
    pub fn text(&self) -> &str {
        self.word.trim()
    }

    /// Finite, forward-running timestamps and some visible text.
    pub fn is_usable(&self) -> bool {
        self.start_time.is_finite()
            && self.end_time.is_finite()
            && self.end_time > self.start_time
            && !self.text().is_empty()
    }
}
