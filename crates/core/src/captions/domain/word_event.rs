/// A single word's visible time window within a scene.
///
/// The word is on screen for `start_time <= t < end_time`.
#[derive(Clone, Debug, PartialEq)]
pub struct WordEvent {
    pub word: String,
    pub start_time: f64,
    pub end_time: f64,
    pub index: usize,
}

impl WordEvent {
    pub fn new(word: impl Into<String>, start_time: f64, end_time: f64, index: usize) -> Self {
        Self {
            word: word.into(),
            start_time,
            end_time,
            index,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start_time <= t && t < self.end_time
    }
}

/// Where a scene's caption timings came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimingSource {
    /// Word timestamps from a transcription service, validated against the
    /// expected text and reconciled to the audio duration.
    ExternalAligned,
    /// Timings computed from the word count and the configured per-word
    /// duration and gap.
    Synthesized,
}

/// Resolved caption schedule for one scene.
#[derive(Clone, Debug, PartialEq)]
pub struct WordTiming {
    pub events: Vec<WordEvent>,
    pub source: TimingSource,
}

impl WordTiming {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// End of the last event, or 0.0 when there are none.
    pub fn span(&self) -> f64 {
        self.events.last().map(|e| e.end_time).unwrap_or(0.0)
    }
}
