use super::caption_style::DisplayMode;
use super::word_event::WordEvent;

/// Text to draw at a given instant. `key` identifies the cue so a renderer
/// can reuse the bitmap across every frame that shows the same text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptionCue {
    pub key: usize,
    pub text: String,
}

/// Time-indexed view over a scene's word events.
pub struct CaptionTrack {
    events: Vec<WordEvent>,
    mode: DisplayMode,
    max_chars_per_line: usize,
}

impl CaptionTrack {
    pub fn new(mut events: Vec<WordEvent>, mode: DisplayMode, max_chars_per_line: usize) -> Self {
        events.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        Self {
            events,
            mode,
            max_chars_per_line: max_chars_per_line.max(1),
        }
    }

    pub fn events(&self) -> &[WordEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Caption visible at `t` seconds, or `None` when nothing is shown.
    pub fn cue_at(&self, t: f64) -> Option<CaptionCue> {
        match self.mode {
            DisplayMode::SingleWordPop => {
                let position = active_position(&self.events, t)?;
                Some(CaptionCue {
                    key: position,
                    text: self.events[position].word.clone(),
                })
            }
            DisplayMode::Progressive => {
                let shown = started_count(&self.events, t);
                if shown == 0 {
                    return None;
                }
                let sentence = self.events[..shown]
                    .iter()
                    .map(|e| e.word.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                Some(CaptionCue {
                    key: shown,
                    text: wrap_text(&sentence, self.max_chars_per_line),
                })
            }
        }
    }
}

/// The word whose window contains `t`, or `None` during gaps and outside
/// the schedule. `events` must be sorted and non-overlapping.
pub fn word_at(events: &[WordEvent], t: f64) -> Option<&WordEvent> {
    active_position(events, t).map(|i| &events[i])
}

fn started_count(events: &[WordEvent], t: f64) -> usize {
    events.partition_point(|e| e.start_time <= t)
}

fn active_position(events: &[WordEvent], t: f64) -> Option<usize> {
    let position = started_count(events, t).checked_sub(1)?;
    let event = &events[position];
    (event.contains(t) && !event.word.trim().is_empty()).then_some(position)
}

/// Greedy word wrap. Words longer than `max_chars` get a line to themselves.
pub fn wrap_text(text: &str, max_chars: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}
