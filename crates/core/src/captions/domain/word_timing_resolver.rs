use std::collections::HashSet;

use crate::audio::domain::transcript::TranscriptWord;
use crate::shared::constants::{
    MIN_WORD_DISPLAY_SECS, RECONCILE_TOLERANCE_SECS, TRANSCRIPT_MATCH_THRESHOLD,
};

use super::caption_style::DisplayMode;
use super::word_event::{TimingSource, WordEvent, WordTiming};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingConfig {
    /// Seconds each word stays visible when there is room for it.
    pub word_duration: f64,
    /// Blank seconds between consecutive words.
    pub gap: f64,
    pub display_mode: DisplayMode,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            word_duration: 0.6,
            gap: 0.1,
            display_mode: DisplayMode::SingleWordPop,
        }
    }
}

/// Turns spoken text plus optional transcription timestamps into a per-word
/// display schedule covering a scene's audio.
#[derive(Debug, Clone)]
pub struct WordTimingResolver {
    config: TimingConfig,
}

impl WordTimingResolver {
    pub fn new(config: TimingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TimingConfig {
        &self.config
    }

    /// Resolves the caption schedule for `text` spoken over `duration` seconds.
    ///
    /// External timestamps are used when they match the text well enough;
    /// otherwise (or when absent) timings are synthesized. Zero-length audio
    /// and empty text both yield an empty schedule.
    pub fn resolve(
        &self,
        text: &str,
        duration: f64,
        external: Option<&[TranscriptWord]>,
    ) -> WordTiming {
        if !(duration.is_finite() && duration > 0.0) {
            return WordTiming {
                events: Vec::new(),
                source: TimingSource::Synthesized,
            };
        }

        if let Some(words) = external {
            if transcript_matches(words, text) {
                let events = align_external(words, duration);
                if !events.is_empty() {
                    log::debug!("Using {} transcribed word timings", events.len());
                    return WordTiming {
                        events,
                        source: TimingSource::ExternalAligned,
                    };
                }
                log::warn!("Transcript has no usable word timings, synthesizing captions");
            } else {
                log::warn!("Transcript does not match voiceover text, synthesizing captions");
            }
        }

        WordTiming {
            events: self.synthesize(text, duration),
            source: TimingSource::Synthesized,
        }
    }

    /// Computes timings from word count alone.
    pub fn synthesize(&self, text: &str, duration: f64) -> Vec<WordEvent> {
        let words = split_words(text);
        if words.is_empty() || !(duration.is_finite() && duration > 0.0) {
            return Vec::new();
        }
        match self.config.display_mode {
            DisplayMode::SingleWordPop => self.single_word_pop(&words, duration),
            DisplayMode::Progressive => equal_distribution(&words, duration),
        }
    }

    fn single_word_pop(&self, words: &[&str], duration: f64) -> Vec<WordEvent> {
        let count = words.len() as f64;
        let gap = self.config.gap;
        let needed = count * (self.config.word_duration + gap);

        if needed > duration {
            // Compressed onto a uniform grid. The visible floor never exceeds
            // the slot, so words cannot overlap, and the last word holds
            // until the end of the scene.
            let slot = duration / count;
            let visible = (slot - gap).max(MIN_WORD_DISPLAY_SECS).min(slot);
            let last = words.len() - 1;
            return words
                .iter()
                .enumerate()
                .map(|(i, word)| {
                    let start = i as f64 * slot;
                    let end = if i == last { duration } else { start + visible };
                    WordEvent::new(*word, start, end, i)
                })
                .collect();
        }

        let mut events = Vec::with_capacity(words.len());
        let mut start = 0.0;
        for (i, word) in words.iter().enumerate() {
            let end = start + self.config.word_duration;
            events.push(WordEvent::new(*word, start, end, i));
            start = end + gap;
        }
        events
    }
}

fn equal_distribution(words: &[&str], duration: f64) -> Vec<WordEvent> {
    let slot = duration / words.len() as f64;
    let last = words.len() - 1;
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let end = if i == last {
                duration
            } else {
                (i + 1) as f64 * slot
            };
            WordEvent::new(*word, i as f64 * slot, end, i)
        })
        .collect()
}

/// Whitespace-delimited words with attached punctuation preserved.
pub fn split_words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Lower-cased tokens with every non-alphanumeric character removed.
pub fn normalize_tokens(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Fraction of the expected words that appear anywhere in the transcript.
pub fn transcript_similarity(transcript: &[TranscriptWord], expected_text: &str) -> f64 {
    let expected = normalize_tokens(expected_text);
    if expected.is_empty() || transcript.is_empty() {
        return 0.0;
    }
    let heard: HashSet<String> = transcript
        .iter()
        .flat_map(|w| normalize_tokens(&w.word))
        .collect();
    let matching = expected.iter().filter(|w| heard.contains(*w)).count();
    matching as f64 / expected.len() as f64
}

pub fn transcript_matches(transcript: &[TranscriptWord], expected_text: &str) -> bool {
    let similarity = transcript_similarity(transcript, expected_text);
    log::debug!("Transcript similarity {similarity:.2}");
    similarity >= TRANSCRIPT_MATCH_THRESHOLD
}

/// Uniformly rescales timings whose measured span is off from `target` by
/// at least the reconciliation tolerance. Smaller differences are left alone.
pub fn reconcile_duration(mut events: Vec<WordEvent>, target: f64) -> Vec<WordEvent> {
    let measured = events.iter().map(|e| e.end_time).fold(0.0, f64::max);
    if measured <= 0.0 || (measured - target).abs() < RECONCILE_TOLERANCE_SECS {
        return events;
    }
    let scale = target / measured;
    log::debug!("Rescaling word timings {measured:.2}s -> {target:.2}s (x{scale:.3})");
    for event in &mut events {
        event.start_time *= scale;
        event.end_time *= scale;
    }
    events
}

/// Converts transcript words into non-overlapping events inside
/// `[0, duration]`, reconciled to the audio duration.
fn align_external(words: &[TranscriptWord], duration: f64) -> Vec<WordEvent> {
    let mut events: Vec<WordEvent> = words
        .iter()
        .filter(|w| w.is_usable())
        .map(|w| WordEvent::new(w.text(), w.start_time, w.end_time, 0))
        .collect();
    events.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let mut events = reconcile_duration(events, duration);

    for i in 0..events.len() {
        let next_start = events.get(i + 1).map(|n| n.start_time);
        let event = &mut events[i];
        event.start_time = event.start_time.clamp(0.0, duration);
        event.end_time = event.end_time.min(duration);
        if let Some(next_start) = next_start {
            event.end_time = event.end_time.min(next_start);
        }
    }
    events.retain(|e| e.end_time > e.start_time);
    for (i, event) in events.iter_mut().enumerate() {
        event.index = i;
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn resolver() -> WordTimingResolver {
        WordTimingResolver::new(TimingConfig::default())
    }

    fn heard(words: &[&str]) -> Vec<TranscriptWord> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| TranscriptWord {
                word: w.to_string(),
                start_time: i as f64 * 0.5,
                end_time: i as f64 * 0.5 + 0.4,
                confidence: 0.9,
            })
            .collect()
    }

    fn assert_non_overlapping(events: &[WordEvent]) {
        for pair in events.windows(2) {
            assert!(
                pair[0].end_time <= pair[1].start_time + 1e-9,
                "{:?} overlaps {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    // ── Tokenizing ──────────────────────────────────────────────────

    #[test]
    fn test_split_words_keeps_punctuation() {
        assert_eq!(
            split_words("  Love, warmth,\tconnection—it   all. "),
            vec!["Love,", "warmth,", "connection—it", "all."]
        );
    }

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(
            normalize_tokens("Maybe feeling wasn't programmed—but"),
            vec!["maybe", "feeling", "wasnt", "programmedbut"]
        );
    }

    // ── Synthesized timing ──────────────────────────────────────────

    #[test]
    fn test_synthesized_has_one_event_per_word_in_order() {
        let events = resolver().synthesize("He was built to serve", 10.0);
        assert_eq!(events.len(), 5);
        for (i, e) in events.iter().enumerate() {
            assert_eq!(e.index, i);
            assert!(e.end_time > e.start_time);
        }
        assert_non_overlapping(&events);
        assert_eq!(events[0].start_time, 0.0);
    }

    #[test]
    fn test_uncompressed_uses_configured_duration() {
        // 5 words * (0.6 + 0.1) = 3.5s fits in 10s
        let events = resolver().synthesize("He was built to serve", 10.0);
        for e in &events {
            assert_relative_eq!(e.duration(), 0.6, epsilon = 1e-9);
        }
        assert_relative_eq!(events[1].start_time, 0.7, epsilon = 1e-9);
        assert!(events.last().unwrap().end_time <= 10.0);
    }

    #[test]
    fn test_compressed_spans_exactly_the_duration() {
        // 10 words * 0.7 = 7s does not fit in 4s
        let text = "one two three four five six seven eight nine ten";
        let events = resolver().synthesize(text, 4.0);
        assert_eq!(events.len(), 10);
        assert_eq!(events[0].start_time, 0.0);
        assert_relative_eq!(events.last().unwrap().end_time, 4.0);
        for e in &events {
            assert!(e.duration() >= MIN_WORD_DISPLAY_SECS - 1e-9);
        }
        assert_non_overlapping(&events);
    }

    #[test]
    fn test_compressed_floor_applies_when_gap_eats_slot() {
        // slot = 0.35, slot - gap = 0.25 < 0.3 floor
        let text = "a b c d e f g h i j";
        let events = resolver().synthesize(text, 3.5);
        assert_relative_eq!(events[0].duration(), 0.3, epsilon = 1e-9);
        assert_relative_eq!(events[1].start_time, 0.35, epsilon = 1e-9);
        assert_relative_eq!(events.last().unwrap().end_time, 3.5);
        assert_non_overlapping(&events);
    }

    #[test]
    fn test_compressed_never_overflows_when_floor_cannot_hold() {
        // 20 words in 2s: slot 0.1 < floor 0.3
        let text = vec!["w"; 20].join(" ");
        let events = resolver().synthesize(&text, 2.0);
        assert_eq!(events.len(), 20);
        assert_relative_eq!(events.last().unwrap().end_time, 2.0);
        assert_non_overlapping(&events);
    }

    #[rstest]
    #[case::empty("")]
    #[case::whitespace_only("   \n\t ")]
    fn test_no_words_yields_no_events(#[case] text: &str) {
        assert!(resolver().synthesize(text, 3.0).is_empty());
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-1.0)]
    #[case::nan(f64::NAN)]
    fn test_degenerate_duration_yields_empty_timing(#[case] duration: f64) {
        let timing = resolver().resolve("some words", duration, None);
        assert!(timing.is_empty());
    }

    #[test]
    fn test_progressive_mode_distributes_equally() {
        let r = WordTimingResolver::new(TimingConfig {
            display_mode: DisplayMode::Progressive,
            ..TimingConfig::default()
        });
        let events = r.synthesize("a b c d", 2.0);
        assert_relative_eq!(events[1].start_time, 0.5);
        assert_relative_eq!(events[1].end_time, 1.0);
        assert_relative_eq!(events[3].end_time, 2.0);
    }

    // ── Transcript validation ───────────────────────────────────────

    #[test]
    fn test_validation_passes_at_threshold() {
        // 4 of 6 expected words heard (0.67)
        let words = heard(&["connection", "it", "all", "seems"]);
        assert!(transcript_matches(
            &words,
            "connection it all seemed so distant"
        ));
    }

    #[test]
    fn test_validation_fails_below_threshold() {
        // 3 of 6 expected words heard (0.5)
        let words = heard(&["connection", "it", "all"]);
        assert!(!transcript_matches(
            &words,
            "connection it all seemed so distant"
        ));
    }

    #[test]
    fn test_validation_ignores_punctuation_in_transcript() {
        let words = heard(&["Connection,", "it", "ALL", "seemed", "so", "distant."]);
        assert_relative_eq!(
            transcript_similarity(&words, "connection it all seemed so distant"),
            1.0
        );
    }

    #[test]
    fn test_validation_empty_transcript_fails() {
        assert!(!transcript_matches(&[], "anything"));
    }

    // ── Reconciliation ──────────────────────────────────────────────

    #[test]
    fn test_reconcile_within_tolerance_is_unchanged() {
        let events = vec![
            WordEvent::new("a", 0.0, 1.0, 0),
            WordEvent::new("b", 1.2, 2.8, 1),
        ];
        let out = reconcile_duration(events.clone(), 3.0);
        assert_eq!(out, events);
    }

    #[test]
    fn test_reconcile_scales_uniformly() {
        let events = vec![
            WordEvent::new("a", 0.0, 1.0, 0),
            WordEvent::new("b", 1.0, 2.0, 1),
        ];
        let out = reconcile_duration(events, 4.0);
        assert_relative_eq!(out[0].end_time, 2.0);
        assert_relative_eq!(out[1].start_time, 2.0);
        assert_relative_eq!(out[1].end_time, 4.0);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let events = vec![WordEvent::new("a", 0.0, 2.0, 0)];
        let once = reconcile_duration(events, 5.0);
        let twice = reconcile_duration(once.clone(), 5.0);
        assert_eq!(once, twice);
    }

    // ── Resolve ─────────────────────────────────────────────────────

    #[test]
    fn test_resolve_prefers_matching_transcript() {
        let words = heard(&["he", "was", "built", "to", "serve"]);
        let timing = resolver().resolve("He was built to serve", 2.4, Some(&words));
        assert_eq!(timing.source, TimingSource::ExternalAligned);
        assert_eq!(timing.events.len(), 5);
        assert_eq!(timing.events[0].word, "he");
        assert!(timing.span() <= 2.4);
    }

    #[test]
    fn test_resolve_rescales_transcript_to_audio() {
        // Transcript ends at 2.4s, audio is 4.8s
        let words = heard(&["he", "was", "built", "to", "serve"]);
        let timing = resolver().resolve("He was built to serve", 4.8, Some(&words));
        assert_relative_eq!(timing.span(), 4.8, epsilon = 1e-9);
        assert_relative_eq!(timing.events[1].start_time, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_resolve_falls_back_on_mismatch() {
        let words = heard(&["completely", "different", "speech"]);
        let timing = resolver().resolve("He was built to serve", 5.0, Some(&words));
        assert_eq!(timing.source, TimingSource::Synthesized);
        assert_eq!(timing.events[0].word, "He");
    }

    #[test]
    fn test_resolve_sanitizes_overlapping_transcript() {
        let words = vec![
            TranscriptWord {
                word: " serve".to_string(),
                start_time: 1.0,
                end_time: 1.6,
                confidence: 0.8,
            },
            TranscriptWord {
                word: "to".to_string(),
                start_time: 0.5,
                end_time: 1.2,
                confidence: 0.8,
            },
            TranscriptWord {
                word: "  ".to_string(),
                start_time: 1.6,
                end_time: 1.7,
                confidence: 0.1,
            },
        ];
        let timing = resolver().resolve("to serve", 1.8, Some(&words));
        assert_eq!(timing.source, TimingSource::ExternalAligned);
        assert_eq!(timing.events.len(), 2);
        assert_eq!(timing.events[0].word, "to");
        assert_eq!(timing.events[1].word, "serve");
        assert_eq!(timing.events[1].index, 1);
        assert_non_overlapping(&timing.events);
    }
}
