use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for pipeline orchestration events.
///
/// Decouples use cases from specific output mechanisms (stdout, log crate,
/// test capture) so each caller can observe a render without changing the
/// orchestration code.
pub trait PipelineLogger: Send {
    /// A scene (zero-based `index` of `total`) is about to be rendered.
    fn scene(&mut self, index: usize, total: usize);

    /// Report frame-level progress within the current scene.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. caption words, clip duration).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn scene(&mut self, _index: usize, _total: usize) {}
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger that tracks per-stage timing and metrics and prints
/// a summary report when the video is finished.
///
/// Frame progress is throttled to every `throttle_frames` frames.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    scene_index: usize,
    scene_total: usize,
    scenes_started: usize,
    rendered_frames: usize,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            scene_index: 0,
            scene_total: 0,
            scenes_started: 0,
            rendered_frames: 0,
            messages: Vec::new(),
        }
    }

    /// Frames of every scene that finished rendering.
    pub fn rendered_frames(&self) -> usize {
        self.rendered_frames
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.rendered_frames;
        let mut lines = Vec::new();

        lines.push(format!(
            "Render summary ({} scenes, {frames} frames, {:.1}s total):",
            self.scenes_started,
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = if durations.is_empty() {
                0.0
            } else {
                total_ms / durations.len() as f64
            };
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:8.1}ms  total {total_ms:8.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let avg = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            lines.push(format!("  {name}: avg {avg:.1}"));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn scene(&mut self, index: usize, total: usize) {
        self.scene_index = index;
        self.scene_total = total;
        self.scenes_started += 1;
        log::info!("Rendering scene {}/{total}", index + 1);
    }

    fn progress(&mut self, current: usize, total: usize) {
        if total == 0 {
            return;
        }
        if current % self.throttle_frames == 0 || current == total {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!(
                "Scene {}/{}: {current}/{total} frames ({pct:.1}%)",
                self.scene_index + 1,
                self.scene_total.max(1)
            );
        }
        if current == total {
            self.rendered_frames += total;
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
