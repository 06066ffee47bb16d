use std::collections::HashMap;
use std::time::Instant;

use crate::classification::domain::mouth_state::TransitionEvent;
use crate::shared::degraded_frame::DegradedFrame;

/// Cross-cutting logger for producer-side session events.
///
/// Lets the frame pipeline report what it sees without committing to one
/// output mechanism.
pub trait SessionLogger: Send {
    /// Report how many frames have been read so far.
    fn progress(&mut self, frames: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a frame that could not be classified.
    fn degraded(&mut self, reason: &DegradedFrame);

    /// Record a committed state change.
    fn transition(&mut self, event: &TransitionEvent);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn progress(&mut self, _frames: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn degraded(&mut self, _reason: &DegradedFrame) {}
    fn transition(&mut self, _event: &TransitionEvent) {}
}

/// CLI logger: per-stage timings, degraded-frame tallies and transition
/// counts, with a summary at the end of the session.
///
/// Progress output is throttled to every `throttle_frames` frames.
pub struct StdoutSessionLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    degraded: HashMap<&'static str, usize>,
    openings: usize,
    closings: usize,
    frames: usize,
    start_time: Instant,
}

impl StdoutSessionLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            degraded: HashMap::new(),
            openings: 0,
            closings: 0,
            frames: 0,
            start_time: Instant::now(),
        }
    }

    /// Returns the formatted summary, or `None` if no frame was seen.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Session summary ({} frames, {:.1}s total):",
            self.frames,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            lines.push(format!("  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms"));
        }

        lines.push(format!(
            "  Transitions: {} open, {} close",
            self.openings, self.closings
        ));

        let mut kinds: Vec<_> = self.degraded.iter().collect();
        kinds.sort();
        for (kind, count) in kinds {
            lines.push(format!("  Degraded {kind}: {count}"));
        }

        if elapsed_ms > 0.0 {
            let fps = self.frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn degraded_count(&self, kind: &str) -> usize {
        self.degraded.get(kind).copied().unwrap_or(0)
    }
}

impl Default for StdoutSessionLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl SessionLogger for StdoutSessionLogger {
    fn progress(&mut self, frames: usize) {
        self.frames = frames;
        if frames % self.throttle_frames == 0 {
            log::info!("Processed {frames} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn degraded(&mut self, reason: &DegradedFrame) {
        *self.degraded.entry(reason.kind()).or_default() += 1;
    }

    fn transition(&mut self, event: &TransitionEvent) {
        if event.is_opening() {
            self.openings += 1;
        } else {
            self.closings += 1;
        }
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
