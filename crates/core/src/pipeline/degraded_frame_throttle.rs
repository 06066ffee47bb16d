use std::time::{Duration, Instant};

/// Rate limit for degraded-frame diagnostics.
///
/// Allows at most one warning per `interval`. Occurrences that fall inside
/// the quiet period are counted and handed back with the next allowed one.
#[derive(Debug)]
pub struct DegradedFrameThrottle {
    interval: Duration,
    last_emitted: Option<Instant>,
    suppressed: usize,
}

impl DegradedFrameThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emitted: None,
            suppressed: 0,
        }
    }

    /// Records one degraded frame seen at `now`.
    ///
    /// Returns `Some(suppressed)` when a warning should be emitted, where
    /// `suppressed` is the number of occurrences swallowed since the last one.
    pub fn record(&mut self, now: Instant) -> Option<usize> {
        let due = match self.last_emitted {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if !due {
            self.suppressed += 1;
            return None;
        }
        self.last_emitted = Some(now);
        Some(std::mem::take(&mut self.suppressed))
    }
}
