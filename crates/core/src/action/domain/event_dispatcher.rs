use crate::classification::domain::mouth_state::TransitionEvent;

use super::action_target::{ActionTarget, TargetLocator};

/// Cached result of target resolution.
///
/// Stays `Unresolved` until a lookup succeeds; after that the target is
/// reused for the rest of the session and never looked up again.
enum TargetSlot {
    Unresolved,
    Resolved(Box<dyn ActionTarget>),
}

/// What [`EventDispatcher::dispatch`] did with one transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Opening transition; the target fired.
    Triggered,
    /// Opening transition; the target was found but its trigger failed.
    Failed,
    /// Opening transition; no target could be resolved.
    Skipped,
    /// Closing transition; nothing to fire.
    Observed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub triggered: usize,
    pub failed: usize,
    pub skipped: usize,
    pub observed: usize,
}

/// Forwards opening transitions to the external action target.
pub struct EventDispatcher {
    locator: Box<dyn TargetLocator>,
    slot: TargetSlot,
    stats: DispatchStats,
}

impl EventDispatcher {
    pub fn new(locator: Box<dyn TargetLocator>) -> Self {
        Self {
            locator,
            slot: TargetSlot::Unresolved,
            stats: DispatchStats::default(),
        }
    }

    /// Attempts resolution ahead of the first opening transition.
    ///
    /// Returns whether a target is now cached. Failure is not fatal: the
    /// next opening transition retries.
    pub fn prime(&mut self) -> bool {
        self.target().is_some()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.slot, TargetSlot::Resolved(_))
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn dispatch(&mut self, event: &TransitionEvent) -> DispatchOutcome {
        let outcome = if !event.is_opening() {
            DispatchOutcome::Observed
        } else {
            match self.target() {
                None => DispatchOutcome::Skipped,
                Some(target) => match target.trigger() {
                    Ok(()) => {
                        log::info!("Triggered {} on {event}", target.describe());
                        DispatchOutcome::Triggered
                    }
                    Err(e) => {
                        log::warn!("Trigger of {} failed: {e}", target.describe());
                        DispatchOutcome::Failed
                    }
                },
            }
        };

        match outcome {
            DispatchOutcome::Triggered => self.stats.triggered += 1,
            DispatchOutcome::Failed => self.stats.failed += 1,
            DispatchOutcome::Skipped => self.stats.skipped += 1,
            DispatchOutcome::Observed => self.stats.observed += 1,
        }
        outcome
    }

    /// The cached target, resolving it first if no lookup has succeeded yet.
    fn target(&mut self) -> Option<&mut Box<dyn ActionTarget>> {
        if let TargetSlot::Unresolved = self.slot {
            match self.locator.locate() {
                Ok(target) => {
                    log::info!("Resolved action target: {}", target.describe());
                    self.slot = TargetSlot::Resolved(target);
                }
                Err(e) => {
                    log::warn!("{e}; will retry on next open");
                    return None;
                }
            }
        }

        match &mut self.slot {
            TargetSlot::Resolved(target) => Some(target),
            TargetSlot::Unresolved => None,
        }
    }
}
