use crate::shared::constants::DEFAULT_MAR_THRESHOLD;

use super::mouth_state::{MouthState, TransitionEvent};

/// Classification tunables.
///
/// With the defaults (`hysteresis = 0`, `dwell_frames = 1`) the machine is a
/// plain single-threshold edge detector: `Open` iff `MAR > threshold`, and
/// every change of classification is committed on the frame it is seen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassifierConfig {
    pub threshold: f64,
    /// Once open, the ratio must fall to `threshold - hysteresis` to close.
    pub hysteresis: f64,
    /// Consecutive classified frames a new state must hold before it is committed.
    pub dwell_frames: u32,
}

impl ClassifierConfig {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            hysteresis: 0.0,
            dwell_frames: 1,
        }
    }

    pub fn with_hysteresis(mut self, hysteresis: f64) -> Self {
        self.hysteresis = hysteresis;
        self
    }

    pub fn with_dwell_frames(mut self, dwell_frames: u32) -> Self {
        self.dwell_frames = dwell_frames.max(1);
        self
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAR_THRESHOLD)
    }
}

/// Two-state OPEN/CLOSED machine fed one aspect ratio per classified frame.
///
/// Owns the persisted mouth state for one tracked subject. Degraded frames
/// are simply not fed in, so they cannot change the state or the pending
/// dwell count.
pub struct MouthStateMachine {
    config: ClassifierConfig,
    state: MouthState,
    /// Candidate state and how many consecutive frames it has been seen.
    pending: Option<(MouthState, u32)>,
}

impl MouthStateMachine {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            state: MouthState::Closed,
            pending: None,
        }
    }

    pub fn state(&self) -> MouthState {
        self.state
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classification of `ratio` relative to the current state.
    pub fn classify(&self, ratio: f64) -> MouthState {
        match self.state {
            MouthState::Closed if ratio > self.config.threshold => MouthState::Open,
            MouthState::Open if ratio <= self.config.threshold - self.config.hysteresis => {
                MouthState::Closed
            }
            current => current,
        }
    }

    /// Feeds one frame's ratio; returns the transition if the state changed.
    pub fn observe(&mut self, frame_index: usize, ratio: f64) -> Option<TransitionEvent> {
        let candidate = self.classify(ratio);
        if candidate == self.state {
            self.pending = None;
            return None;
        }

        let seen = match self.pending {
            Some((pending, count)) if pending == candidate => count + 1,
            _ => 1,
        };
        if seen < self.config.dwell_frames {
            self.pending = Some((candidate, seen));
            return None;
        }

        self.pending = None;
        let from = self.state;
        self.state = candidate;
        Some(TransitionEvent {
            from,
            to: candidate,
            frame_index,
            ratio,
        })
    }
}

impl Default for MouthStateMachine {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use super::MouthState::{Closed, Open};

    /// Feeds `ratios` in order and returns the (from, to) pairs emitted.
    fn run(machine: &mut MouthStateMachine, ratios: &[f64]) -> Vec<(MouthState, MouthState)> {
        ratios
            .iter()
            .enumerate()
            .filter_map(|(i, &r)| machine.observe(i, r))
            .map(|e| (e.from, e.to))
            .collect()
    }

    #[test]
    fn test_starts_closed() {
        assert_eq!(MouthStateMachine::default().state(), Closed);
    }

    #[test]
    fn test_all_below_threshold_never_fires() {
        let mut machine = MouthStateMachine::default();
        let events = run(&mut machine, &[0.2, 0.9, 1.49, 1.5, 0.0, 1.1]);
        assert!(events.is_empty());
        assert_eq!(machine.state(), Closed);
    }

    #[test]
    fn test_single_crossing_fires_once() {
        let mut machine = MouthStateMachine::default();
        let events = run(&mut machine, &[1.0, 1.2, 1.7, 1.8, 2.5, 1.6, 1.9, 3.0]);
        assert_eq!(events, vec![(Closed, Open)]);
        assert_eq!(machine.state(), Open);
    }

    #[test]
    fn test_threshold_itself_counts_as_closed() {
        let mut machine = MouthStateMachine::default();
        assert!(run(&mut machine, &[1.5]).is_empty());
        assert_eq!(run(&mut machine, &[1.500001]), vec![(Closed, Open)]);
        assert_eq!(run(&mut machine, &[1.5]), vec![(Open, Closed)]);
    }

    #[test]
    fn test_oscillation_starting_below_threshold() {
        let mut machine = MouthStateMachine::new(ClassifierConfig::new(1.5));
        let events = run(&mut machine, &[1.0, 1.6, 1.0, 1.6]);
        // The leading 1.0 matches the initial CLOSED state and is absorbed.
        assert_eq!(events, vec![(Closed, Open), (Open, Closed), (Closed, Open)]);
    }

    #[test]
    fn test_oscillation_fires_on_every_crossing() {
        let mut machine = MouthStateMachine::new(ClassifierConfig::new(1.5));
        let events = run(&mut machine, &[1.6, 1.0, 1.6, 1.0]);
        assert_eq!(
            events,
            vec![(Closed, Open), (Open, Closed), (Closed, Open), (Open, Closed)]
        );
    }

    #[test]
    fn test_event_carries_frame_and_ratio() {
        let mut machine = MouthStateMachine::default();
        assert!(machine.observe(3, 0.4).is_none());
        let event = machine.observe(4, 1.75).unwrap();
        assert_eq!(event.frame_index, 4);
        assert_eq!(event.ratio, 1.75);
        assert!(event.is_opening());
    }

    #[test]
    fn test_independent_machines_do_not_share_state() {
        let mut a = MouthStateMachine::default();
        let b = MouthStateMachine::default();
        a.observe(0, 2.0);
        assert_eq!(a.state(), Open);
        assert_eq!(b.state(), Closed);
    }

    // ── hysteresis ──────────────────────────────────────────────────

    #[rstest]
    #[case::inside_band(1.3, Open)]
    #[case::at_band_edge(1.2, Closed)]
    #[case::below_band(0.5, Closed)]
    fn test_hysteresis_close_point(#[case] ratio: f64, #[case] expected: MouthState) {
        let config = ClassifierConfig::new(1.5).with_hysteresis(0.3);
        let mut machine = MouthStateMachine::new(config);
        machine.observe(0, 1.6);
        machine.observe(1, ratio);
        assert_eq!(machine.state(), expected);
    }

    #[test]
    fn test_hysteresis_suppresses_chatter_near_threshold() {
        let config = ClassifierConfig::new(1.5).with_hysteresis(0.2);
        let mut machine = MouthStateMachine::new(config);
        let events = run(&mut machine, &[1.51, 1.49, 1.52, 1.45, 1.55, 1.2]);
        assert_eq!(events, vec![(Closed, Open), (Open, Closed)]);
    }

    #[test]
    fn test_hysteresis_does_not_move_open_point() {
        let config = ClassifierConfig::new(1.5).with_hysteresis(0.4);
        let mut machine = MouthStateMachine::new(config);
        assert!(run(&mut machine, &[1.5, 1.45]).is_empty());
        assert_eq!(run(&mut machine, &[1.51]), vec![(Closed, Open)]);
    }

    // ── dwell ───────────────────────────────────────────────────────

    #[test]
    fn test_dwell_requires_consecutive_frames() {
        let config = ClassifierConfig::new(1.5).with_dwell_frames(3);
        let mut machine = MouthStateMachine::new(config);
        assert!(run(&mut machine, &[1.6, 1.6]).is_empty());
        assert_eq!(machine.state(), Closed);
        assert_eq!(run(&mut machine, &[1.6]), vec![(Closed, Open)]);
    }

    #[test]
    fn test_dwell_resets_when_candidate_lapses() {
        let config = ClassifierConfig::new(1.5).with_dwell_frames(2);
        let mut machine = MouthStateMachine::new(config);
        let events = run(&mut machine, &[1.6, 1.0, 1.6, 1.0, 1.6, 1.7]);
        assert_eq!(events, vec![(Closed, Open)]);
    }

    #[test]
    fn test_dwell_event_reports_committing_frame() {
        let config = ClassifierConfig::new(1.5).with_dwell_frames(2);
        let mut machine = MouthStateMachine::new(config);
        assert!(machine.observe(10, 1.8).is_none());
        let event = machine.observe(11, 1.9).unwrap();
        assert_eq!(event.frame_index, 11);
    }

    #[test]
    fn test_zero_dwell_behaves_as_immediate() {
        let config = ClassifierConfig::new(1.5).with_dwell_frames(0);
        assert_eq!(config.dwell_frames, 1);
        let mut machine = MouthStateMachine::new(config);
        assert_eq!(run(&mut machine, &[1.6]), vec![(Closed, Open)]);
    }
}
