use std::fmt;

use crate::shared::constants::{CLOSE_LABEL, OPEN_LABEL};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MouthState {
    Open,
    #[default]
    Closed,
}

impl MouthState {
    /// Label shown to the user: `"open"` or `"close"`.
    pub fn label(&self) -> &'static str {
        match self {
            MouthState::Open => OPEN_LABEL,
            MouthState::Closed => CLOSE_LABEL,
        }
    }
}

impl fmt::Display for MouthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouthState::Open => write!(f, "OPEN"),
            MouthState::Closed => write!(f, "CLOSED"),
        }
    }
}

/// A change of mouth classification, emitted once per edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionEvent {
    pub from: MouthState,
    pub to: MouthState,
    /// Frame whose classification committed the change.
    pub frame_index: usize,
    /// Aspect ratio measured on that frame.
    pub ratio: f64,
}

impl TransitionEvent {
    pub fn is_opening(&self) -> bool {
        self.to == MouthState::Open
    }
}

impl fmt::Display for TransitionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} at frame {} (MAR {:.3})",
            self.from, self.to, self.frame_index, self.ratio
        )
    }
}
