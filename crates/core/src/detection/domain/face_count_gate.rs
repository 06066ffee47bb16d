use crate::shared::degraded_frame::DegradedFrame;

use super::landmark_set::LandmarkSet;

/// Result of running the landmark extractor over one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum DetectionOutcome {
    Exactly(LandmarkSet),
    None,
    /// More than one face; carries the face count.
    Ambiguous(usize),
}

impl DetectionOutcome {
    /// Classifies a per-face landmark list by how many faces it holds.
    pub fn from_faces(faces: Vec<LandmarkSet>) -> Self {
        let count = faces.len();
        match (faces.into_iter().next(), count) {
            (None, _) => DetectionOutcome::None,
            (Some(face), 1) => DetectionOutcome::Exactly(face),
            (Some(_), n) => DetectionOutcome::Ambiguous(n),
        }
    }

    pub fn face_count(&self) -> usize {
        match self {
            DetectionOutcome::Exactly(_) => 1,
            DetectionOutcome::None => 0,
            DetectionOutcome::Ambiguous(n) => *n,
        }
    }
}

/// Lets a frame through to geometry only when exactly one face was found.
#[derive(Clone, Copy, Debug, Default)]
pub struct FaceCountGate;

impl FaceCountGate {
    pub fn new() -> Self {
        Self
    }

    pub fn admit(&self, outcome: DetectionOutcome) -> Result<LandmarkSet, DegradedFrame> {
        match outcome {
            DetectionOutcome::Exactly(landmarks) => Ok(landmarks),
            DetectionOutcome::None => Err(DegradedFrame::NoFace),
            DetectionOutcome::Ambiguous(count) => Err(DegradedFrame::MultipleFaces(count)),
        }
    }
}
