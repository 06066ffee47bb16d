use crate::shared::frame::Frame;

use super::face_count_gate::DetectionOutcome;

/// Domain interface for the external 68-point landmark model.
///
/// Receives the grayscale copy of each captured frame. When the outcome is
/// `Exactly`, the landmark set is in canonical 68-point order.
/// Implementations may be stateful (e.g. tracking), hence `&mut self`.
pub trait LandmarkExtractor: Send {
    fn extract(&mut self, gray: &Frame) -> Result<DetectionOutcome, Box<dyn std::error::Error>>;
}
