use crate::classification::domain::mouth_state::MouthState;
use crate::detection::domain::landmark_set::MouthRegion;
use crate::shared::frame::Frame;

/// One captured frame plus what the producer measured on it.
#[derive(Clone, Debug)]
pub struct RenderPayload {
    pub frame: Frame,
    /// Mouth points, absent on degraded frames.
    pub mouth: Option<MouthRegion>,
    pub ratio: Option<f64>,
    /// Persisted state after this frame was processed.
    pub state: MouthState,
}

/// Display side of a session. Purely observational.
pub trait RenderSink: Send {
    fn render(&mut self, payload: &RenderPayload) -> Result<(), Box<dyn std::error::Error>>;

    /// Called once per confirmed transition with `"open"` or `"close"`.
    fn show_label(&mut self, label: &str);
}
