use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("failed to read frame {index}: {source}")]
    Read {
        index: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("frame source unavailable: {0}")]
    Unavailable(String),
}

/// Produces captured RGB frames on demand, in capture order.
pub trait FrameSource: Send {
    /// `Ok(Some)` for a frame, `Ok(None)` once the source is exhausted for
    /// good. An `Err` is transient: the caller skips the frame and asks again.
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError>;
}
