use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crate::action::domain::event_dispatcher::{DispatchStats, EventDispatcher};
use crate::capture::domain::frame_source::FrameSource;
use crate::classification::domain::mouth_state::MouthState;
use crate::render::domain::render_sink::RenderSink;
use crate::shared::constants::{
    DEFAULT_MAX_READ_FAILURES, DEFAULT_RENDER_CAPACITY, DEFAULT_RETRY_DELAY_MS,
};

use super::frame_pipeline::FramePipeline;
use super::session_logger::SessionLogger;

/// Configuration for one watch session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Pause after a degraded frame before reading the next one.
    pub retry_delay: Duration,
    /// Consecutive source read failures treated as exhaustion.
    pub max_read_failures: usize,
    /// Render payloads buffered before new ones are dropped.
    pub render_capacity: usize,
    pub cancelled: Arc<AtomicBool>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            max_read_failures: DEFAULT_MAX_READ_FAILURES,
            render_capacity: DEFAULT_RENDER_CAPACITY,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Why the producer stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    Exhausted,
    Stopped,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionReport {
    pub end: SessionEnd,
    /// Frames read from the source.
    pub frames: usize,
    /// Frames skipped, including failed reads.
    pub degraded: usize,
    pub transitions: usize,
    pub final_state: MouthState,
    pub rendered: usize,
    pub render_dropped: usize,
    pub render_failures: usize,
    pub dispatch: DispatchStats,
}

/// Abstracts how the capture → classify → dispatch session is run.
///
/// The mouth state lives with the producer inside `pipeline`; the
/// dispatcher and render sink only react to what the producer reports.
pub trait SessionExecutor: Send {
    fn execute(
        &self,
        source: Box<dyn FrameSource>,
        pipeline: FramePipeline,
        dispatcher: EventDispatcher,
        render: Box<dyn RenderSink>,
        logger: Box<dyn SessionLogger>,
        config: SessionConfig,
    ) -> Result<SessionReport, Box<dyn std::error::Error>>;
}
