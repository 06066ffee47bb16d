use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::action::domain::event_dispatcher::EventDispatcher;
use crate::capture::domain::frame_source::FrameSource;
use crate::render::domain::render_sink::RenderSink;

use super::frame_pipeline::FramePipeline;
use super::session_executor::{SessionConfig, SessionExecutor, SessionReport};
use super::session_logger::SessionLogger;

/// Watches one subject's mouth and fires the action target on every opening.
///
/// Wires the components together and delegates the threading to a
/// `SessionExecutor`. Single-use: `execute` consumes the owned components,
/// so calling it twice fails.
pub struct WatchMouthUseCase {
    source: Option<Box<dyn FrameSource>>,
    pipeline: Option<FramePipeline>,
    dispatcher: Option<EventDispatcher>,
    render: Option<Box<dyn RenderSink>>,
    logger: Option<Box<dyn SessionLogger>>,
    executor: Box<dyn SessionExecutor>,
    config: SessionConfig,
}

impl WatchMouthUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        pipeline: FramePipeline,
        dispatcher: EventDispatcher,
        render: Box<dyn RenderSink>,
        logger: Box<dyn SessionLogger>,
        executor: Box<dyn SessionExecutor>,
        config: SessionConfig,
    ) -> Self {
        Self {
            source: Some(source),
            pipeline: Some(pipeline),
            dispatcher: Some(dispatcher),
            render: Some(render),
            logger: Some(logger),
            executor,
            config,
        }
    }

    /// Flag that stops the session before its next frame when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.config.cancelled.clone()
    }

    pub fn execute(&mut self) -> Result<SessionReport, Box<dyn std::error::Error>> {
        let mut dispatcher = self.dispatcher.take().ok_or("Session already executed")?;
        if !dispatcher.prime() {
            log::info!("Action target not available yet; will look again on the first opening");
        }

        self.executor.execute(
            self.source.take().ok_or("Session already executed")?,
            self.pipeline.take().ok_or("Session already executed")?,
            dispatcher,
            self.render.take().ok_or("Session already executed")?,
            self.logger.take().ok_or("Session already executed")?,
            self.config.clone(),
        )
    }
}
