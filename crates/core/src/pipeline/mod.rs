pub mod degraded_frame_throttle;
pub mod frame_pipeline;
pub mod infrastructure;
pub mod session_executor;
pub mod session_logger;
pub mod watch_mouth_use_case;
