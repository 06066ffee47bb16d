pub mod constants;
pub mod degraded_frame;
pub mod frame;
pub mod point;
pub mod settings;
