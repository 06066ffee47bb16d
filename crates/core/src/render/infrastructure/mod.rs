pub mod image_dump_render_sink;
pub mod log_render_sink;
