pub mod render_sink;
