pub mod command_locator;
pub mod log_locator;
