pub mod action_target;
pub mod event_dispatcher;
