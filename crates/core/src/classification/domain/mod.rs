pub mod mouth_state;
pub mod mouth_state_machine;
