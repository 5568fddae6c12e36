pub mod deal;
pub mod escalation;
pub mod geo;
pub mod rating;
pub mod slot_window;
pub mod state_machine;
