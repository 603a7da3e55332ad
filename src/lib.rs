// Public API for integration tests and potential library usage

pub mod api;
pub mod game;
pub mod label;
pub mod protocol;
pub mod state;
pub mod types;
pub mod ws;

// Background tasks
pub mod broadcast;
