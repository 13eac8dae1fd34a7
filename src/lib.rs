//! Dashboard smoke test - end-to-end check of an event server and its live dashboard
//!
//! Posts a synthetic event to the server and verifies, through a headless
//! browser, that the dashboard renders it with its payload intact.

pub mod browser;
pub mod cli;
pub mod commands;
pub mod common;
pub mod events;
pub mod testing;
pub mod wait;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use testing::Step;
