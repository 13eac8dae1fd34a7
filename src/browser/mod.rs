//! Headless Chrome integration
//!
//! Implements the runner's [`Dashboard`](crate::testing::Dashboard) seam on
//! top of chromiumoxide.

mod detect;
mod script;
mod session;

pub use detect::{resolve_executable, Detection};
pub use session::{ChromeDashboard, ChromeLauncher};
