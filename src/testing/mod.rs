//! Smoke test runner
//!
//! Runs the fixed checklist against a live event server and dashboard:
//! health check, dashboard load, connection, event injection, propagation,
//! interaction and payload round trip. Each wait is a single bounded poll;
//! nothing is retried.

mod dashboard;
mod runner;
mod steps;

pub use dashboard::{Dashboard, DashboardLauncher, NavigationOptions};
pub use runner::{run_scenario, RunReport, StepReport};
pub use steps::Step;
