//! The runner's view of a rendered dashboard
//!
//! The runner only needs a handful of DOM queries and one interaction. Keeping
//! them behind a trait lets the browser-backed implementation live in
//! [`crate::browser`] while the runner's ordering and timeout behaviour is
//! exercised without Chrome.

use std::time::Duration;

use async_trait::async_trait;

use crate::common::config::BrowserConfig;
use crate::common::Result;

/// How long and how patiently to wait for a page to settle after navigation
#[derive(Debug, Clone, Copy)]
pub struct NavigationOptions {
    /// Bound on the whole navigation
    pub timeout: Duration,
    /// Network must stay quiet this long to count as settled
    pub quiet_window: Duration,
    /// Interval between readiness samples
    pub poll_interval: Duration,
}

/// A dashboard loaded in some browser
#[async_trait]
pub trait Dashboard: Send + Sync {
    /// Navigate to `url` and wait until network activity settles
    async fn open(&self, url: &str, options: NavigationOptions) -> Result<()>;

    /// Whether any element matching `selector` has text content exactly `text`
    async fn any_text_equals(&self, selector: &str, text: &str) -> Result<bool>;

    /// Whether any element matching `selector` has text content containing `needle`
    async fn any_text_contains(&self, selector: &str, needle: &str) -> Result<bool>;

    /// Click the last element matching `selector`
    ///
    /// Returns how many elements matched. Zero matches is an error.
    async fn expand_latest(&self, selector: &str) -> Result<usize>;

    /// Release the browser; safe to call more than once
    async fn close(&mut self) -> Result<()>;
}

/// Produces a fresh, isolated [`Dashboard`] for one run
#[async_trait]
pub trait DashboardLauncher: Send + Sync {
    type Dashboard: Dashboard;

    async fn launch(&self, config: &BrowserConfig) -> Result<Self::Dashboard>;
}
