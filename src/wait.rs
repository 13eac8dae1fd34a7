//! Bounded polling
//!
//! A [`BoundedPoll`] evaluates an async predicate repeatedly until it holds
//! or a deadline passes. Every probe is itself cut off at the deadline, so a
//! predicate that never resolves still produces a timeout error instead of
//! a hang.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};

use crate::common::{Error, Result};

/// Default interval between probes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A one-shot wait for a condition with a fixed deadline
#[derive(Debug, Clone)]
pub struct BoundedPoll {
    condition: String,
    timeout: Duration,
    interval: Duration,
}

impl BoundedPoll {
    /// Create a poll for `condition` (used in the timeout message)
    pub fn new(condition: impl Into<String>, timeout: Duration) -> Self {
        Self {
            condition: condition.into(),
            timeout,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the interval between probes
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Poll `probe` until it returns `Ok(true)`
    ///
    /// The probe runs at least once. `Err` results count as "not yet"; the
    /// most recent one is carried in the timeout error. Returns the time it
    /// took for the condition to hold.
    pub async fn until<F, Fut>(&self, mut probe: F) -> Result<Duration>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let started = Instant::now();
        let deadline = started + self.timeout;
        let mut last_error: Option<String> = None;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());

            match timeout(remaining, probe()).await {
                Ok(Ok(true)) => {
                    tracing::debug!(
                        "{} held after {:?}",
                        self.condition,
                        started.elapsed()
                    );
                    return Ok(started.elapsed());
                }
                Ok(Ok(false)) => {}
                Ok(Err(e)) => {
                    tracing::trace!("Probe for {} failed: {}", self.condition, e);
                    last_error = Some(e.to_string());
                }
                Err(_) => {
                    last_error.get_or_insert_with(|| "probe did not complete".to_string());
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(self.timed_out(last_error));
            }
            sleep(self.interval.min(deadline - now)).await;
        }
    }

    fn timed_out(&self, last_error: Option<String>) -> Error {
        Error::WaitTimeout {
            condition: self.condition.clone(),
            timeout_ms: self.timeout.as_millis() as u64,
            last_error,
        }
    }
}
