//! The synthetic event injected into the server
//!
//! Serializes to the exact body the `/events` endpoint ingests:
//!
//! ```json
//! { "source_app": "...", "session_id": "...", "hook_event_type": "...",
//!   "payload": { "prompt": "...", "timestamp": "2024-01-20T12:00:00.000Z" } }
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::common::config::EventConfig;

/// Last run id handed out in this process
static LAST_RUN_ID: AtomicI64 = AtomicI64::new(0);

/// A lifecycle event as posted to the event server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEvent {
    pub source_app: String,
    pub session_id: String,
    pub hook_event_type: String,
    pub payload: EventPayload,
}

/// Free-form event payload; `prompt` and `timestamp` are always present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub prompt: String,
    /// ISO-8601 UTC with millisecond precision
    pub timestamp: String,
    /// Extra payload entries, merged alongside `prompt` and `timestamp`
    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TestEvent {
    /// Build the probe event for one smoke-test run
    ///
    /// The session id and probe message both embed a millisecond run id, so
    /// a run never matches an event rendered by an earlier one.
    pub fn probe(config: &EventConfig) -> Self {
        Self::probe_at(config, Utc::now())
    }

    /// Build the probe event as of `now`
    pub fn probe_at(config: &EventConfig, now: DateTime<Utc>) -> Self {
        let run_id = next_run_id(now.timestamp_millis());
        Self {
            source_app: config.source_app.clone(),
            session_id: format!("{}-{}", config.session_prefix, run_id),
            hook_event_type: config.hook_event_type.clone(),
            payload: EventPayload::new(format!("{} {}", config.probe_prefix, run_id), now),
        }
    }

    /// The message the dashboard must echo back verbatim
    pub fn probe_message(&self) -> &str {
        &self.payload.prompt
    }
}

impl EventPayload {
    pub fn new(prompt: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            prompt: prompt.into(),
            timestamp: iso_timestamp(at),
            extra: BTreeMap::new(),
        }
    }
}

/// Render a timestamp the way JavaScript's `Date.toISOString` does
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Millisecond run id, strictly increasing within the process
///
/// Two runs started in the same millisecond get consecutive ids instead
/// of colliding.
fn next_run_id(now_ms: i64) -> i64 {
    let mut last = LAST_RUN_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now_ms.max(last + 1);
        match LAST_RUN_ID.compare_exchange_weak(last, candidate, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}
