//! Error types for the smoke test
//!
//! Messages are written for a human reading a CI log: each one names the
//! step or resource that failed and, where possible, what was observed.

use std::io;
use thiserror::Error;

use crate::testing::Step;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the smoke test
#[derive(Error, Debug)]
pub enum Error {
    // === Event Server Errors ===
    #[error("Server unhealthy: {0}")]
    ServerUnhealthy(String),

    #[error("Event server rejected event with status {status}: {body}")]
    EventRejected { status: u16, body: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // === Wait/Assertion Errors ===
    #[error("Timed out after {timeout_ms}ms waiting for {condition}{}", .last_error.as_ref().map(|e| format!(" (last error: {e})")).unwrap_or_default())]
    WaitTimeout {
        condition: String,
        timeout_ms: u64,
        last_error: Option<String>,
    },

    #[error("Step {} ({step}) failed, {reason}: {source}{}", .step.number(), .note.as_ref().map(|n| format!("; {n}")).unwrap_or_default())]
    StepFailed {
        step: Step,
        reason: &'static str,
        #[source]
        source: Box<Error>,
        note: Option<String>,
    },

    #[error("No elements matched event entry selector '{selector}'")]
    NoEventEntries { selector: String },

    // === Browser Errors ===
    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap an error as the failure of a scenario step
    pub fn step_failed(step: Step, source: Error) -> Self {
        Self::StepFailed {
            step,
            reason: step.failure_reason(),
            source: Box::new(source),
            note: None,
        }
    }

    /// Attach a diagnostic note to a step failure
    ///
    /// Non-step errors are returned unchanged.
    pub fn with_note(self, extra: Option<String>) -> Self {
        match self {
            Self::StepFailed {
                step,
                reason,
                source,
                note,
            } => Self::StepFailed {
                step,
                reason,
                source,
                note: extra.or(note),
            },
            other => other,
        }
    }

    /// Create an invalid URL error
    pub fn invalid_url(url: &str, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// The step this error was raised in, if any
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::StepFailed { step, .. } => Some(*step),
            Self::ServerUnhealthy(_) => Some(Step::HealthCheck),
            _ => None,
        }
    }

    /// Environment not ready: the server failed its health check
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::ServerUnhealthy(_))
    }

    /// A bounded wait never observed its condition
    pub fn is_assertion_timeout(&self) -> bool {
        match self {
            Self::WaitTimeout { .. } => true,
            Self::StepFailed { source, .. } => source.is_assertion_timeout(),
            _ => false,
        }
    }

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Error::ServerUnhealthy(_) => "SERVER_UNHEALTHY",
            Error::EventRejected { .. } => "EVENT_REJECTED",
            Error::WaitTimeout { .. } => "ASSERTION_TIMEOUT",
            Error::StepFailed { source, .. } => source.code(),
            Error::NoEventEntries { .. } => "NO_EVENT_ENTRIES",
            Error::BrowserLaunch(_) => "BROWSER_LAUNCH_FAILED",
            Error::Browser(_) => "BROWSER_ERROR",
            Error::InvalidUrl { .. } | Error::Config(_) | Error::ConfigParse(_) => "CONFIG_ERROR",
            Error::Http(_) => "HTTP_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout(condition: &str) -> Error {
        Error::WaitTimeout {
            condition: condition.to_string(),
            timeout_ms: 5000,
            last_error: None,
        }
    }

    #[test]
    fn test_step_failure_message_names_step_and_reason() {
        let err = Error::step_failed(Step::ConnectionVerification, timeout("connected marker"));
        let msg = err.to_string();
        assert!(msg.starts_with("Step 3 (verify connection) failed"), "{msg}");
        assert!(msg.contains("dashboard never connected"), "{msg}");
        assert!(msg.contains("5000ms"), "{msg}");
    }

    #[test]
    fn test_note_is_appended_to_step_failure() {
        let err = Error::step_failed(Step::PropagationVerification, timeout("event label"))
            .with_note(Some("event send failed: connection refused".to_string()));
        assert!(err
            .to_string()
            .ends_with("; event send failed: connection refused"));
    }

    #[test]
    fn test_note_is_ignored_for_other_errors() {
        let err = Error::Internal("boom".to_string()).with_note(Some("ignored".to_string()));
        assert_eq!(err.to_string(), "Internal error: boom");
    }

    #[test]
    fn test_classification() {
        let unhealthy = Error::ServerUnhealthy("status 500".to_string());
        assert!(unhealthy.is_precondition());
        assert!(!unhealthy.is_assertion_timeout());
        assert_eq!(unhealthy.step(), Some(Step::HealthCheck));
        assert_eq!(unhealthy.code(), "SERVER_UNHEALTHY");

        let timed_out = Error::step_failed(Step::PayloadVerification, timeout("probe message"));
        assert!(timed_out.is_assertion_timeout());
        assert!(!timed_out.is_precondition());
        assert_eq!(timed_out.step(), Some(Step::PayloadVerification));
        assert_eq!(timed_out.code(), "ASSERTION_TIMEOUT");

        let no_entries = Error::step_failed(
            Step::InteractionVerification,
            Error::NoEventEntries {
                selector: ".entry".to_string(),
            },
        );
        assert!(!no_entries.is_assertion_timeout());
        assert_eq!(no_entries.code(), "NO_EVENT_ENTRIES");
    }

    #[test]
    fn test_wait_timeout_reports_last_error() {
        let err = Error::WaitTimeout {
            condition: "text 'Connected'".to_string(),
            timeout_ms: 250,
            last_error: Some("execution context destroyed".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 250ms waiting for text 'Connected' (last error: execution context destroyed)"
        );
    }
}
