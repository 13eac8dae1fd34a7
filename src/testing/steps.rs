//! The ordered checklist executed by the runner

use std::fmt;

/// One step of the smoke test, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    /// GET the server's health endpoint
    HealthCheck,
    /// Launch the browser and load the dashboard until the network settles
    DashboardLoad,
    /// Wait for the connected marker
    ConnectionVerification,
    /// POST the probe event (best effort)
    EventInjection,
    /// Wait for the event type label to render
    PropagationVerification,
    /// Click the newest event entry
    InteractionVerification,
    /// Wait for the probe message in the expanded payload
    PayloadVerification,
}

impl Step {
    /// All steps in the order they run
    pub const ALL: [Step; 7] = [
        Step::HealthCheck,
        Step::DashboardLoad,
        Step::ConnectionVerification,
        Step::EventInjection,
        Step::PropagationVerification,
        Step::InteractionVerification,
        Step::PayloadVerification,
    ];

    /// 1-based position in the checklist
    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::HealthCheck => "health check",
            Step::DashboardLoad => "load dashboard",
            Step::ConnectionVerification => "verify connection",
            Step::EventInjection => "send test event",
            Step::PropagationVerification => "verify propagation",
            Step::InteractionVerification => "expand latest event",
            Step::PayloadVerification => "verify payload",
        }
    }

    /// What it means for the system when this step fails
    pub fn failure_reason(self) -> &'static str {
        match self {
            Step::HealthCheck => "server unhealthy",
            Step::DashboardLoad => "dashboard failed to load",
            Step::ConnectionVerification => "dashboard never connected",
            Step::EventInjection => "event send failed",
            Step::PropagationVerification => "event never appeared",
            Step::InteractionVerification => "no event entries to expand",
            Step::PayloadVerification => "payload mismatch or missing",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
