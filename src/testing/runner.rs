//! Scenario runner
//!
//! Executes the smoke test checklist strictly in order against the live
//! event server and a dashboard obtained from a [`DashboardLauncher`].
//! The first failing step aborts the run; the only tolerated failure is the
//! event POST, whose error is carried forward as context.

use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::Instant;

use crate::common::config::Config;
use crate::common::{format_elapsed, Error, Result};
use crate::events::{EventServer, TestEvent};
use crate::wait::BoundedPoll;

use super::dashboard::{Dashboard, DashboardLauncher, NavigationOptions};
use super::steps::Step;

/// Result of a successful run
#[derive(Debug)]
pub struct RunReport {
    pub session_id: String,
    pub probe_message: String,
    pub steps: Vec<StepReport>,
    pub elapsed: Duration,
}

/// Timing of a single completed step
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: Step,
    pub elapsed: Duration,
    /// Set when the step completed with a tolerated problem
    pub warning: Option<String>,
}

/// Run the smoke test
///
/// The health check runs before the launcher is touched, so an unhealthy
/// server never costs a browser launch. Once launched, the dashboard is
/// closed exactly once whatever the outcome of the remaining steps.
pub async fn run_scenario<L: DashboardLauncher>(
    config: &Config,
    launcher: &L,
    verbose: bool,
) -> Result<RunReport> {
    let started = Instant::now();
    let server = EventServer::new(&config.server)?;
    let mut checklist = Checklist::new(verbose);

    println!(
        "\n{} {}",
        "Running Smoke Test:".blue().bold(),
        config.dashboard.url.white().bold()
    );
    if verbose {
        println!("  Server: {}", config.server.url.dimmed());
    }

    println!("\n{}", "Steps:".cyan());

    checklist.begin(Step::HealthCheck);
    let t = Instant::now();
    match server.check_health().await {
        Ok(status) => checklist.pass(Step::HealthCheck, t.elapsed(), Some(status.to_string())),
        Err(e) => {
            checklist.report_failure(Step::HealthCheck, &e);
            return Err(e);
        }
    }

    checklist.begin(Step::DashboardLoad);
    let mut dashboard = match launcher.launch(&config.browser).await {
        Ok(dashboard) => dashboard,
        Err(e) => return Err(checklist.fail(Step::DashboardLoad, e)),
    };

    let outcome = drive(&dashboard, &server, config, &mut checklist).await;

    if let Err(e) = dashboard.close().await {
        tracing::warn!("Failed to close browser cleanly: {}", e);
    }

    let event = outcome?;

    println!("\n{} {}\n", "✓".green().bold(), "All checks passed".green().bold());

    Ok(RunReport {
        session_id: event.session_id,
        probe_message: event.payload.prompt,
        steps: checklist.into_reports(),
        elapsed: started.elapsed(),
    })
}

/// Steps 2 through 7 against an already launched dashboard
async fn drive<D: Dashboard>(
    dashboard: &D,
    server: &EventServer,
    config: &Config,
    checklist: &mut Checklist,
) -> Result<TestEvent> {
    let timeouts = &config.timeouts;
    let page = &config.dashboard;
    let interval = timeouts.poll_interval();

    let t = Instant::now();
    let navigation = NavigationOptions {
        timeout: timeouts.navigation(),
        quiet_window: timeouts.network_quiet(),
        poll_interval: interval,
    };
    if let Err(e) = dashboard.open(&page.url, navigation).await {
        return Err(checklist.fail(Step::DashboardLoad, e));
    }
    checklist.pass(Step::DashboardLoad, t.elapsed(), None);

    checklist.begin(Step::ConnectionVerification);
    let connected = BoundedPoll::new(
        format!("'{}' in <{}>", page.connected_marker, page.marker_selector),
        timeouts.connect(),
    )
    .interval(interval)
    .until(|| dashboard.any_text_equals(&page.marker_selector, &page.connected_marker))
    .await;
    match connected {
        Ok(elapsed) => checklist.pass(Step::ConnectionVerification, elapsed, None),
        Err(e) => return Err(checklist.fail(Step::ConnectionVerification, e)),
    }

    checklist.begin(Step::EventInjection);
    let event = TestEvent::probe(&config.event);
    println!("    Test message: \"{}\"", event.probe_message().dimmed());
    let t = Instant::now();
    let send_failure = server.emit(&event).await;
    match &send_failure {
        None => checklist.pass(Step::EventInjection, t.elapsed(), Some(event.session_id.clone())),
        Some(failure) => checklist.warn(Step::EventInjection, t.elapsed(), failure),
    }

    checklist.begin(Step::PropagationVerification);
    let appeared = BoundedPoll::new(
        format!("'{}' in <{}>", event.hook_event_type, page.marker_selector),
        timeouts.propagation(),
    )
    .interval(interval)
    .until(|| dashboard.any_text_contains(&page.marker_selector, &event.hook_event_type))
    .await;
    match appeared {
        Ok(elapsed) => checklist.pass(Step::PropagationVerification, elapsed, None),
        Err(e) => {
            let err = Error::step_failed(Step::PropagationVerification, e).with_note(send_failure);
            checklist.report_failure(Step::PropagationVerification, &err);
            return Err(err);
        }
    }

    checklist.begin(Step::InteractionVerification);
    let t = Instant::now();
    match dashboard.expand_latest(&page.event_entry_selector).await {
        Ok(count) => checklist.pass(
            Step::InteractionVerification,
            t.elapsed(),
            Some(format!("{count} entries")),
        ),
        Err(e) => return Err(checklist.fail(Step::InteractionVerification, e)),
    }

    checklist.begin(Step::PayloadVerification);
    let echoed = BoundedPoll::new(
        format!("probe message in <{}>", page.payload_selector),
        timeouts.payload(),
    )
    .interval(interval)
    .until(|| dashboard.any_text_contains(&page.payload_selector, event.probe_message()))
    .await;
    match echoed {
        Ok(elapsed) => checklist.pass(Step::PayloadVerification, elapsed, None),
        Err(e) => return Err(checklist.fail(Step::PayloadVerification, e)),
    }

    Ok(event)
}

/// Console progress for the run, plus the record of completed steps
struct Checklist {
    verbose: bool,
    spinner: Option<ProgressBar>,
    reports: Vec<StepReport>,
}

impl Checklist {
    fn new(verbose: bool) -> Self {
        Self {
            verbose,
            spinner: None,
            reports: Vec::new(),
        }
    }

    /// Show a spinner while a step is in flight (hidden when not a TTY)
    fn begin(&mut self, step: Step) {
        tracing::debug!("Starting step {}: {}", step.number(), step);
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Step {}: {}", step.number(), step));
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn clear(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn pass(&mut self, step: Step, elapsed: Duration, detail: Option<String>) {
        self.clear();
        let mut line = format!(
            "  {} Step {}: {} {}",
            "✓".green(),
            step.number(),
            step,
            format!("({})", format_elapsed(elapsed)).dimmed()
        );
        if self.verbose {
            if let Some(detail) = detail {
                line.push_str(&format!(" {}", detail.dimmed()));
            }
        }
        println!("{line}");
        self.reports.push(StepReport {
            step,
            elapsed,
            warning: None,
        });
    }

    fn warn(&mut self, step: Step, elapsed: Duration, warning: &str) {
        self.clear();
        println!(
            "  {} Step {}: {} {}",
            "!".yellow(),
            step.number(),
            step,
            warning.yellow()
        );
        self.reports.push(StepReport {
            step,
            elapsed,
            warning: Some(warning.to_string()),
        });
    }

    fn report_failure(&mut self, step: Step, error: &Error) {
        self.clear();
        println!("  {} Step {}: {}", "✗".red(), step.number(), error);
    }

    /// Print and wrap a step failure
    fn fail(&mut self, step: Step, source: Error) -> Error {
        let err = Error::step_failed(step, source);
        self.report_failure(step, &err);
        err
    }

    fn into_reports(mut self) -> Vec<StepReport> {
        self.clear();
        self.reports
    }
}
