//! CLI command handling
//!
//! Applies command line overrides to the loaded configuration and runs the
//! requested command.

use std::future::Future;

use colored::Colorize;

use crate::browser::ChromeLauncher;
use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{format_elapsed, Error, Result};
use crate::events::{EventServer, TestEvent};
use crate::testing::{run_scenario, RunReport, Step};

/// Dispatch a CLI command on its own task
///
/// A panic anywhere in the command (including inside the browser driver)
/// comes back as an error, so it exits like any other failure and the
/// browser is released while the task unwinds.
pub async fn dispatch_guarded(command: Commands, config: Config) -> Result<()> {
    guarded(dispatch(command, config)).await
}

async fn guarded<F>(task: F) -> Result<()>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    match tokio::spawn(task).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => {
            let panic = e.into_panic();
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(Error::Internal(format!("command panicked: {message}")))
        }
        Err(e) => Err(Error::Internal(format!("command task failed: {e}"))),
    }
}

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Run {
            server_url,
            dashboard_url,
            chrome,
            headed,
            verbose,
        } => {
            if let Some(url) = server_url {
                config.server.url = url;
            }
            if let Some(url) = dashboard_url {
                config.dashboard.url = url;
            }
            if let Some(chrome) = chrome {
                config.browser.executable = Some(chrome);
            }
            if headed {
                config.browser.headless = false;
            }

            let report = run_scenario(&config, &ChromeLauncher, verbose).await?;
            print_report(&report);
            Ok(())
        }

        Commands::Health { server_url } => {
            if let Some(url) = server_url {
                config.server.url = url;
            }

            let server = EventServer::new(&config.server)?;
            let status = server.check_health().await?;
            println!("{} {} ({})", "✓".green(), server.health_url(), status);
            Ok(())
        }

        Commands::Send {
            server_url,
            event_type,
            source_app,
            prompt,
            session_id,
            data,
        } => {
            if let Some(url) = server_url {
                config.server.url = url;
            }
            if let Some(event_type) = event_type {
                config.event.hook_event_type = event_type;
            }
            if let Some(source_app) = source_app {
                config.event.source_app = source_app;
            }

            let mut event = TestEvent::probe(&config.event);
            if let Some(prompt) = prompt {
                event.payload.prompt = prompt;
            }
            if let Some(session_id) = session_id {
                event.session_id = session_id;
            }
            for entry in &data {
                let (key, value) = parse_data_entry(entry)?;
                event.payload.extra.insert(key, value);
            }

            let server = EventServer::new(&config.server)?;
            let status = server.send_event(&event).await?;
            println!(
                "{} Sent {} for session {} to {} ({})",
                "✓".green(),
                event.hook_event_type.bold(),
                event.session_id,
                server.events_url(),
                status
            );
            Ok(())
        }
    }
}

/// Parse a `key=value` payload entry
///
/// Values that are valid JSON (numbers, booleans, objects, quoted strings)
/// keep their type; anything else is sent as a plain string.
fn parse_data_entry(entry: &str) -> Result<(String, serde_json::Value)> {
    let (key, raw) = entry
        .split_once('=')
        .ok_or_else(|| Error::Config(format!("Invalid --data '{}': expected KEY=VALUE", entry)))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(Error::Config(format!(
            "Invalid --data '{}': key must not be empty",
            entry
        )));
    }
    if key == "prompt" || key == "timestamp" {
        return Err(Error::Config(format!(
            "Invalid --data '{}': '{}' is set by the event itself",
            entry, key
        )));
    }

    let value = serde_json::from_str(raw)
        .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Hint printed under a failure, by kind
///
/// An unhealthy server means the environment is not up; a timeout means the
/// dashboard was reachable but never showed what was expected.
pub fn failure_hint(error: &Error) -> Option<String> {
    let step = error
        .step()
        .map(|step| format!("step {} ({})", step.number(), step))
        .unwrap_or_else(|| "setup".to_string());

    if error.is_precondition() {
        Some(format!(
            "[{}] {}: start the event server and try again",
            error.code(),
            step
        ))
    } else if error.is_assertion_timeout() {
        Some(format!(
            "[{}] {}: the dashboard never reached the expected state; \
             check that it is connected to the server or raise [timeouts]",
            error.code(),
            step
        ))
    } else {
        None
    }
}

fn print_report(report: &RunReport) {
    println!("Summary:");
    println!("  Session:  {}", report.session_id);
    println!("  Message:  {}", report.probe_message);
    println!("  Steps:    {}/{}", report.steps.len(), Step::ALL.len());
    let warnings = report.steps.iter().filter(|s| s.warning.is_some()).count();
    if warnings > 0 {
        println!("  Warnings: {}", warnings.to_string().yellow());
    }
    println!("  Elapsed:  {}", format_elapsed(report.elapsed));
}
