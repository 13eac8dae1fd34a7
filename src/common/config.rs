//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Event server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Dashboard settings
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Browser launch settings
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Test event settings
    #[serde(default)]
    pub event: EventConfig,
}

/// Event server settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Base URL of the event server
    #[serde(default = "default_server_url")]
    pub url: String,

    /// Path of the health endpoint
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Path of the event ingestion endpoint
    #[serde(default = "default_events_path")]
    pub events_path: String,

    /// Per-request timeout for server calls
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            health_path: default_health_path(),
            events_path: default_events_path(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

fn default_server_url() -> String {
    "http://localhost:4000".to_string()
}
fn default_health_path() -> String {
    "/health".to_string()
}
fn default_events_path() -> String {
    "/events".to_string()
}
fn default_request_timeout() -> u64 {
    5000
}

/// Dashboard settings
///
/// The selectors describe the dashboard's rendered markup; text-bearing
/// nodes are matched by content, not by id.
#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// Dashboard origin
    #[serde(default = "default_dashboard_url")]
    pub url: String,

    /// Exact text shown once the live-update channel is connected
    #[serde(default = "default_connected_marker")]
    pub connected_marker: String,

    /// Elements searched for the connected marker and the event label
    #[serde(default = "default_marker_selector")]
    pub marker_selector: String,

    /// Elements making up the rendered event list
    #[serde(default = "default_event_entry_selector")]
    pub event_entry_selector: String,

    /// Elements of the expanded payload view
    #[serde(default = "default_payload_selector")]
    pub payload_selector: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            url: default_dashboard_url(),
            connected_marker: default_connected_marker(),
            marker_selector: default_marker_selector(),
            event_entry_selector: default_event_entry_selector(),
            payload_selector: default_payload_selector(),
        }
    }
}

fn default_dashboard_url() -> String {
    "http://localhost:5173".to_string()
}
fn default_connected_marker() -> String {
    "Connected".to_string()
}
fn default_marker_selector() -> String {
    "span".to_string()
}
fn default_event_entry_selector() -> String {
    ".group.relative.p-4".to_string()
}
fn default_payload_selector() -> String {
    "pre".to_string()
}

/// Browser launch settings
#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    /// Chrome/Chromium executable; detected when unset
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Run without a visible window
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Pass --no-sandbox and --disable-setuid-sandbox
    #[serde(default = "default_true")]
    pub no_sandbox: bool,

    /// Viewport width; 1024 and above gets the desktop layout
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    /// Viewport height
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Extra command line arguments for the browser
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            no_sandbox: true,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            args: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_viewport_width() -> u32 {
    1280
}
fn default_viewport_height() -> u32 {
    800
}

/// Timeout settings in milliseconds
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Bound on dashboard navigation, including network settling
    #[serde(default = "default_navigation")]
    pub navigation_ms: u64,

    /// How long the network must stay quiet to count as settled
    #[serde(default = "default_network_quiet")]
    pub network_quiet_ms: u64,

    /// Wait for the connected marker
    #[serde(default = "default_connect")]
    pub connect_ms: u64,

    /// Wait for the event label to render
    #[serde(default = "default_propagation")]
    pub propagation_ms: u64,

    /// Wait for the probe message in the expanded payload
    #[serde(default = "default_payload")]
    pub payload_ms: u64,

    /// Interval between DOM probes
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_ms: default_navigation(),
            network_quiet_ms: default_network_quiet(),
            connect_ms: default_connect(),
            propagation_ms: default_propagation(),
            payload_ms: default_payload(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl Timeouts {
    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }
    pub fn network_quiet(&self) -> Duration {
        Duration::from_millis(self.network_quiet_ms)
    }
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }
    pub fn propagation(&self) -> Duration {
        Duration::from_millis(self.propagation_ms)
    }
    pub fn payload(&self) -> Duration {
        Duration::from_millis(self.payload_ms)
    }
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_navigation() -> u64 {
    30_000
}
fn default_network_quiet() -> u64 {
    500
}
fn default_connect() -> u64 {
    5_000
}
fn default_propagation() -> u64 {
    10_000
}
fn default_payload() -> u64 {
    5_000
}
fn default_poll_interval() -> u64 {
    100
}

/// Test event settings
#[derive(Debug, Deserialize, Clone)]
pub struct EventConfig {
    /// `source_app` field of the injected event
    #[serde(default = "default_source_app")]
    pub source_app: String,

    /// `hook_event_type` field, also the label expected on the dashboard
    #[serde(default = "default_hook_event_type")]
    pub hook_event_type: String,

    /// Session ids are `<prefix>-<run id>`
    #[serde(default = "default_session_prefix")]
    pub session_prefix: String,

    /// Probe messages are `<prefix> <run id>`
    #[serde(default = "default_probe_prefix")]
    pub probe_prefix: String,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            source_app: default_source_app(),
            hook_event_type: default_hook_event_type(),
            session_prefix: default_session_prefix(),
            probe_prefix: default_probe_prefix(),
        }
    }
}

fn default_source_app() -> String {
    "test-e2e".to_string()
}
fn default_hook_event_type() -> String {
    "UserPromptSubmit".to_string()
}
fn default_session_prefix() -> String {
    "test-session".to_string()
}
fn default_probe_prefix() -> String {
    "test observability".to_string()
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}
