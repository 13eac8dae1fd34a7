//! Configuration paths

use std::path::PathBuf;

/// Directory name used under the platform config directory
const APP_NAME: &str = "dashboard-smoke";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `$XDG_CONFIG_HOME/dashboard-smoke/` or `~/.config/dashboard-smoke/`
/// - macOS: `~/Library/Application Support/dashboard-smoke/`
/// - Windows: `%APPDATA%\dashboard-smoke\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
