//! Chrome/Chromium executable resolution

use std::path::PathBuf;

use crate::common::{Error, Result};

/// Binary names searched on PATH, most specific first
const BINARY_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Where an executable was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// Explicitly configured (config file or --chrome)
    Configured(PathBuf),
    /// The CHROME environment variable
    Environment(PathBuf),
    /// Found on PATH under the given name
    Path(&'static str, PathBuf),
    /// Nothing found here; chromiumoxide's own detection gets a try
    Fallback,
}

impl Detection {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Detection::Configured(p) | Detection::Environment(p) | Detection::Path(_, p) => Some(p),
            Detection::Fallback => None,
        }
    }
}

/// Resolve the browser executable
///
/// A configured value may be a path or a bare name looked up on PATH; it is
/// an error for it to resolve to nothing.
pub fn resolve_executable(configured: Option<&PathBuf>) -> Result<Detection> {
    if let Some(configured) = configured {
        if configured.exists() {
            return Ok(Detection::Configured(configured.clone()));
        }
        return which::which(configured)
            .map(Detection::Configured)
            .map_err(|e| {
                Error::BrowserLaunch(format!(
                    "configured browser '{}' not found: {}",
                    configured.display(),
                    e
                ))
            });
    }

    if let Some(path) = std::env::var_os("CHROME").map(PathBuf::from) {
        if path.exists() {
            return Ok(Detection::Environment(path));
        }
        tracing::warn!("CHROME={} does not exist, searching PATH", path.display());
    }

    for name in BINARY_NAMES {
        if let Ok(path) = which::which(name) {
            return Ok(Detection::Path(name, path));
        }
    }

    Ok(Detection::Fallback)
}
