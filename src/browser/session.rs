//! Chrome-backed dashboard
//!
//! One [`ChromeDashboard`] owns one browser process, its CDP handler task,
//! a throwaway profile directory and a single page. `close` shuts the browser
//! down gracefully; `Drop` covers every path that skips it.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures_util::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::common::config::BrowserConfig;
use crate::common::{Error, Result};
use crate::testing::{Dashboard, DashboardLauncher, NavigationOptions};
use crate::wait::BoundedPoll;

use super::detect::{resolve_executable, Detection};
use super::script::{self, PageActivity, ReadyState};

/// How long Chrome gets to exit after a graceful close
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Launches headless Chrome through the DevTools protocol
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeLauncher;

#[async_trait]
impl DashboardLauncher for ChromeLauncher {
    type Dashboard = ChromeDashboard;

    async fn launch(&self, config: &BrowserConfig) -> Result<ChromeDashboard> {
        ChromeDashboard::launch(config).await
    }
}

/// A running browser with one page open
pub struct ChromeDashboard {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    page: Page,
    profile: Option<TempDir>,
}

impl ChromeDashboard {
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        // Unique profile per run so nothing leaks between runs and concurrent
        // runs don't fight over the profile lock
        let profile = tempfile::Builder::new()
            .prefix("dashboard-smoke-profile-")
            .tempdir()
            .map_err(|e| Error::BrowserLaunch(format!("failed to create profile directory: {e}")))?;

        let launch_config = launch_config(config, profile.path())?;

        let (mut browser, mut handler) = Browser::launch(launch_config)
            .await
            .map_err(|e| Error::BrowserLaunch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    // Unknown CDP messages from newer Chrome builds are not fatal
                    tracing::trace!("CDP handler error: {}", e);
                }
            }
            tracing::debug!("CDP handler finished");
        });

        let page = match open_page(&browser).await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.kill().await;
                handler.abort();
                return Err(Error::BrowserLaunch(format!("failed to open page: {e}")));
            }
        };

        tracing::debug!("Browser launched, profile at {}", profile.path().display());

        Ok(Self {
            browser: Some(browser),
            handler: Some(handler),
            page,
            profile: Some(profile),
        })
    }

    async fn evaluate_bool(&self, expression: String) -> Result<bool> {
        Ok(self.page.evaluate_expression(expression).await?.into_value()?)
    }

    async fn activity(&self) -> Result<PageActivity> {
        Ok(self
            .page
            .evaluate_expression(script::PAGE_ACTIVITY)
            .await?
            .into_value()?)
    }

    /// Wait until the document is complete and no new resources have
    /// started loading for `quiet_window`
    async fn wait_for_network_idle(&self, options: NavigationOptions) -> Result<()> {
        let tracker = Mutex::new(QuietTracker::default());

        BoundedPoll::new("network to settle", options.timeout)
            .interval(options.poll_interval)
            .until(|| {
                let tracker = &tracker;
                async move {
                    let activity = self.activity().await?;
                    let quiet_for = match tracker.lock() {
                        Ok(mut tracker) => tracker.observe(activity.resources, Instant::now()),
                        Err(_) => return Err(Error::Internal("network tracker poisoned".to_string())),
                    };
                    Ok(activity.ready_state == ReadyState::Complete
                        && quiet_for >= options.quiet_window)
                }
            })
            .await?;
        Ok(())
    }
}

async fn open_page(browser: &Browser) -> Result<Page> {
    let page = browser.new_page("about:blank").await?;
    page.evaluate_on_new_document(script::RESOURCE_TIMING_BUFFER).await?;
    Ok(page)
}

/// Tracks how long the page's resource count has stayed unchanged
///
/// The count comes from resource timing entries, capped per document by
/// [`script::RESOURCE_TIMING_BUFFER`]. A page that loads more resources
/// than that looks idle once the cap is reached.
#[derive(Debug, Default)]
struct QuietTracker {
    last: Option<(u64, Instant)>,
}

impl QuietTracker {
    /// Record a sample and return how long the count has been stable
    fn observe(&mut self, resources: u64, now: Instant) -> Duration {
        match self.last {
            Some((count, since)) if count == resources => now.saturating_duration_since(since),
            _ => {
                self.last = Some((resources, now));
                Duration::ZERO
            }
        }
    }
}

fn launch_config(config: &BrowserConfig, profile: &std::path::Path) -> Result<LaunchConfig> {
    let mut builder = LaunchConfig::builder()
        .user_data_dir(profile)
        .window_size(config.viewport_width, config.viewport_height)
        .viewport(Viewport {
            width: config.viewport_width,
            height: config.viewport_height,
            ..Viewport::default()
        });

    match resolve_executable(config.executable.as_ref())? {
        Detection::Fallback => {
            tracing::debug!("No browser found on PATH, using chromiumoxide detection");
        }
        detection => {
            if let Some(path) = detection.path() {
                tracing::debug!("Using browser {} ({:?})", path.display(), detection);
                builder = builder.chrome_executable(path);
            }
        }
    }

    if !config.headless {
        builder = builder.with_head();
    }
    if config.no_sandbox {
        builder = builder.no_sandbox().arg("--disable-setuid-sandbox");
    }
    builder = builder.args(config.args.iter().map(String::as_str));

    builder.build().map_err(Error::BrowserLaunch)
}

#[async_trait]
impl Dashboard for ChromeDashboard {
    async fn open(&self, url: &str, options: NavigationOptions) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        let started = Instant::now();
        match tokio::time::timeout(options.timeout, self.page.goto(url)).await {
            Ok(result) => {
                result?;
            }
            Err(_) => {
                return Err(Error::WaitTimeout {
                    condition: format!("navigation to {url}"),
                    timeout_ms: options.timeout.as_millis() as u64,
                    last_error: None,
                })
            }
        }

        // Settling shares the navigation budget
        let timeout = options.timeout.saturating_sub(started.elapsed());
        self.wait_for_network_idle(NavigationOptions { timeout, ..options })
            .await
    }

    async fn any_text_equals(&self, selector: &str, text: &str) -> Result<bool> {
        self.evaluate_bool(script::any_text_equals(selector, text)).await
    }

    async fn any_text_contains(&self, selector: &str, needle: &str) -> Result<bool> {
        self.evaluate_bool(script::any_text_contains(selector, needle)).await
    }

    async fn expand_latest(&self, selector: &str) -> Result<usize> {
        let entries = self.page.find_elements(selector).await?;
        let Some(latest) = entries.last() else {
            return Err(Error::NoEventEntries {
                selector: selector.to_string(),
            });
        };
        latest.click().await?;
        tracing::debug!("Clicked entry {} of {}", entries.len(), entries.len());
        Ok(entries.len())
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };

        let closed = browser.close().await;
        match tokio::time::timeout(CLOSE_GRACE, browser.wait()).await {
            Ok(Ok(status)) => tracing::debug!("Browser exited: {:?}", status),
            Ok(Err(e)) => tracing::debug!("Failed to wait for browser exit: {}", e),
            Err(_) => {
                tracing::warn!("Browser did not exit within {:?}, killing it", CLOSE_GRACE);
                let _ = browser.kill().await;
            }
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        if let Some(profile) = self.profile.take() {
            if let Err(e) = profile.close() {
                tracing::debug!("Failed to remove browser profile: {}", e);
            }
        }

        closed.map(|_| ()).map_err(Error::from)
    }
}

impl Drop for ChromeDashboard {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        if let Some(browser) = self.browser.as_mut() {
            // The child was spawned with kill_on_drop; start the kill now
            // instead of waiting for the runtime to reap it
            if let Some(child) = browser.get_mut_child() {
                let _ = child.inner.start_kill();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_tracker_resets_on_new_resources() {
        let start = Instant::now();
        let mut tracker = QuietTracker::default();

        assert_eq!(tracker.observe(3, start), Duration::ZERO);
        assert_eq!(
            tracker.observe(3, start + Duration::from_millis(200)),
            Duration::from_millis(200)
        );
        assert_eq!(tracker.observe(5, start + Duration::from_millis(300)), Duration::ZERO);
        assert_eq!(
            tracker.observe(5, start + Duration::from_millis(900)),
            Duration::from_millis(600)
        );
    }

    #[test]
    fn test_launch_config_rejects_missing_configured_browser() {
        let profile = tempfile::tempdir().unwrap();
        let config = BrowserConfig {
            executable: Some("/nonexistent/chromium-for-tests".into()),
            ..BrowserConfig::default()
        };
        let err = launch_config(&config, profile.path()).unwrap_err();
        assert!(matches!(err, Error::BrowserLaunch(_)));
    }

    #[test]
    fn test_launch_config_with_existing_executable() {
        let profile = tempfile::tempdir().unwrap();
        let fake_chrome = tempfile::NamedTempFile::new().unwrap();
        let config = BrowserConfig {
            executable: Some(fake_chrome.path().to_path_buf()),
            args: vec!["--disable-gpu".to_string()],
            ..BrowserConfig::default()
        };
        assert!(launch_config(&config, profile.path()).is_ok());
    }

    // ============== Tests against a real browser ==============

    /// Find a Chrome binary, if one is installed
    fn chrome_available() -> Option<std::path::PathBuf> {
        resolve_executable(None).ok()?.path().cloned()
    }

    fn navigation() -> NavigationOptions {
        NavigationOptions {
            timeout: Duration::from_secs(20),
            quiet_window: Duration::from_millis(300),
            poll_interval: Duration::from_millis(50),
        }
    }

    async fn launch_chrome(path: std::path::PathBuf) -> ChromeDashboard {
        let config = BrowserConfig {
            executable: Some(path),
            ..BrowserConfig::default()
        };
        ChromeDashboard::launch(&config)
            .await
            .expect("Failed to launch browser")
    }

    #[tokio::test]
    #[ignore = "requires chrome"]
    async fn test_resource_count_is_not_capped() {
        let chrome = match chrome_available() {
            Some(path) => path,
            None => {
                eprintln!("Skipping test: chrome not available");
                return;
            }
        };

        let mut server = mockito::Server::new_async().await;
        let images: String = (0..300)
            .map(|i| format!("<img src=\"/asset/{i}.png\">"))
            .collect();
        server
            .mock("GET", "/")
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(format!("<!doctype html><html><body>{images}</body></html>"))
            .create_async()
            .await;
        server
            .mock("GET", mockito::Matcher::Regex(r"^/asset/\d+\.png$".to_string()))
            .with_header("content-type", "image/png")
            .with_body("not really a png")
            .create_async()
            .await;

        let mut dashboard = launch_chrome(chrome).await;
        dashboard.open(&server.url(), navigation()).await.unwrap();
        let activity = dashboard.activity().await.unwrap();
        dashboard.close().await.unwrap();

        assert_eq!(activity.ready_state, ReadyState::Complete);
        assert!(activity.resources >= 300, "{activity:?}");
    }

    #[tokio::test]
    #[ignore = "requires chrome"]
    async fn test_queries_and_close() {
        let chrome = match chrome_available() {
            Some(path) => path,
            None => {
                eprintln!("Skipping test: chrome not available");
                return;
            }
        };

        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(
                "<!doctype html><html><body><span>Connected</span>\
                 <pre>say \"hi\" \\ it's ünïcødé ✓</pre></body></html>",
            )
            .create_async()
            .await;

        let mut dashboard = launch_chrome(chrome).await;
        dashboard.open(&server.url(), navigation()).await.unwrap();

        assert!(dashboard.any_text_equals("span", "Connected").await.unwrap());
        assert!(!dashboard.any_text_equals("span", "Connect").await.unwrap());
        assert!(dashboard
            .any_text_contains("pre", "say \"hi\" \\ it's ünïcødé ✓")
            .await
            .unwrap());
        assert!(!dashboard.any_text_contains("pre", "say 'hi'").await.unwrap());

        let err = dashboard.expand_latest(".group.relative.p-4").await.unwrap_err();
        assert!(matches!(err, Error::NoEventEntries { .. }), "{err}");

        dashboard.close().await.unwrap();
        assert!(dashboard.browser.is_none());
        assert!(dashboard.handler.is_none());
        assert!(dashboard.profile.is_none());
        // A second close is a no-op
        dashboard.close().await.unwrap();
    }

    /// Process state from /proc, `None` once the process is gone
    #[cfg(target_os = "linux")]
    fn process_state(pid: u32) -> Option<char> {
        let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
        stat.rsplit(')').next()?.trim_start().chars().next()
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    #[ignore = "requires chrome"]
    async fn test_drop_kills_browser_without_close() {
        let chrome = match chrome_available() {
            Some(path) => path,
            None => {
                eprintln!("Skipping test: chrome not available");
                return;
            }
        };

        let mut dashboard = launch_chrome(chrome).await;
        let pid = dashboard
            .browser
            .as_mut()
            .and_then(|browser| browser.get_mut_child())
            .and_then(|child| child.inner.id())
            .expect("browser child has a pid");
        assert!(process_state(pid).is_some());

        drop(dashboard);

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            // Killed but not yet reaped shows up as a zombie
            match process_state(pid) {
                None | Some('Z') => break,
                Some(state) => {
                    assert!(
                        std::time::Instant::now() < deadline,
                        "browser {pid} still running in state {state}"
                    );
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            }
        }
    }
}
