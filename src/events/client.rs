//! HTTP client for the event server

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::common::config::ServerConfig;
use crate::common::{Error, Result};

use super::event::TestEvent;

/// Talks to the event server's health and ingestion endpoints
#[derive(Debug, Clone)]
pub struct EventServer {
    client: Client,
    health_url: Url,
    events_url: Url,
}

impl EventServer {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let base = Url::parse(&config.url).map_err(|e| Error::invalid_url(&config.url, e))?;
        let health_url = join(&base, &config.health_path)?;
        let events_url = join(&base, &config.events_path)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(concat!("dashboard-smoke/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            health_url,
            events_url,
        })
    }

    pub fn health_url(&self) -> &Url {
        &self.health_url
    }

    pub fn events_url(&self) -> &Url {
        &self.events_url
    }

    /// GET the health endpoint; any 2xx is healthy
    pub async fn check_health(&self) -> Result<StatusCode> {
        tracing::debug!("GET {}", self.health_url);

        let response = self
            .client
            .get(self.health_url.clone())
            .send()
            .await
            .map_err(|e| Error::ServerUnhealthy(format!("{} unreachable: {}", self.health_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ServerUnhealthy(format!(
                "{} returned status {}",
                self.health_url, status
            )));
        }

        Ok(status)
    }

    /// POST an event as JSON; non-2xx responses are errors
    pub async fn send_event(&self, event: &TestEvent) -> Result<StatusCode> {
        tracing::debug!(
            "POST {} session_id={} hook_event_type={}",
            self.events_url,
            event.session_id,
            event.hook_event_type
        );

        let response = self
            .client
            .post(self.events_url.clone())
            .json(event)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::EventRejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(status)
    }

    /// Send an event without failing the caller
    ///
    /// Returns a description of the failure, if any, so it can be attached
    /// to a later assertion.
    pub async fn emit(&self, event: &TestEvent) -> Option<String> {
        match self.send_event(event).await {
            Ok(status) => {
                tracing::debug!("Event accepted with status {}", status);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to send test event: {}", e);
                Some(format!("event send failed: {e}"))
            }
        }
    }
}

fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path).map_err(|e| Error::invalid_url(path, e))
}
