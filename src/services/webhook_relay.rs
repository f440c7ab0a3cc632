//! Appointment status webhook relay
//!
//! Posts a fixed JSON envelope to the project's configured webhook URL.
//! One attempt per status change; failures go back to the caller.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::types::Appointment;

pub const STATUS_CHANGED_EVENT: &str = "appointment.status_changed";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("webhook did not respond within {secs}s")]
    Timeout { secs: u64 },
    #[error("webhook responded with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("webhook request failed: {0}")]
    Transport(String),
    #[error("invalid webhook URL '{0}'")]
    InvalidUrl(String),
}

/// Result of a relay attempt that did not fail
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RelayOutcome {
    Delivered { status: u16 },
    /// The project has no webhook URL configured
    Skipped,
}

pub struct WebhookRelay {
    client: Client,
    timeout: Duration,
}

impl WebhookRelay {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    /// Envelope sent for a status change
    pub fn build_envelope(
        appointment: &Appointment,
        previous_status: Option<&str>,
        new_status: Option<&str>,
    ) -> serde_json::Value {
        json!({
            "event": STATUS_CHANGED_EVENT,
            "timestamp": Utc::now().to_rfc3339(),
            "previous_status": previous_status,
            "new_status": new_status.or(appointment.status.as_deref()),
            "project_name": appointment.project_name,
            "appointment": appointment,
        })
    }

    /// POST `payload` to `url`. A missing or blank URL is skipped.
    pub async fn relay(&self, url: Option<&str>, payload: &serde_json::Value) -> Result<RelayOutcome, RelayError> {
        let url = match url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => url,
            None => {
                debug!("No webhook URL configured, skipping relay");
                return Ok(RelayOutcome::Skipped);
            }
        };
        let parsed = reqwest::Url::parse(url).map_err(|_| RelayError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RelayError::InvalidUrl(url.to_string()));
        }

        let response = self
            .client
            .post(parsed)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::Timeout { secs: self.timeout.as_secs() }
                } else {
                    RelayError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "Webhook rejected appointment update");
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        info!(%url, status = status.as_u16(), "Appointment webhook delivered");
        Ok(RelayOutcome::Delivered { status: status.as_u16() })
    }
}
