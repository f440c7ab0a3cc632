//! Transactional email transport.
//!
//! `ResendEmailSender` is used when `RESEND_API_KEY` is configured; otherwise
//! the portal falls back to `LogEmailSender`, which only writes to tracing.
//! Handlers hold an `Arc<dyn EmailSender>`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

// =============================================================================
// Core trait
// =============================================================================

/// A rendered email ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, msg: EmailMessage) -> Result<()>;
}

// =============================================================================
// LogEmailSender
// =============================================================================

pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, msg: EmailMessage) -> Result<()> {
        info!(
            to = %msg.to,
            subject = %msg.subject,
            "Email delivery disabled, message logged only\n{}",
            msg.text,
        );
        Ok(())
    }
}

// =============================================================================
// ResendEmailSender
// =============================================================================

pub struct ResendEmailSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl ResendEmailSender {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(RESEND_ENDPOINT, api_key, from)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("failed to build email HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            from: from.into(),
        })
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send(&self, msg: EmailMessage) -> Result<()> {
        let body = json!({
            "from": self.from,
            "to": [msg.to],
            "subject": msg.subject,
            "html": msg.html,
            "text": msg.text,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("email request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Resend API error {}: {}", status, body);
        }

        info!(to = %msg.to, subject = %msg.subject, "Email sent via Resend");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use parking_lot::Mutex;

    use super::*;

    /// Captures sent messages; can be switched to fail
    #[derive(Default)]
    pub struct FakeEmailSender {
        pub sent: Mutex<Vec<EmailMessage>>,
        pub fail: bool,
    }

    impl FakeEmailSender {
        pub fn failing() -> Self {
            Self { fail: true, ..Default::default() }
        }

        pub fn sent_messages(&self) -> Vec<EmailMessage> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl EmailSender for FakeEmailSender {
        async fn send(&self, msg: EmailMessage) -> Result<()> {
            if self.fail {
                anyhow::bail!("mail server unavailable");
            }
            self.sent.lock().push(msg);
            Ok(())
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use tokio::net::TcpListener;

    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            to: "ann@example.com".into(),
            subject: "Welcome".into(),
            html: "<p>Hi</p>".into(),
            text: "Hi".into(),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/emails", addr)
    }

    #[tokio::test]
    async fn log_sender_does_not_error() {
        LogEmailSender.send(message()).await.unwrap();
    }

    #[tokio::test]
    async fn resend_posts_message_with_sender_address() {
        let endpoint = serve(Router::new().route(
            "/emails",
            post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                assert_eq!(headers.get("authorization").unwrap(), "Bearer re_test");
                assert_eq!(body["from"], "noreply@patientpromarketing.com");
                assert_eq!(body["to"][0], "ann@example.com");
                Json(json!({"id": "email-1"}))
            }),
        ))
        .await;

        let sender = ResendEmailSender::with_endpoint(endpoint, "re_test", "noreply@patientpromarketing.com").unwrap();
        sender.send(message()).await.unwrap();
    }

    #[tokio::test]
    async fn resend_error_status_is_reported() {
        let endpoint = serve(Router::new().route(
            "/emails",
            post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "invalid from") }),
        ))
        .await;

        let sender = ResendEmailSender::with_endpoint(endpoint, "re_test", "bad").unwrap();
        let err = sender.send(message()).await.unwrap_err();
        assert!(err.to_string().contains("422"));
    }
}
