//! Welcome email endpoint

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::handlers::AppState;
use crate::services::csv_import::is_valid_email;
use crate::services::email_sender::EmailSender;
use crate::services::email_templates::WelcomeEmail;
use crate::types::UserRole;

#[derive(Debug, Clone, Deserialize)]
pub struct WelcomeEmailRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub project_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WelcomeEmailResponse {
    pub sent: bool,
    pub to: String,
}

/// Render and send the welcome email
pub async fn deliver_welcome(
    sender: &dyn EmailSender,
    login_url: &str,
    request: &WelcomeEmailRequest,
) -> ApiResult<WelcomeEmailResponse> {
    let to = request.email.trim();
    if !is_valid_email(to) {
        return Err(ApiError::validation(format!("Invalid email address '{}'", to)));
    }

    let message = WelcomeEmail {
        to,
        name: request.name.as_deref(),
        role: request.role.unwrap_or_default(),
        project_name: request.project_name.as_deref(),
        login_url,
    }
    .render();

    sender.send(message).await.map_err(|e| {
        error!(%to, "Welcome email failed: {:#}", e);
        ApiError::Upstream(format!("email delivery failed: {}", e))
    })?;

    info!(%to, "Welcome email sent");
    Ok(WelcomeEmailResponse {
        sent: true,
        to: to.to_string(),
    })
}

pub async fn send_welcome_email(
    State(state): State<AppState>,
    Json(request): Json<WelcomeEmailRequest>,
) -> ApiResult<Json<WelcomeEmailResponse>> {
    let response = deliver_welcome(state.email.as_ref(), &state.config.portal_url, &request).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tokio_test::assert_ok;

    use super::*;
    use crate::services::email_sender::testing::FakeEmailSender;

    fn request(email: &str) -> WelcomeEmailRequest {
        WelcomeEmailRequest {
            email: email.into(),
            name: Some("Dr. Smith".into()),
            role: None,
            project_name: Some("Smile Dental".into()),
        }
    }

    #[tokio::test]
    async fn sends_rendered_message() {
        let sender = FakeEmailSender::default();
        assert_ok!(deliver_welcome(&sender, "https://portal.example.com", &request(" dr@example.com ")).await);

        let sent = sender.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "dr@example.com");
        assert!(sent[0].text.contains("https://portal.example.com"));
        assert!(sent[0].text.contains("Smile Dental"));
    }

    #[tokio::test]
    async fn invalid_address_is_rejected() {
        let sender = FakeEmailSender::default();
        let err = deliver_welcome(&sender, "https://portal.example.com", &request("not-an-email"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(sender.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_bad_gateway() {
        let sender = FakeEmailSender::failing();
        let err = deliver_welcome(&sender, "https://portal.example.com", &request("dr@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
