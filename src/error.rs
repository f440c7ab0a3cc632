//! HTTP-facing error type

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::services::ghl::GhlError;
use crate::services::timezone::TimezoneError;
use crate::services::webhook_relay::RelayError;
use crate::types::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("authentication required")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("too many requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    UpstreamTimeout(String),
    #[error(transparent)]
    Internal(anyhow::Error),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::NotFound(what.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "INVALID_REQUEST",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::RateLimited { .. } => "RATE_LIMITED",
            ApiError::Upstream(_) => "UPSTREAM_ERROR",
            ApiError::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound("record".into()),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                ApiError::Conflict(db.message().to_string())
            }
            other => ApiError::Internal(other.into()),
        }
    }
}

/// Query helpers return `anyhow::Result`; recover database errors that have
/// a client-facing meaning.
impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<sqlx::Error>() {
            Ok(db) => db.into(),
            Err(other) => ApiError::Internal(other),
        }
    }
}

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        match e {
            RelayError::Timeout { .. } => ApiError::UpstreamTimeout(e.to_string()),
            RelayError::InvalidUrl(_) => ApiError::Validation(e.to_string()),
            RelayError::Rejected { .. } | RelayError::Transport(_) => ApiError::Upstream(e.to_string()),
        }
    }
}

impl From<GhlError> for ApiError {
    fn from(e: GhlError) -> Self {
        match e {
            GhlError::Timeout => ApiError::UpstreamTimeout(e.to_string()),
            GhlError::MissingCredentials(_) => ApiError::Validation(e.to_string()),
            GhlError::Api { .. } | GhlError::Transport(_) | GhlError::UnexpectedResponse(_) => {
                ApiError::Upstream(e.to_string())
            }
        }
    }
}

impl From<TimezoneError> for ApiError {
    fn from(e: TimezoneError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(e) => {
                error!("Internal error: {:#}", e);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let mut body = ErrorResponse::new(self.code(), message);
        if let ApiError::RateLimited { retry_after_secs } = &self {
            body = body.with_details(serde_json::json!({ "retry_after_secs": retry_after_secs }));
        }
        (status, Json(body)).into_response()
    }
}
