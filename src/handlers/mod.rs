//! HTTP handlers and router

pub mod agents;
pub mod appointments;
pub mod dashboard;
pub mod email;
pub mod ghl;
pub mod health;
pub mod imports;
pub mod ingest;
pub mod projects;
pub mod roles;
pub mod tags;
pub mod webhook;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::{ConnectInfo, DefaultBodyLimit, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::Router;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::Config;
use crate::defaults::GHL_TIMEOUT_SECS;
use crate::error::ApiError;
use crate::services::email_sender::{EmailSender, LogEmailSender, ResendEmailSender};
use crate::services::ghl::{GhlApi, GhlClient};
use crate::services::rate_limiter::RateLimiter;
use crate::services::webhook_relay::WebhookRelay;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub relay: Arc<WebhookRelay>,
    pub ghl: Arc<dyn GhlApi>,
    pub email: Arc<dyn EmailSender>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wire up live clients from configuration
    pub fn from_config(pool: PgPool, config: Config) -> Result<Self> {
        let relay = WebhookRelay::new(config.webhook_timeout)?;
        let ghl = GhlClient::new(config.ghl_api_base.clone(), Duration::from_secs(GHL_TIMEOUT_SECS))?;

        let email: Arc<dyn EmailSender> = match &config.resend_api_key {
            Some(key) => {
                info!("Email delivery via Resend from {}", config.email_from);
                Arc::new(ResendEmailSender::new(key.clone(), config.email_from.clone())?)
            }
            None => {
                info!("RESEND_API_KEY not set, emails will only be logged");
                Arc::new(LogEmailSender)
            }
        };

        let limiter = RateLimiter::new(config.ingest_rate_limit, config.ingest_rate_window);

        Ok(Self {
            pool,
            config: Arc::new(config),
            relay: Arc::new(relay),
            ghl: Arc::new(ghl),
            email,
            limiter: Arc::new(limiter),
        })
    }
}

/// Client address used as the rate limit key
fn client_key(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, ApiError> {
    let key = client_key(&request);
    if let Err(throttled) = state.limiter.check(&key) {
        debug!(client = %key, path = %request.uri().path(), "Ingestion request throttled");
        return Err(ApiError::RateLimited {
            retry_after_secs: throttled.retry_after_secs(),
        });
    }
    Ok(next.run(request).await)
}

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/functions/all-calls-api", post(ingest::ingest_call))
        .route("/functions/enhanced-new-lead-api", post(ingest::ingest_lead))
        .route("/functions/appointment-status-webhook", post(webhook::appointment_status_webhook))
        .route("/functions/update-ghl-appointment", post(ghl::update_ghl_appointment))
        .route("/functions/create-ghl-appointment", post(ghl::create_ghl_appointment))
        .route("/functions/send-welcome-email", post(email::send_welcome_email))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    let portal = Router::new()
        .route("/api/imports", get(imports::list_imports))
        .route("/api/imports/:id/undo", post(imports::undo_import))
        .route(
            "/api/imports/:kind",
            post(imports::import_csv).layer(DefaultBodyLimit::max(state.config.import_body_limit)),
        )
        .route("/api/projects", get(projects::list_projects).post(projects::create_project))
        .route("/api/projects/:id", put(projects::update_project).delete(projects::delete_project))
        .route("/api/projects/:id/portal", get(projects::project_portal))
        .route("/api/projects/:id/tags", get(tags::list_tags).post(tags::create_tag))
        .route("/api/tags/:id", delete(tags::delete_tag))
        .route("/api/dashboard", get(dashboard::dashboard))
        .route("/api/leaderboard", get(dashboard::leaderboard))
        .route("/api/agents", get(agents::list_agents).post(agents::create_agent))
        .route("/api/agents/:id", put(agents::update_agent).delete(agents::delete_agent))
        .route("/api/appointments/:id", axum::routing::patch(appointments::update_appointment))
        .route(
            "/api/appointments/:id/tags/:tag_id",
            post(tags::tag_appointment).delete(tags::untag_appointment),
        )
        .route("/api/users/:id/role", get(roles::get_role).put(roles::set_role));

    Router::new()
        .route("/health", get(health::health))
        .merge(public)
        .merge(portal)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod testing {
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::services::email_sender::testing::FakeEmailSender;
    use crate::services::ghl::testing::FakeGhl;

    pub const SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

    /// State whose pool never connects; handlers that reach the database fail fast
    pub fn test_state(rate_limit: usize) -> AppState {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://portal@127.0.0.1:1/portal".to_string()),
            "JWT_SECRET" => Some(SECRET.to_string()),
            "INGEST_RATE_LIMIT" => Some(rate_limit.to_string()),
            _ => None,
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy(&config.database_url)
            .unwrap();

        AppState {
            pool,
            relay: Arc::new(WebhookRelay::new(Duration::from_secs(1)).unwrap()),
            ghl: Arc::new(FakeGhl::default()),
            email: Arc::new(FakeEmailSender::default()),
            limiter: Arc::new(RateLimiter::new(config.ingest_rate_limit, config.ingest_rate_window)),
            config: Arc::new(config),
        }
    }
}
