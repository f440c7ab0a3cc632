//! Configuration management

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{self, Context, Result};

use crate::defaults::{IMPORT_BODY_LIMIT_BYTES, WEBHOOK_TIMEOUT_SECS};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,

    /// Secret used to validate portal session tokens
    pub jwt_secret: String,

    /// Resend API key; emails are only logged when absent
    pub resend_api_key: Option<String>,

    pub email_from: String,

    /// Login link used in welcome emails
    pub portal_url: String,

    /// GoHighLevel API base URL
    pub ghl_api_base: String,

    pub webhook_timeout: Duration,

    /// Largest accepted CSV import request body, in bytes
    pub import_body_limit: usize,

    /// Requests allowed per client in each ingestion window
    pub ingest_rate_limit: usize,
    pub ingest_rate_window: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:8080")?;

        let jwt_secret = var("JWT_SECRET")
            .context("JWT_SECRET must be set to the project's JWT signing secret")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!(
                "JWT_SECRET must be at least 32 bytes (current: {} bytes)",
                jwt_secret.len()
            );
        }

        let webhook_timeout_secs = match var("WEBHOOK_TIMEOUT_SECS") {
            Some(v) => v.parse::<u64>().context("WEBHOOK_TIMEOUT_SECS must be a number of seconds")?,
            None => WEBHOOK_TIMEOUT_SECS,
        };
        if webhook_timeout_secs == 0 {
            anyhow::bail!("WEBHOOK_TIMEOUT_SECS must be greater than zero");
        }
        let import_body_limit = match var("IMPORT_BODY_LIMIT_BYTES") {
            Some(v) => v.parse::<usize>().context("IMPORT_BODY_LIMIT_BYTES must be a number of bytes")?,
            None => IMPORT_BODY_LIMIT_BYTES,
        };
        if import_body_limit == 0 {
            anyhow::bail!("IMPORT_BODY_LIMIT_BYTES must be greater than zero");
        }
        let ingest_rate_limit = match var("INGEST_RATE_LIMIT") {
            Some(v) => v.parse::<usize>().context("INGEST_RATE_LIMIT must be a positive integer")?,
            None => 60,
        };
        let ingest_rate_window_secs = match var("INGEST_RATE_WINDOW_SECS") {
            Some(v) => v.parse::<u64>().context("INGEST_RATE_WINDOW_SECS must be a number of seconds")?,
            None => 60,
        };
        if ingest_rate_limit == 0 || ingest_rate_window_secs == 0 {
            anyhow::bail!("INGEST_RATE_LIMIT and INGEST_RATE_WINDOW_SECS must be greater than zero");
        }

        Ok(Self {
            database_url,
            bind_addr,
            jwt_secret,
            resend_api_key: var("RESEND_API_KEY"),
            email_from: var("EMAIL_FROM_ADDRESS").unwrap_or_else(|| "noreply@patientpromarketing.com".to_string()),
            portal_url: var("PORTAL_URL").unwrap_or_else(|| "https://portal.patientpromarketing.com".to_string()),
            ghl_api_base: var("GHL_API_BASE").unwrap_or_else(|| "https://services.leadconnectorhq.com".to_string()),
            webhook_timeout: Duration::from_secs(webhook_timeout_secs),
            import_body_limit,
            ingest_rate_limit,
            ingest_rate_window: Duration::from_secs(ingest_rate_window_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn config_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://test"), ("JWT_SECRET", SECRET)]).unwrap();
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.webhook_timeout, Duration::from_secs(30));
        assert_eq!(config.email_from, "noreply@patientpromarketing.com");
        assert_eq!(config.ghl_api_base, "https://services.leadconnectorhq.com");
        assert_eq!(config.ingest_rate_limit, 60);
        assert!(config.resend_api_key.is_none());
    }

    #[test]
    fn config_requires_database_url() {
        let err = load(&[("JWT_SECRET", SECRET)]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn config_rejects_short_jwt_secret() {
        let err = load(&[("DATABASE_URL", "postgres://test"), ("JWT_SECRET", "short")]).unwrap_err();
        assert!(err.to_string().contains("at least 32 bytes"));
    }

    #[test]
    fn config_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", SECRET),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("WEBHOOK_TIMEOUT_SECS", "5"),
            ("RESEND_API_KEY", "re_123"),
            ("INGEST_RATE_LIMIT", "10"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.webhook_timeout, Duration::from_secs(5));
        assert_eq!(config.resend_api_key.as_deref(), Some("re_123"));
        assert_eq!(config.ingest_rate_limit, 10);
    }

    #[test]
    fn config_blank_values_count_as_unset() {
        let config = load(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", SECRET),
            ("RESEND_API_KEY", "   "),
        ])
        .unwrap();
        assert!(config.resend_api_key.is_none());
    }

    #[test]
    fn config_rejects_bad_timeout() {
        let err = load(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", SECRET),
            ("WEBHOOK_TIMEOUT_SECS", "soon"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("WEBHOOK_TIMEOUT_SECS"));
    }

    #[test]
    fn zero_limits_are_rejected() {
        for key in ["WEBHOOK_TIMEOUT_SECS", "IMPORT_BODY_LIMIT_BYTES", "INGEST_RATE_LIMIT"] {
            let err = load(&[("DATABASE_URL", "postgres://test"), ("JWT_SECRET", SECRET), (key, "0")]).unwrap_err();
            assert!(err.to_string().contains("greater than zero"), "{key}: {err}");
        }
    }
}
