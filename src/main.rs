//! Patient Pro Marketing portal - backend for lead, call and appointment tracking
//!
//! Serves the ingestion functions called by the call center and GHL
//! automations, and the JSON API behind the client portal.

mod auth;
mod cli;
mod config;
mod db;
mod defaults;
mod error;
mod handlers;
mod services;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};
use crate::services::rate_limiter::RateLimiter;

/// Drop expired rate limit windows so idle clients do not accumulate
fn spawn_limiter_cleanup(limiter: Arc<RateLimiter>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            limiter.cleanup();
            debug!(tracked = limiter.tracked_keys(), "Rate limiter cleaned up");
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs directory - use LOGS_DIR env var or default to ../logs
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "../logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "portal.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,ppm_portal=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer()) // stdout
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false)) // file
        .init();

    let config = config::Config::from_env()?;
    info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url).await?;
    info!("Connected to PostgreSQL");

    db::run_migrations(&pool).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => {
            info!("Migrations applied, exiting");
            Ok(())
        }
        Command::Serve => {
            let bind_addr = config.bind_addr;
            let cleanup_every = config.ingest_rate_window;
            let state = handlers::AppState::from_config(pool, config)?;
            spawn_limiter_cleanup(state.limiter.clone(), cleanup_every);

            let listener = TcpListener::bind(bind_addr)
                .await
                .with_context(|| format!("failed to bind {}", bind_addr))?;
            info!("Starting Patient Pro Marketing portal on {}", bind_addr);

            axum::serve(
                listener,
                handlers::router(state).into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .context("server error")?;
            Ok(())
        }
    }
}
