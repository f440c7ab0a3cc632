//! Business logic services

pub mod batch_uploader;
pub mod csv_import;
pub mod email_sender;
pub mod email_templates;
pub mod ghl;
pub mod import_history;
pub mod rate_limiter;
pub mod stats;
pub mod timezone;
pub mod webhook_relay;
