use chrono::NaiveTime;

/// Rows per insert when uploading imports
pub const BATCH_SIZE: usize = 100;

pub const WEBHOOK_TIMEOUT_SECS: u64 = 30;

/// CSV imports arrive inside a JSON body
pub const IMPORT_BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

pub const GHL_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_TIMEZONE: &str = "America/New_York";

pub const DEFAULT_APPOINTMENT_MINUTES: i64 = 60;

/// Appointments shown on a project portal
pub const PORTAL_RECENT_APPOINTMENTS: i64 = 50;

pub fn default_appointment_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
}
