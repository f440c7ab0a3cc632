//! Call record types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Row of `all_calls`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Call {
    pub id: Uuid,
    pub project_name: String,
    pub date: NaiveDate,
    pub call_datetime: DateTime<Utc>,
    pub lead_name: String,
    pub lead_phone_number: String,
    pub caller_phone_number: Option<String>,
    pub agent: Option<String>,
    pub call_outcome: Option<String>,
    pub duration_seconds: Option<i32>,
    pub campaign_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated call ready for insertion. Serializes to `all_calls` columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCall {
    pub id: Uuid,
    pub project_name: String,
    pub date: NaiveDate,
    pub call_datetime: DateTime<Utc>,
    pub lead_name: String,
    pub lead_phone_number: String,
    pub caller_phone_number: Option<String>,
    pub agent: Option<String>,
    pub call_outcome: Option<String>,
    pub duration_seconds: Option<i32>,
    pub campaign_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Normalise a call outcome. Known outcomes map to a canonical spelling,
/// anything else is kept as entered.
pub fn normalize_call_outcome(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let canonical = match trimmed.to_lowercase().replace(['-', '_'], " ").as_str() {
        "answered" | "connected" => "answered",
        "voicemail" | "vm" | "left voicemail" => "voicemail",
        "no answer" | "noanswer" | "unanswered" => "no_answer",
        "busy" => "busy",
        "booked" | "appointment booked" => "booked",
        _ => return Some(trimmed.to_string()),
    };
    Some(canonical.to_string())
}
