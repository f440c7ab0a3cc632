//! Lead types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lead pipeline status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    AppointmentBooked,
    NotInterested,
    Invalid,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::AppointmentBooked => "appointment_booked",
            LeadStatus::NotInterested => "not_interested",
            LeadStatus::Invalid => "invalid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "new" => Some(LeadStatus::New),
            "contacted" | "called" => Some(LeadStatus::Contacted),
            "appointment booked" | "booked" => Some(LeadStatus::AppointmentBooked),
            "not interested" => Some(LeadStatus::NotInterested),
            "invalid" | "bad number" => Some(LeadStatus::Invalid),
            _ => None,
        }
    }
}

/// Row of `new_leads`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lead {
    pub id: Uuid,
    pub project_name: String,
    pub date: NaiveDate,
    pub lead_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub source: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated lead ready for insertion. Serializes to `new_leads` columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLead {
    pub id: Uuid,
    pub project_name: String,
    pub date: NaiveDate,
    pub lead_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub source: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of the lead ingestion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadUpsertResponse {
    pub id: Uuid,
    /// `true` when an existing lead with the same phone or email was updated
    pub updated_existing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lead_status_spellings() {
        assert_eq!(LeadStatus::parse("Appointment Booked"), Some(LeadStatus::AppointmentBooked));
        assert_eq!(LeadStatus::parse("not_interested"), Some(LeadStatus::NotInterested));
        assert_eq!(LeadStatus::parse("maybe"), None);
    }
}
