//! Appointment types

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Appointment status as tracked by the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    New,
    Confirmed,
    Showed,
    NoShow,
    Cancelled,
    Rescheduled,
    Won,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::New => "new",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Showed => "showed",
            AppointmentStatus::NoShow => "no_show",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Rescheduled => "rescheduled",
            AppointmentStatus::Won => "won",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "new" | "booked" | "scheduled" => Some(AppointmentStatus::New),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "showed" | "show" | "showed up" => Some(AppointmentStatus::Showed),
            "no show" | "noshow" | "no showed" => Some(AppointmentStatus::NoShow),
            "cancelled" | "canceled" => Some(AppointmentStatus::Cancelled),
            "rescheduled" => Some(AppointmentStatus::Rescheduled),
            "won" | "closed won" => Some(AppointmentStatus::Won),
            _ => None,
        }
    }

    /// Status value understood by the GHL appointments API
    pub fn ghl_status(&self) -> &'static str {
        match self {
            AppointmentStatus::New => "new",
            AppointmentStatus::Confirmed | AppointmentStatus::Rescheduled => "confirmed",
            AppointmentStatus::Showed | AppointmentStatus::Won => "showed",
            AppointmentStatus::NoShow => "noshow",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Attendance implied by the status, if any
    pub fn implied_showed(&self) -> Option<bool> {
        match self {
            AppointmentStatus::Showed | AppointmentStatus::Won => Some(true),
            AppointmentStatus::NoShow => Some(false),
            _ => None,
        }
    }
}

/// Row of `all_appointments`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub project_name: String,
    pub lead_name: String,
    pub lead_email: Option<String>,
    pub lead_phone_number: Option<String>,
    pub date_appointment_created: NaiveDate,
    pub date_of_appointment: Option<NaiveDate>,
    pub requested_time: Option<NaiveTime>,
    pub status: Option<String>,
    pub agent: Option<String>,
    pub agent_number: Option<String>,
    pub calendar_name: Option<String>,
    pub ghl_appointment_id: Option<String>,
    pub ghl_contact_id: Option<String>,
    pub confirmed: bool,
    pub showed: Option<bool>,
    pub internal_process_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn parsed_status(&self) -> Option<AppointmentStatus> {
        self.status.as_deref().and_then(AppointmentStatus::parse)
    }
}

/// Validated appointment ready for insertion. Serializes to `all_appointments` columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAppointment {
    pub id: Uuid,
    pub project_name: String,
    pub lead_name: String,
    pub lead_email: Option<String>,
    pub lead_phone_number: Option<String>,
    pub date_appointment_created: NaiveDate,
    pub date_of_appointment: Option<NaiveDate>,
    pub requested_time: Option<NaiveTime>,
    pub status: Option<String>,
    pub agent: Option<String>,
    pub agent_number: Option<String>,
    pub calendar_name: Option<String>,
    pub confirmed: bool,
    pub showed: Option<bool>,
    pub internal_process_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Portal-side edit of an appointment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub status: Option<String>,
    pub confirmed: Option<bool>,
    pub showed: Option<bool>,
    pub internal_process_complete: Option<bool>,
    pub date_of_appointment: Option<NaiveDate>,
    pub requested_time: Option<NaiveTime>,
}
