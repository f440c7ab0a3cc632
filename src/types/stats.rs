//! Dashboard and leaderboard types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Appointment, ProjectTag};

/// Aggregated funnel numbers for a project (or all projects) over a range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_leads: usize,
    pub total_calls: usize,
    pub appointments_booked: usize,
    pub confirmed: usize,
    pub showed: usize,
    pub no_shows: usize,
    pub cancelled: usize,
    pub booking_rate: Option<f64>,
    pub show_rate: Option<f64>,
    pub ad_spend: f64,
    pub cost_per_lead: Option<f64>,
    pub cost_per_appointment: Option<f64>,
    pub cost_per_show: Option<f64>,
    /// Average seconds between lead creation and first call
    pub avg_speed_to_lead_seconds: Option<f64>,
    pub leads_called: usize,
}

/// Speed-to-lead for a single lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedToLead {
    pub lead_id: Uuid,
    pub seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub agent_id: Option<Uuid>,
    pub agent_number: Option<String>,
    pub agent_name: String,
    pub total_calls: usize,
    pub talk_time_seconds: i64,
    pub avg_call_duration_seconds: Option<f64>,
    pub appointments_booked: usize,
    pub confirmed: usize,
    pub showed: usize,
    pub show_rate: Option<f64>,
}

/// Per-project portal view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPortal {
    pub project_name: String,
    pub timezone: String,
    pub stats: DashboardStats,
    pub recent_appointments: Vec<Appointment>,
    pub tags: Vec<ProjectTag>,
}
