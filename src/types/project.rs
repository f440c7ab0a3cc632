//! Project (client) types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A tenant of the portal, usually a clinic.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub project_name: String,
    pub active: bool,
    /// IANA timezone name used for appointment wall-clock times
    pub timezone: String,
    pub appointment_webhook_url: Option<String>,
    #[serde(skip_serializing)]
    pub ghl_api_key: Option<String>,
    pub ghl_location_id: Option<String>,
    pub ghl_calendar_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn has_ghl_credentials(&self) -> bool {
        self.ghl_api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Request to create a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub project_name: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub appointment_webhook_url: Option<String>,
    #[serde(default)]
    pub ghl_api_key: Option<String>,
    #[serde(default)]
    pub ghl_location_id: Option<String>,
    #[serde(default)]
    pub ghl_calendar_id: Option<String>,
}

/// Partial update of a project; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectRequest {
    pub project_name: Option<String>,
    pub active: Option<bool>,
    pub timezone: Option<String>,
    pub appointment_webhook_url: Option<String>,
    pub ghl_api_key: Option<String>,
    pub ghl_location_id: Option<String>,
    pub ghl_calendar_id: Option<String>,
}

/// Minimal project reference used while validating imports
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ProjectRef {
    pub id: Uuid,
    pub project_name: String,
}
