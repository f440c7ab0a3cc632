//! Facebook ad spend types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Row of `facebook_ad_spend`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdSpend {
    pub id: Uuid,
    pub project_id: Uuid,
    pub date: NaiveDate,
    pub spend: f64,
    pub campaign_name: Option<String>,
    pub impressions: Option<i64>,
    pub clicks: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Validated ad spend row ready for insertion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAdSpend {
    pub id: Uuid,
    pub project_id: Uuid,
    pub date: NaiveDate,
    pub spend: f64,
    pub campaign_name: Option<String>,
    pub impressions: Option<i64>,
    pub clicks: Option<i64>,
    pub created_at: DateTime<Utc>,
}
