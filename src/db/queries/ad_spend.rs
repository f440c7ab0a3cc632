//! Facebook ad spend queries

use anyhow::Result;
use sqlx::PgPool;

use crate::types::{AdSpend, RangeQuery};

/// Spend rows in the range; the project filter matches the owning project's name
pub async fn list_ad_spend(pool: &PgPool, range: &RangeQuery) -> Result<Vec<AdSpend>> {
    let rows = sqlx::query_as::<_, AdSpend>(
        r#"
        SELECT s.id, s.project_id, s.date, s.spend, s.campaign_name, s.impressions, s.clicks, s.created_at
        FROM facebook_ad_spend s
        JOIN projects p ON p.id = s.project_id
        WHERE ($1::text IS NULL OR lower(p.project_name) = lower($1))
          AND ($2::date IS NULL OR s.date >= $2)
          AND ($3::date IS NULL OR s.date <= $3)
        ORDER BY s.date
        "#,
    )
    .bind(&range.project)
    .bind(range.from)
    .bind(range.to)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
