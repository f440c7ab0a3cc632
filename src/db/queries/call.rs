//! Call log queries

use anyhow::Result;
use sqlx::PgPool;

use crate::types::{Call, NewCall, RangeQuery};

const CALL_COLUMNS: &str = r#"
    id, project_name, date, call_datetime, lead_name, lead_phone_number,
    caller_phone_number, agent, call_outcome, duration_seconds, campaign_name, created_at
"#;

pub async fn insert_call(pool: &PgPool, call: &NewCall) -> Result<Call> {
    let query = format!(
        r#"
        INSERT INTO all_calls (id, project_name, date, call_datetime, lead_name, lead_phone_number,
                               caller_phone_number, agent, call_outcome, duration_seconds,
                               campaign_name, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {}
        "#,
        CALL_COLUMNS
    );
    let call = sqlx::query_as::<_, Call>(&query)
        .bind(call.id)
        .bind(&call.project_name)
        .bind(call.date)
        .bind(call.call_datetime)
        .bind(&call.lead_name)
        .bind(&call.lead_phone_number)
        .bind(&call.caller_phone_number)
        .bind(&call.agent)
        .bind(&call.call_outcome)
        .bind(call.duration_seconds)
        .bind(&call.campaign_name)
        .bind(call.created_at)
        .fetch_one(pool)
        .await?;
    Ok(call)
}

/// Calls in the range, oldest first
pub async fn list_calls(pool: &PgPool, range: &RangeQuery) -> Result<Vec<Call>> {
    let query = format!(
        r#"
        SELECT {} FROM all_calls
        WHERE ($1::text IS NULL OR lower(project_name) = lower($1))
          AND ($2::date IS NULL OR date >= $2)
          AND ($3::date IS NULL OR date <= $3)
        ORDER BY call_datetime
        "#,
        CALL_COLUMNS
    );
    let calls = sqlx::query_as::<_, Call>(&query)
        .bind(&range.project)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(pool)
        .await?;
    Ok(calls)
}
