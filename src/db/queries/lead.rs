//! Lead queries

use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::types::{Lead, NewLead, RangeQuery};

const LEAD_COLUMNS: &str = r#"
    id, project_name, date, lead_name, first_name, last_name, email,
    phone_number, source, status, notes, created_at, updated_at
"#;

/// Existing lead of the project with the same phone (last 10 digits) or
/// email (case-insensitive). Phone matches win over email matches.
pub async fn find_by_contact(
    pool: &PgPool,
    project_name: &str,
    phone_key: Option<&str>,
    email: Option<&str>,
) -> Result<Option<Lead>> {
    if phone_key.is_none() && email.is_none() {
        return Ok(None);
    }
    let query = format!(
        r#"
        SELECT {} FROM new_leads
        WHERE lower(project_name) = lower($1)
          AND (
            ($2::text IS NOT NULL AND right(regexp_replace(coalesce(phone_number, ''), '[^0-9]', '', 'g'), 10) = $2)
            OR ($3::text IS NOT NULL AND lower(email) = lower($3))
          )
        ORDER BY
            (right(regexp_replace(coalesce(phone_number, ''), '[^0-9]', '', 'g'), 10) = coalesce($2, '')) DESC,
            created_at DESC
        LIMIT 1
        "#,
        LEAD_COLUMNS
    );
    let lead = sqlx::query_as::<_, Lead>(&query)
        .bind(project_name)
        .bind(phone_key)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(lead)
}

pub async fn insert_lead(pool: &PgPool, lead: &NewLead) -> Result<Lead> {
    let query = format!(
        r#"
        INSERT INTO new_leads (id, project_name, date, lead_name, first_name, last_name, email,
                               phone_number, source, status, notes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING {}
        "#,
        LEAD_COLUMNS
    );
    let lead = sqlx::query_as::<_, Lead>(&query)
        .bind(lead.id)
        .bind(&lead.project_name)
        .bind(lead.date)
        .bind(&lead.lead_name)
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(&lead.email)
        .bind(&lead.phone_number)
        .bind(&lead.source)
        .bind(&lead.status)
        .bind(&lead.notes)
        .bind(lead.created_at)
        .bind(lead.updated_at)
        .fetch_one(pool)
        .await?;
    Ok(lead)
}

/// Refresh an existing lead with newly submitted details. Missing values
/// keep what is stored; the original creation time is kept.
pub async fn refresh_lead(pool: &PgPool, id: Uuid, lead: &NewLead) -> Result<Lead> {
    let query = format!(
        r#"
        UPDATE new_leads SET
            lead_name = $2,
            first_name = COALESCE($3, first_name),
            last_name = COALESCE($4, last_name),
            email = COALESCE($5, email),
            phone_number = COALESCE($6, phone_number),
            source = COALESCE($7, source),
            notes = COALESCE($8, notes),
            updated_at = $9
        WHERE id = $1
        RETURNING {}
        "#,
        LEAD_COLUMNS
    );
    let lead = sqlx::query_as::<_, Lead>(&query)
        .bind(id)
        .bind(&lead.lead_name)
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(&lead.email)
        .bind(&lead.phone_number)
        .bind(&lead.source)
        .bind(&lead.notes)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
    Ok(lead)
}

pub async fn list_leads(pool: &PgPool, range: &RangeQuery) -> Result<Vec<Lead>> {
    let query = format!(
        r#"
        SELECT {} FROM new_leads
        WHERE ($1::text IS NULL OR lower(project_name) = lower($1))
          AND ($2::date IS NULL OR date >= $2)
          AND ($3::date IS NULL OR date <= $3)
        ORDER BY created_at
        "#,
        LEAD_COLUMNS
    );
    let leads = sqlx::query_as::<_, Lead>(&query)
        .bind(&range.project)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(pool)
        .await?;
    Ok(leads)
}
