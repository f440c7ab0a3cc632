//! Appointment queries

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::types::{Appointment, RangeQuery};

const APPOINTMENT_COLUMNS: &str = r#"
    id, project_name, lead_name, lead_email, lead_phone_number, date_appointment_created,
    date_of_appointment, requested_time, status, agent, agent_number, calendar_name,
    ghl_appointment_id, ghl_contact_id, confirmed, showed, internal_process_complete,
    created_at, updated_at
"#;

/// Normalised column values for a portal edit. `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct AppointmentChanges {
    pub status: Option<String>,
    pub confirmed: Option<bool>,
    pub showed: Option<bool>,
    pub internal_process_complete: Option<bool>,
    pub date_of_appointment: Option<NaiveDate>,
    pub requested_time: Option<NaiveTime>,
}

pub async fn get_appointment(pool: &PgPool, id: Uuid) -> Result<Option<Appointment>> {
    let query = format!("SELECT {} FROM all_appointments WHERE id = $1", APPOINTMENT_COLUMNS);
    let appointment = sqlx::query_as::<_, Appointment>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(appointment)
}

/// Appointments created within the range
pub async fn list_appointments(pool: &PgPool, range: &RangeQuery) -> Result<Vec<Appointment>> {
    let query = format!(
        r#"
        SELECT {} FROM all_appointments
        WHERE ($1::text IS NULL OR lower(project_name) = lower($1))
          AND ($2::date IS NULL OR date_appointment_created >= $2)
          AND ($3::date IS NULL OR date_appointment_created <= $3)
        ORDER BY date_appointment_created, created_at
        "#,
        APPOINTMENT_COLUMNS
    );
    let appointments = sqlx::query_as::<_, Appointment>(&query)
        .bind(&range.project)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(pool)
        .await?;
    Ok(appointments)
}

/// Newest appointments of a project
pub async fn recent_appointments(pool: &PgPool, project_name: &str, limit: i64) -> Result<Vec<Appointment>> {
    let query = format!(
        r#"
        SELECT {} FROM all_appointments
        WHERE lower(project_name) = lower($1)
        ORDER BY date_appointment_created DESC, created_at DESC
        LIMIT $2
        "#,
        APPOINTMENT_COLUMNS
    );
    let appointments = sqlx::query_as::<_, Appointment>(&query)
        .bind(project_name)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(appointments)
}

pub async fn update_appointment(pool: &PgPool, id: Uuid, changes: &AppointmentChanges) -> Result<Option<Appointment>> {
    let query = format!(
        r#"
        UPDATE all_appointments SET
            status = COALESCE($2, status),
            confirmed = COALESCE($3, confirmed),
            showed = COALESCE($4, showed),
            internal_process_complete = COALESCE($5, internal_process_complete),
            date_of_appointment = COALESCE($6, date_of_appointment),
            requested_time = COALESCE($7, requested_time),
            updated_at = $8
        WHERE id = $1
        RETURNING {}
        "#,
        APPOINTMENT_COLUMNS
    );
    let appointment = sqlx::query_as::<_, Appointment>(&query)
        .bind(id)
        .bind(&changes.status)
        .bind(changes.confirmed)
        .bind(changes.showed)
        .bind(changes.internal_process_complete)
        .bind(changes.date_of_appointment)
        .bind(changes.requested_time)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?;
    Ok(appointment)
}

/// Store the ids GHL assigned after creating the appointment there
pub async fn set_ghl_ids(pool: &PgPool, id: Uuid, ghl_appointment_id: &str, ghl_contact_id: &str) -> Result<Appointment> {
    let query = format!(
        r#"
        UPDATE all_appointments SET ghl_appointment_id = $2, ghl_contact_id = $3, updated_at = $4
        WHERE id = $1
        RETURNING {}
        "#,
        APPOINTMENT_COLUMNS
    );
    let appointment = sqlx::query_as::<_, Appointment>(&query)
        .bind(id)
        .bind(ghl_appointment_id)
        .bind(ghl_contact_id)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;
    Ok(appointment)
}
