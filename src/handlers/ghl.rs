//! GoHighLevel calendar sync endpoints

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::queries;
use crate::defaults::{default_appointment_time, DEFAULT_APPOINTMENT_MINUTES};
use crate::error::{ApiError, ApiResult};
use crate::handlers::AppState;
use crate::services::ghl::{CreateAppointmentRequest, GhlApi, GhlError, UpdateAppointmentRequest, UpsertContactRequest};
use crate::services::timezone::{appointment_window, parse_timezone};
use crate::types::{Appointment, AppointmentStatus, Project};

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateGhlRequest {
    pub appointment_id: Uuid,
    /// Status to push; defaults to the stored status
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGhlRequest {
    pub appointment_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GhlSyncResponse {
    pub appointment_id: Uuid,
    pub ghl_appointment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ghl_contact_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ghl_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
}

fn required_setting<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, GhlError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(GhlError::MissingCredentials(name))
}

/// Push the appointment's status (and time, when known) to GHL
pub async fn push_update(
    ghl: &dyn GhlApi,
    project: &Project,
    appointment: &Appointment,
    status: Option<AppointmentStatus>,
) -> ApiResult<GhlSyncResponse> {
    let api_key = required_setting(project.ghl_api_key.as_deref(), "ghl_api_key")?;
    let ghl_id = appointment
        .ghl_appointment_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::not_found("GHL appointment"))?;

    let status = status.or_else(|| appointment.parsed_status());
    let tz = parse_timezone(Some(&project.timezone))?;
    let (start_time, end_time) = match (appointment.date_of_appointment, appointment.requested_time) {
        (Some(date), Some(time)) => {
            let (start, end) = appointment_window(date, time, DEFAULT_APPOINTMENT_MINUTES, tz)?;
            (Some(start), Some(end))
        }
        _ => (None, None),
    };

    let request = UpdateAppointmentRequest {
        appointment_status: status.map(|s| s.ghl_status().to_string()),
        start_time: start_time.clone(),
        end_time,
    };
    ghl.update_appointment(api_key, ghl_id, &request).await?;

    Ok(GhlSyncResponse {
        appointment_id: appointment.id,
        ghl_appointment_id: ghl_id.to_string(),
        ghl_contact_id: appointment.ghl_contact_id.clone(),
        ghl_status: request.appointment_status,
        start_time,
    })
}

/// Create the contact and appointment in GHL. The caller stores the ids.
pub async fn push_create(ghl: &dyn GhlApi, project: &Project, appointment: &Appointment) -> ApiResult<GhlSyncResponse> {
    if let Some(existing) = appointment.ghl_appointment_id.as_deref().filter(|id| !id.trim().is_empty()) {
        return Err(ApiError::Conflict(format!(
            "appointment already exists in GHL as {}",
            existing
        )));
    }
    let api_key = required_setting(project.ghl_api_key.as_deref(), "ghl_api_key")?;
    let location_id = required_setting(project.ghl_location_id.as_deref(), "ghl_location_id")?;
    let calendar_id = required_setting(project.ghl_calendar_id.as_deref(), "ghl_calendar_id")?;

    let date = appointment
        .date_of_appointment
        .ok_or_else(|| ApiError::validation("appointment has no date_of_appointment"))?;
    let time = match appointment.requested_time {
        Some(time) => time,
        None => {
            warn!(appointment_id = %appointment.id, "No requested time, booking GHL slot at the default time");
            default_appointment_time()
        }
    };
    let tz = parse_timezone(Some(&project.timezone))?;
    let (start_time, end_time) = appointment_window(date, time, DEFAULT_APPOINTMENT_MINUTES, tz)?;

    let contact_id = ghl
        .upsert_contact(
            api_key,
            &UpsertContactRequest {
                location_id: location_id.to_string(),
                name: appointment.lead_name.clone(),
                email: appointment.lead_email.clone(),
                phone: appointment.lead_phone_number.clone(),
            },
        )
        .await?;

    let status = appointment
        .parsed_status()
        .unwrap_or(AppointmentStatus::New)
        .ghl_status()
        .to_string();
    let ghl_appointment_id = ghl
        .create_appointment(
            api_key,
            &CreateAppointmentRequest {
                calendar_id: calendar_id.to_string(),
                location_id: location_id.to_string(),
                contact_id: contact_id.clone(),
                start_time: start_time.clone(),
                end_time,
                title: format!("{} - {}", appointment.lead_name, project.project_name),
                appointment_status: status.clone(),
                ignore_date_range: true,
            },
        )
        .await?;

    Ok(GhlSyncResponse {
        appointment_id: appointment.id,
        ghl_appointment_id,
        ghl_contact_id: Some(contact_id),
        ghl_status: Some(status),
        start_time: Some(start_time),
    })
}

async fn load(state: &AppState, appointment_id: Uuid) -> ApiResult<(Appointment, Project)> {
    let appointment = queries::appointment::get_appointment(&state.pool, appointment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("appointment"))?;
    let project = queries::project::get_project_by_name(&state.pool, &appointment.project_name)
        .await?
        .ok_or_else(|| ApiError::not_found("project"))?;
    Ok((appointment, project))
}

pub async fn update_ghl_appointment(
    State(state): State<AppState>,
    Json(request): Json<UpdateGhlRequest>,
) -> ApiResult<Json<GhlSyncResponse>> {
    let status = match request.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            AppointmentStatus::parse(raw)
                .ok_or_else(|| ApiError::validation(format!("Unknown appointment status '{}'", raw)))?,
        ),
        None => None,
    };
    let (appointment, project) = load(&state, request.appointment_id).await?;

    let response = push_update(state.ghl.as_ref(), &project, &appointment, status).await?;
    info!(
        appointment_id = %appointment.id,
        ghl_appointment_id = %response.ghl_appointment_id,
        "GHL appointment updated"
    );
    Ok(Json(response))
}

pub async fn create_ghl_appointment(
    State(state): State<AppState>,
    Json(request): Json<CreateGhlRequest>,
) -> ApiResult<Json<GhlSyncResponse>> {
    let (appointment, project) = load(&state, request.appointment_id).await?;

    let response = push_create(state.ghl.as_ref(), &project, &appointment).await?;
    let contact_id = response.ghl_contact_id.as_deref().unwrap_or_default();
    queries::appointment::set_ghl_ids(&state.pool, appointment.id, &response.ghl_appointment_id, contact_id).await?;

    info!(
        appointment_id = %appointment.id,
        ghl_appointment_id = %response.ghl_appointment_id,
        "GHL appointment created"
    );
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{NaiveDate, NaiveTime, Utc};

    use super::*;
    use crate::services::ghl::testing::FakeGhl;

    fn project() -> Project {
        Project {
            id: Uuid::new_v4(),
            project_name: "Smile Dental".into(),
            active: true,
            timezone: "America/New_York".into(),
            appointment_webhook_url: None,
            ghl_api_key: Some("key".into()),
            ghl_location_id: Some("loc-1".into()),
            ghl_calendar_id: Some("cal-1".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn appointment(ghl_id: Option<&str>) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            project_name: "Smile Dental".into(),
            lead_name: "Ann Lee".into(),
            lead_email: Some("ann@example.com".into()),
            lead_phone_number: Some("5551234567".into()),
            date_appointment_created: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            date_of_appointment: NaiveDate::from_ymd_opt(2024, 1, 15),
            requested_time: None,
            status: Some("confirmed".into()),
            agent: None,
            agent_number: None,
            calendar_name: None,
            ghl_appointment_id: ghl_id.map(Into::into),
            ghl_contact_id: None,
            confirmed: true,
            showed: None,
            internal_process_complete: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn update_maps_status_and_local_time() {
        let ghl = FakeGhl::default();
        let mut appt = appointment(Some("ghl-1"));
        appt.requested_time = NaiveTime::from_hms_opt(14, 30, 0);

        let response = push_update(&ghl, &project(), &appt, Some(AppointmentStatus::NoShow))
            .await
            .unwrap();

        assert_eq!(response.ghl_status.as_deref(), Some("noshow"));
        let updated = ghl.updated.lock();
        assert_eq!(updated[0].0, "ghl-1");
        assert_eq!(updated[0].1.start_time.as_deref(), Some("2024-01-15T14:30:00-05:00"));
        assert_eq!(updated[0].1.end_time.as_deref(), Some("2024-01-15T15:30:00-05:00"));
    }

    #[tokio::test]
    async fn update_without_ghl_id_is_not_found() {
        let ghl = FakeGhl::default();
        let err = push_update(&ghl, &project(), &appointment(None), None).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(ghl.updated.lock().is_empty());
    }

    #[tokio::test]
    async fn project_without_key_cannot_sync() {
        let ghl = FakeGhl::default();
        let mut p = project();
        p.ghl_api_key = None;
        let err = push_update(&ghl, &p, &appointment(Some("ghl-1")), None).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_upserts_contact_and_books_default_time() {
        let ghl = FakeGhl::default();
        let response = push_create(&ghl, &project(), &appointment(None)).await.unwrap();

        assert_eq!(response.ghl_appointment_id, "appt-1");
        assert_eq!(response.ghl_contact_id.as_deref(), Some("contact-1"));
        assert_eq!(ghl.contacts.lock()[0].email.as_deref(), Some("ann@example.com"));

        let created = ghl.created.lock();
        assert_eq!(created[0].contact_id, "contact-1");
        assert_eq!(created[0].calendar_id, "cal-1");
        assert_eq!(created[0].appointment_status, "confirmed");
        assert_eq!(created[0].start_time, "2024-01-15T09:00:00-05:00");
    }

    #[tokio::test]
    async fn create_twice_is_a_conflict() {
        let ghl = FakeGhl::default();
        let err = push_create(&ghl, &project(), &appointment(Some("ghl-1"))).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn create_requires_calendar() {
        let ghl = FakeGhl::default();
        let mut p = project();
        p.ghl_calendar_id = Some("  ".into());
        let err = push_create(&ghl, &p, &appointment(None)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("ghl_calendar_id"));
        assert!(ghl.contacts.lock().is_empty());
    }
}
