//! Portal edits of appointments

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::queries;
use crate::db::queries::appointment::AppointmentChanges;
use crate::error::{ApiError, ApiResult};
use crate::handlers::webhook::relay_status_change;
use crate::handlers::AppState;
use crate::services::webhook_relay::RelayOutcome;
use crate::types::{Appointment, AppointmentStatus, UpdateAppointmentRequest};

#[derive(Debug, Serialize)]
pub struct AppointmentUpdateResponse {
    pub appointment: Appointment,
    /// Present when the status changed and the project webhook was notified
    pub webhook: Option<RelayOutcome>,
}

/// Normalise a portal edit against the stored appointment.
/// Returns the column changes and whether the status actually changed.
fn build_changes(existing: &Appointment, request: &UpdateAppointmentRequest) -> ApiResult<(AppointmentChanges, bool)> {
    let status = match request.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            AppointmentStatus::parse(raw)
                .ok_or_else(|| ApiError::validation(format!("Unknown appointment status '{}'", raw)))?,
        ),
        None => None,
    };

    let showed = request.showed.or_else(|| status.and_then(|s| s.implied_showed()));
    let confirmed = match (request.confirmed, status) {
        (Some(c), _) => Some(c),
        (None, Some(AppointmentStatus::Confirmed)) => Some(true),
        _ => None,
    };
    let status_changed = status.is_some_and(|s| existing.parsed_status() != Some(s));

    let changes = AppointmentChanges {
        status: status.map(|s| s.as_str().to_string()),
        confirmed,
        showed,
        internal_process_complete: request.internal_process_complete,
        date_of_appointment: request.date_of_appointment,
        requested_time: request.requested_time,
    };
    Ok((changes, status_changed))
}

pub async fn update_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> ApiResult<Json<AppointmentUpdateResponse>> {
    let existing = queries::appointment::get_appointment(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("appointment"))?;

    let (changes, status_changed) = build_changes(&existing, &request)?;
    let appointment = queries::appointment::update_appointment(&state.pool, id, &changes)
        .await?
        .ok_or_else(|| ApiError::not_found("appointment"))?;
    info!(appointment_id = %id, user_id = %user.user_id, status_changed, "Appointment updated");

    let webhook = if status_changed {
        let outcome = relay_status_change(
            &state,
            &appointment,
            existing.status.as_deref(),
            appointment.status.as_deref(),
        )
        .await
        .map_err(|e| {
            warn!(appointment_id = %id, "Update saved but status webhook failed: {}", e);
            e
        })?;
        Some(outcome)
    } else {
        None
    };

    Ok(Json(AppointmentUpdateResponse { appointment, webhook }))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;

    fn existing(status: Option<&str>) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            project_name: "Smile Dental".into(),
            lead_name: "Jane Doe".into(),
            lead_email: None,
            lead_phone_number: Some("5551234567".into()),
            date_appointment_created: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            date_of_appointment: NaiveDate::from_ymd_opt(2024, 3, 8),
            requested_time: None,
            status: status.map(Into::into),
            agent: None,
            agent_number: None,
            calendar_name: None,
            ghl_appointment_id: None,
            ghl_contact_id: None,
            confirmed: false,
            showed: None,
            internal_process_complete: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn with_status(status: &str) -> UpdateAppointmentRequest {
        UpdateAppointmentRequest {
            status: Some(status.into()),
            ..Default::default()
        }
    }

    #[test]
    fn status_is_normalised_and_implies_attendance() {
        let (changes, changed) = build_changes(&existing(Some("new")), &with_status("No Show")).unwrap();
        assert_eq!(changes.status.as_deref(), Some("no_show"));
        assert_eq!(changes.showed, Some(false));
        assert!(changed);
    }

    #[test]
    fn confirmed_status_sets_confirmed_flag() {
        let (changes, _) = build_changes(&existing(None), &with_status("confirmed")).unwrap();
        assert_eq!(changes.confirmed, Some(true));
    }

    #[test]
    fn explicit_flags_win_over_status() {
        let request = UpdateAppointmentRequest {
            status: Some("showed".into()),
            showed: Some(false),
            ..Default::default()
        };
        let (changes, _) = build_changes(&existing(None), &request).unwrap();
        assert_eq!(changes.showed, Some(false));
    }

    #[test]
    fn same_status_is_not_a_change() {
        let (_, changed) = build_changes(&existing(Some("Confirmed")), &with_status("confirmed")).unwrap();
        assert!(!changed);

        let request = UpdateAppointmentRequest {
            internal_process_complete: Some(true),
            ..Default::default()
        };
        let (changes, changed) = build_changes(&existing(Some("new")), &request).unwrap();
        assert!(!changed);
        assert!(changes.status.is_none());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = build_changes(&existing(None), &with_status("pending")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
