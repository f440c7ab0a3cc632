//! Appointment status change relay endpoint

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::db::queries;
use crate::error::{ApiError, ApiResult};
use crate::handlers::AppState;
use crate::services::webhook_relay::{RelayOutcome, WebhookRelay};
use crate::types::Appointment;

#[derive(Debug, Clone, Deserialize)]
pub struct StatusChangeRequest {
    pub appointment_id: Uuid,
    #[serde(default)]
    pub previous_status: Option<String>,
    #[serde(default)]
    pub new_status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelayResponse {
    pub appointment_id: Uuid,
    #[serde(flatten)]
    pub outcome: RelayOutcome,
}

/// Send the status-change envelope to the appointment's project webhook
pub async fn relay_status_change(
    state: &AppState,
    appointment: &Appointment,
    previous_status: Option<&str>,
    new_status: Option<&str>,
) -> ApiResult<RelayOutcome> {
    let project = queries::project::get_project_by_name(&state.pool, &appointment.project_name).await?;
    let url = project.as_ref().and_then(|p| p.appointment_webhook_url.as_deref());

    let envelope = WebhookRelay::build_envelope(appointment, previous_status, new_status);
    let outcome = state.relay.relay(url, &envelope).await?;
    Ok(outcome)
}

pub async fn appointment_status_webhook(
    State(state): State<AppState>,
    Json(request): Json<StatusChangeRequest>,
) -> ApiResult<Json<RelayResponse>> {
    let appointment = queries::appointment::get_appointment(&state.pool, request.appointment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("appointment"))?;

    let outcome = relay_status_change(
        &state,
        &appointment,
        request.previous_status.as_deref(),
        request.new_status.as_deref(),
    )
    .await?;

    info!(appointment_id = %appointment.id, ?outcome, "Status change relayed");
    Ok(Json(RelayResponse {
        appointment_id: appointment.id,
        outcome,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_response_flattens_outcome() {
        let id = Uuid::new_v4();
        let body = serde_json::to_value(RelayResponse {
            appointment_id: id,
            outcome: RelayOutcome::Delivered { status: 200 },
        })
        .unwrap();
        assert_eq!(body["appointment_id"], id.to_string());
        assert_eq!(body["result"], "delivered");
        assert_eq!(body["status"], 200);
    }
}
