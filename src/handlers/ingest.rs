//! Public JSON ingestion of calls and leads
//!
//! Bodies go through the same field aliasing and validation as CSV rows.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use tracing::info;

use crate::db::queries;
use crate::error::{ApiError, ApiResult};
use crate::handlers::AppState;
use crate::services::csv_import::{phone_key, CsvRow, FieldError, ImportContext, ImportRecord};
use crate::types::{Call, ImportKind, LeadUpsertResponse, NewCall, NewLead, ProjectRef};

fn field_error(e: FieldError) -> ApiError {
    match e.field {
        Some(field) => ApiError::Validation(format!("{}: {}", field, e.message)),
        None => ApiError::Validation(e.message),
    }
}

fn json_row(kind: ImportKind, body: &Value) -> ApiResult<CsvRow> {
    CsvRow::from_json(kind, body).map_err(|e| ApiError::validation(e.to_string()))
}

pub fn build_call(body: &Value, projects: Vec<ProjectRef>) -> ApiResult<NewCall> {
    let row = json_row(ImportKind::Calls, body)?;
    let ctx = ImportContext::new(projects, None);
    NewCall::from_row(&row, &ctx).map_err(field_error)
}

/// Leads posted by forms usually carry no date; they count as received today
pub fn build_lead(body: &Value, projects: Vec<ProjectRef>) -> ApiResult<NewLead> {
    let mut row = json_row(ImportKind::Leads, body)?;
    let ctx = ImportContext::new(projects, None);
    if row.get("date").is_none() {
        row = row.with("date", &ctx.now.date_naive().to_string());
    }
    NewLead::from_row(&row, &ctx).map_err(field_error)
}

pub async fn ingest_call(State(state): State<AppState>, Json(body): Json<Value>) -> ApiResult<(StatusCode, Json<Call>)> {
    let projects = queries::project::list_project_refs(&state.pool).await?;
    let call = build_call(&body, projects)?;
    let stored = queries::call::insert_call(&state.pool, &call).await?;

    info!(call_id = %stored.id, project = %stored.project_name, "Call ingested");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Insert a lead, or refresh the project's existing lead with the same phone
/// number or email
pub async fn ingest_lead(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<LeadUpsertResponse>)> {
    let projects = queries::project::list_project_refs(&state.pool).await?;
    let lead = build_lead(&body, projects)?;
    let key = lead.phone_number.as_deref().and_then(phone_key);

    let existing =
        queries::lead::find_by_contact(&state.pool, &lead.project_name, key.as_deref(), lead.email.as_deref()).await?;

    match existing {
        Some(existing) => {
            let updated = queries::lead::refresh_lead(&state.pool, existing.id, &lead).await?;
            info!(lead_id = %updated.id, project = %updated.project_name, "Existing lead updated");
            Ok((
                StatusCode::OK,
                Json(LeadUpsertResponse {
                    id: updated.id,
                    updated_existing: true,
                }),
            ))
        }
        None => {
            let stored = queries::lead::insert_lead(&state.pool, &lead).await?;
            info!(lead_id = %stored.id, project = %stored.project_name, "Lead ingested");
            Ok((
                StatusCode::CREATED,
                Json(LeadUpsertResponse {
                    id: stored.id,
                    updated_existing: false,
                }),
            ))
        }
    }
}
