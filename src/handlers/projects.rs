//! Project (client) management and the per-project portal

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::queries;
use crate::defaults::PORTAL_RECENT_APPOINTMENTS;
use crate::error::{ApiError, ApiResult};
use crate::handlers::AppState;
use crate::services::stats::compute_stats;
use crate::services::timezone::parse_timezone;
use crate::types::{CreateProjectRequest, Project, ProjectPortal, RangeQuery, UpdateProjectRequest};

fn validate_webhook_url(url: Option<&str>) -> ApiResult<()> {
    let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return Ok(());
    };
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ApiError::validation(format!("Invalid webhook URL '{}'", url))),
    }
}

fn validate_create(request: &CreateProjectRequest) -> ApiResult<()> {
    if request.project_name.trim().is_empty() {
        return Err(ApiError::validation("project_name is required"));
    }
    if request.timezone.is_some() {
        parse_timezone(request.timezone.as_deref())?;
    }
    validate_webhook_url(request.appointment_webhook_url.as_deref())
}

fn validate_update(request: &UpdateProjectRequest) -> ApiResult<()> {
    if request.project_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::validation("project_name cannot be blank"));
    }
    if request.timezone.is_some() {
        parse_timezone(request.timezone.as_deref())?;
    }
    validate_webhook_url(request.appointment_webhook_url.as_deref())
}

pub async fn list_projects(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Vec<Project>>> {
    let projects = queries::project::list_projects(&state.pool).await?;
    Ok(Json(projects))
}

pub async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    user.require_admin()?;
    validate_create(&request)?;
    let project = queries::project::create_project(&state.pool, &request).await?;
    info!(project_id = %project.id, name = %project.project_name, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    user.require_admin()?;
    validate_update(&request)?;
    let project = queries::project::update_project(&state.pool, id, &request)
        .await?
        .ok_or_else(|| ApiError::not_found("project"))?;
    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    user.require_admin()?;
    if !queries::project::delete_project(&state.pool, id).await? {
        return Err(ApiError::not_found("project"));
    }
    info!(project_id = %id, "Project deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Project by id or, failing that, by name
async fn resolve_project(state: &AppState, key: &str) -> ApiResult<Project> {
    let project = match Uuid::parse_str(key.trim()) {
        Ok(id) => queries::project::get_project(&state.pool, id).await?,
        Err(_) => queries::project::get_project_by_name(&state.pool, key).await?,
    };
    project.ok_or_else(|| ApiError::not_found("project"))
}

pub async fn project_portal(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(key): Path<String>,
    Query(range): Query<RangeQuery>,
) -> ApiResult<Json<ProjectPortal>> {
    if range.is_inverted() {
        return Err(ApiError::validation("'from' must not be after 'to'"));
    }
    let project = resolve_project(&state, &key).await?;
    let range = RangeQuery {
        project: Some(project.project_name.clone()),
        ..range
    };

    let pool = &state.pool;
    let (leads, calls, appointments, ad_spend, recent_appointments, tags) = tokio::try_join!(
        queries::lead::list_leads(pool, &range),
        queries::call::list_calls(pool, &range),
        queries::appointment::list_appointments(pool, &range),
        queries::ad_spend::list_ad_spend(pool, &range),
        queries::appointment::recent_appointments(pool, &project.project_name, PORTAL_RECENT_APPOINTMENTS),
        queries::tag::list_project_tags(pool, project.id),
    )?;

    Ok(Json(ProjectPortal {
        stats: compute_stats(&leads, &calls, &appointments, &ad_spend),
        project_name: project.project_name,
        timezone: project.timezone,
        recent_appointments,
        tags,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str) -> CreateProjectRequest {
        CreateProjectRequest {
            project_name: name.into(),
            timezone: None,
            appointment_webhook_url: None,
            ghl_api_key: None,
            ghl_location_id: None,
            ghl_calendar_id: None,
        }
    }

    #[test]
    fn create_requires_name() {
        assert!(validate_create(&create("  ")).is_err());
        assert!(validate_create(&create("Smile Dental")).is_ok());
    }

    #[test]
    fn create_rejects_unknown_timezone() {
        let mut request = create("Smile Dental");
        request.timezone = Some("Moon/Base".into());
        let err = validate_create(&request).unwrap_err();
        assert!(err.to_string().contains("Moon/Base"));
    }

    #[test]
    fn webhook_url_must_be_http() {
        assert!(validate_webhook_url(Some("https://hooks.example.com/x")).is_ok());
        assert!(validate_webhook_url(Some("")).is_ok());
        assert!(validate_webhook_url(Some("ftp://example.com")).is_err());
        assert!(validate_webhook_url(Some("not a url")).is_err());
    }

    #[test]
    fn update_rejects_blank_name() {
        let request = UpdateProjectRequest {
            project_name: Some("".into()),
            ..Default::default()
        };
        assert!(validate_update(&request).is_err());
    }
}
