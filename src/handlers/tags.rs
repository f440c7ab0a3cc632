//! Project tags and appointment tagging

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::queries;
use crate::error::{ApiError, ApiResult};
use crate::handlers::AppState;
use crate::types::{is_valid_color, CreateTagRequest, Project, ProjectTag, DEFAULT_TAG_COLOR};

/// Trimmed tag name and resolved color
fn validate_tag(request: &CreateTagRequest) -> ApiResult<(String, String)> {
    let name = request.tag_name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("tag_name is required"));
    }
    let color = match request.tag_color.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        None => DEFAULT_TAG_COLOR.to_string(),
        Some(c) if is_valid_color(c) => c.to_string(),
        Some(c) => return Err(ApiError::validation(format!("Invalid tag color '{}'", c))),
    };
    Ok((name.to_string(), color))
}

/// A tag may only be attached to appointments of its own project
fn ensure_same_project(tag: &ProjectTag, project: Option<&Project>) -> ApiResult<()> {
    match project {
        Some(p) if p.id == tag.project_id => Ok(()),
        _ => Err(ApiError::validation("Tag belongs to a different project than the appointment")),
    }
}

pub async fn list_tags(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ProjectTag>>> {
    let tags = queries::tag::list_project_tags(&state.pool, project_id).await?;
    Ok(Json(tags))
}

pub async fn create_tag(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<Uuid>,
    Json(request): Json<CreateTagRequest>,
) -> ApiResult<(StatusCode, Json<ProjectTag>)> {
    user.require_admin()?;
    let (name, color) = validate_tag(&request)?;
    if queries::project::get_project(&state.pool, project_id).await?.is_none() {
        return Err(ApiError::not_found("project"));
    }
    let tag = queries::tag::create_tag(&state.pool, project_id, &name, &color).await?;
    info!(tag_id = %tag.id, project_id = %project_id, "Tag created");
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn delete_tag(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    user.require_admin()?;
    if !queries::tag::delete_tag(&state.pool, id).await? {
        return Err(ApiError::not_found("tag"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn tag_appointment(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((appointment_id, tag_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let appointment = queries::appointment::get_appointment(&state.pool, appointment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("appointment"))?;
    let tag = queries::tag::get_tag(&state.pool, tag_id)
        .await?
        .ok_or_else(|| ApiError::not_found("tag"))?;
    let project = queries::project::get_project_by_name(&state.pool, &appointment.project_name).await?;
    ensure_same_project(&tag, project.as_ref())?;

    queries::tag::tag_appointment(&state.pool, appointment_id, tag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn untag_appointment(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((appointment_id, tag_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    if !queries::tag::untag_appointment(&state.pool, appointment_id, tag_id).await? {
        return Err(ApiError::not_found("appointment tag"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn request(name: &str, color: Option<&str>) -> CreateTagRequest {
        CreateTagRequest {
            tag_name: name.into(),
            tag_color: color.map(Into::into),
        }
    }

    fn project(id: Uuid) -> Project {
        Project {
            id,
            project_name: "Smile Dental".into(),
            active: true,
            timezone: "America/Chicago".into(),
            appointment_webhook_url: None,
            ghl_api_key: None,
            ghl_location_id: None,
            ghl_calendar_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tag(project_id: Uuid) -> ProjectTag {
        ProjectTag {
            id: Uuid::new_v4(),
            project_id,
            tag_name: "VIP".into(),
            tag_color: DEFAULT_TAG_COLOR.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn tag_color_defaults_when_missing() {
        let (name, color) = validate_tag(&request("  VIP ", None)).unwrap();
        assert_eq!(name, "VIP");
        assert_eq!(color, DEFAULT_TAG_COLOR);
    }

    #[test]
    fn tag_rejects_bad_input() {
        assert!(validate_tag(&request("", None)).is_err());
        assert!(validate_tag(&request("VIP", Some("red"))).is_err());
        assert_eq!(validate_tag(&request("VIP", Some("#abc"))).unwrap().1, "#abc");
    }

    #[test]
    fn tags_stay_within_their_project() {
        let project_id = Uuid::new_v4();
        assert!(ensure_same_project(&tag(project_id), Some(&project(project_id))).is_ok());
        assert!(ensure_same_project(&tag(project_id), Some(&project(Uuid::new_v4()))).is_err());
        assert!(ensure_same_project(&tag(project_id), None).is_err());
    }
}
