//! Agent management endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::queries;
use crate::error::{ApiError, ApiResult};
use crate::handlers::AppState;
use crate::types::{Agent, CreateAgentRequest, UpdateAgentRequest};

fn validate_create(request: &CreateAgentRequest) -> ApiResult<()> {
    if request.agent_number.trim().is_empty() {
        return Err(ApiError::validation("agent_number is required"));
    }
    if request.agent_name.trim().is_empty() {
        return Err(ApiError::validation("agent_name is required"));
    }
    Ok(())
}

fn validate_update(request: &UpdateAgentRequest) -> ApiResult<()> {
    if request.agent_number.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::validation("agent_number cannot be blank"));
    }
    if request.agent_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::validation("agent_name cannot be blank"));
    }
    Ok(())
}

pub async fn list_agents(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Vec<Agent>>> {
    let agents = queries::agent::list_agents(&state.pool).await?;
    Ok(Json(agents))
}

pub async fn create_agent(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateAgentRequest>,
) -> ApiResult<(StatusCode, Json<Agent>)> {
    user.require_admin()?;
    validate_create(&request)?;
    let agent = queries::agent::create_agent(&state.pool, &request).await?;
    info!(agent_id = %agent.id, agent_number = %agent.agent_number, "Agent created");
    Ok((StatusCode::CREATED, Json(agent)))
}

pub async fn update_agent(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAgentRequest>,
) -> ApiResult<Json<Agent>> {
    user.require_admin()?;
    validate_update(&request)?;
    let agent = queries::agent::update_agent(&state.pool, id, &request)
        .await?
        .ok_or_else(|| ApiError::not_found("agent"))?;
    Ok(Json(agent))
}

pub async fn delete_agent(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    user.require_admin()?;
    if !queries::agent::delete_agent(&state.pool, id).await? {
        return Err(ApiError::not_found("agent"));
    }
    info!(agent_id = %id, "Agent deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_rejected() {
        let request = CreateAgentRequest {
            agent_number: " ".into(),
            agent_name: "Maria".into(),
        };
        assert!(validate_create(&request).is_err());

        let update = UpdateAgentRequest {
            agent_number: None,
            agent_name: Some("".into()),
            active: Some(false),
        };
        assert!(validate_update(&update).is_err());
        assert!(validate_update(&UpdateAgentRequest {
            agent_number: None,
            agent_name: None,
            active: Some(false)
        })
        .is_ok());
    }
}
