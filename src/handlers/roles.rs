//! User role lookup and assignment

use axum::extract::{Path, State};
use axum::Json;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::queries;
use crate::error::{ApiError, ApiResult};
use crate::handlers::AppState;
use crate::types::{SetRoleRequest, UserRoleResponse};

fn can_view_role(user: &AuthUser, target: Uuid) -> bool {
    user.is_admin() || user.user_id == target
}

pub async fn get_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserRoleResponse>> {
    if !can_view_role(&user, user_id) {
        return Err(ApiError::Forbidden("cannot view another user's role".into()));
    }
    let role = if user.user_id == user_id {
        user.role
    } else {
        queries::role::get_role(&state.pool, user_id).await?.unwrap_or_default()
    };
    Ok(Json(UserRoleResponse { user_id, role }))
}

pub async fn set_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<SetRoleRequest>,
) -> ApiResult<Json<UserRoleResponse>> {
    user.require_admin()?;
    queries::role::set_role(&state.pool, user_id, request.role).await?;
    info!(user_id = %user_id, role = request.role.as_str(), changed_by = %user.user_id, "Role assigned");
    Ok(Json(UserRoleResponse {
        user_id,
        role: request.role,
    }))
}
