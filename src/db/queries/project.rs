//! Project database queries

use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::defaults::DEFAULT_TIMEZONE;
use crate::types::{CreateProjectRequest, Project, ProjectRef, UpdateProjectRequest};

const PROJECT_COLUMNS: &str = r#"
    id, project_name, active, timezone, appointment_webhook_url,
    ghl_api_key, ghl_location_id, ghl_calendar_id, created_at, updated_at
"#;

pub async fn list_projects(pool: &PgPool) -> Result<Vec<Project>> {
    let query = format!("SELECT {} FROM projects ORDER BY project_name", PROJECT_COLUMNS);
    let projects = sqlx::query_as::<_, Project>(&query).fetch_all(pool).await?;
    Ok(projects)
}

/// Id and name of every project, for import validation
pub async fn list_project_refs(pool: &PgPool) -> Result<Vec<ProjectRef>> {
    let refs = sqlx::query_as::<_, ProjectRef>("SELECT id, project_name FROM projects ORDER BY project_name")
        .fetch_all(pool)
        .await?;
    Ok(refs)
}

pub async fn get_project(pool: &PgPool, id: Uuid) -> Result<Option<Project>> {
    let query = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);
    let project = sqlx::query_as::<_, Project>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(project)
}

/// Case-insensitive lookup by name
pub async fn get_project_by_name(pool: &PgPool, name: &str) -> Result<Option<Project>> {
    let query = format!(
        "SELECT {} FROM projects WHERE lower(project_name) = lower($1)",
        PROJECT_COLUMNS
    );
    let project = sqlx::query_as::<_, Project>(&query)
        .bind(name.trim())
        .fetch_optional(pool)
        .await?;
    Ok(project)
}

pub async fn create_project(pool: &PgPool, request: &CreateProjectRequest) -> Result<Project> {
    let query = format!(
        r#"
        INSERT INTO projects (id, project_name, timezone, appointment_webhook_url,
                              ghl_api_key, ghl_location_id, ghl_calendar_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {}
        "#,
        PROJECT_COLUMNS
    );
    let project = sqlx::query_as::<_, Project>(&query)
        .bind(Uuid::new_v4())
        .bind(request.project_name.trim())
        .bind(request.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE))
        .bind(&request.appointment_webhook_url)
        .bind(&request.ghl_api_key)
        .bind(&request.ghl_location_id)
        .bind(&request.ghl_calendar_id)
        .fetch_one(pool)
        .await?;
    Ok(project)
}

/// Apply a partial update; returns `None` when the project does not exist
pub async fn update_project(pool: &PgPool, id: Uuid, request: &UpdateProjectRequest) -> Result<Option<Project>> {
    let query = format!(
        r#"
        UPDATE projects SET
            project_name = COALESCE($2, project_name),
            active = COALESCE($3, active),
            timezone = COALESCE($4, timezone),
            appointment_webhook_url = COALESCE($5, appointment_webhook_url),
            ghl_api_key = COALESCE($6, ghl_api_key),
            ghl_location_id = COALESCE($7, ghl_location_id),
            ghl_calendar_id = COALESCE($8, ghl_calendar_id),
            updated_at = $9
        WHERE id = $1
        RETURNING {}
        "#,
        PROJECT_COLUMNS
    );
    let project = sqlx::query_as::<_, Project>(&query)
        .bind(id)
        .bind(request.project_name.as_deref().map(str::trim))
        .bind(request.active)
        .bind(&request.timezone)
        .bind(&request.appointment_webhook_url)
        .bind(&request.ghl_api_key)
        .bind(&request.ghl_location_id)
        .bind(&request.ghl_calendar_id)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?;
    Ok(project)
}

pub async fn delete_project(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
