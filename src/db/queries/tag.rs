//! Project tag and appointment tag queries

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::types::ProjectTag;

const TAG_COLUMNS: &str = "id, project_id, tag_name, tag_color, created_at";

pub async fn list_project_tags(pool: &PgPool, project_id: Uuid) -> Result<Vec<ProjectTag>> {
    let query = format!(
        "SELECT {} FROM project_tags WHERE project_id = $1 ORDER BY tag_name",
        TAG_COLUMNS
    );
    let tags = sqlx::query_as::<_, ProjectTag>(&query)
        .bind(project_id)
        .fetch_all(pool)
        .await?;
    Ok(tags)
}

pub async fn get_tag(pool: &PgPool, id: Uuid) -> Result<Option<ProjectTag>> {
    let query = format!("SELECT {} FROM project_tags WHERE id = $1", TAG_COLUMNS);
    let tag = sqlx::query_as::<_, ProjectTag>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(tag)
}

pub async fn create_tag(pool: &PgPool, project_id: Uuid, tag_name: &str, tag_color: &str) -> Result<ProjectTag> {
    let query = format!(
        "INSERT INTO project_tags (id, project_id, tag_name, tag_color) VALUES ($1, $2, $3, $4) RETURNING {}",
        TAG_COLUMNS
    );
    let tag = sqlx::query_as::<_, ProjectTag>(&query)
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(tag_name)
        .bind(tag_color)
        .fetch_one(pool)
        .await?;
    Ok(tag)
}

pub async fn delete_tag(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM project_tags WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Attach a tag; attaching twice is a no-op
pub async fn tag_appointment(pool: &PgPool, appointment_id: Uuid, tag_id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO appointment_tags (id, appointment_id, project_tag_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (appointment_id, project_tag_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(appointment_id)
    .bind(tag_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn untag_appointment(pool: &PgPool, appointment_id: Uuid, tag_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM appointment_tags WHERE appointment_id = $1 AND project_tag_id = $2")
        .bind(appointment_id)
        .bind(tag_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
