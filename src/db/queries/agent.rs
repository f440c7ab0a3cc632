//! Agent database queries

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::types::{Agent, CreateAgentRequest, UpdateAgentRequest};

const AGENT_COLUMNS: &str = "id, agent_number, agent_name, active, created_at";

pub async fn list_agents(pool: &PgPool) -> Result<Vec<Agent>> {
    let query = format!("SELECT {} FROM agents ORDER BY agent_name", AGENT_COLUMNS);
    let agents = sqlx::query_as::<_, Agent>(&query).fetch_all(pool).await?;
    Ok(agents)
}

pub async fn create_agent(pool: &PgPool, request: &CreateAgentRequest) -> Result<Agent> {
    let query = format!(
        "INSERT INTO agents (id, agent_number, agent_name) VALUES ($1, $2, $3) RETURNING {}",
        AGENT_COLUMNS
    );
    let agent = sqlx::query_as::<_, Agent>(&query)
        .bind(Uuid::new_v4())
        .bind(request.agent_number.trim())
        .bind(request.agent_name.trim())
        .fetch_one(pool)
        .await?;
    Ok(agent)
}

pub async fn update_agent(pool: &PgPool, id: Uuid, request: &UpdateAgentRequest) -> Result<Option<Agent>> {
    let query = format!(
        r#"
        UPDATE agents SET
            agent_number = COALESCE($2, agent_number),
            agent_name = COALESCE($3, agent_name),
            active = COALESCE($4, active)
        WHERE id = $1
        RETURNING {}
        "#,
        AGENT_COLUMNS
    );
    let agent = sqlx::query_as::<_, Agent>(&query)
        .bind(id)
        .bind(request.agent_number.as_deref().map(str::trim))
        .bind(request.agent_name.as_deref().map(str::trim))
        .bind(request.active)
        .fetch_optional(pool)
        .await?;
    Ok(agent)
}

pub async fn delete_agent(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM agents WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
