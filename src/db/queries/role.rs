//! User role queries

use anyhow::Result;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::types::UserRole;

/// Stored role of a user; `None` when the user has no role row
pub async fn get_role(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRole>> {
    let role: Option<String> = sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(role.and_then(|r| {
        let parsed = UserRole::parse(&r);
        if parsed.is_none() {
            warn!(%user_id, role = %r, "Unknown role stored for user");
        }
        parsed
    }))
}

/// Insert or replace the role of a user
pub async fn set_role(pool: &PgPool, user_id: Uuid, role: UserRole) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_roles (id, user_id, role)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE SET role = EXCLUDED.role
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(role.as_str())
    .execute(pool)
    .await?;
    Ok(())
}
