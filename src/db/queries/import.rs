//! Import queries: generic batch insert, undo deletion and import history

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::types::{ImportHistoryEntry, NewImportHistory};

const HISTORY_COLUMNS: &str = r#"
    id, file_name, import_type, project_name, records_imported, records_failed,
    imported_record_ids, file_checksum, import_summary, imported_by,
    is_undone, undone_at, undone_by, created_at
"#;

/// Insert JSON objects whose keys are column names of `table` in one statement.
/// `table` always comes from `ImportKind::table`.
pub async fn insert_json_rows(pool: &PgPool, table: &'static str, rows: Vec<serde_json::Value>) -> Result<Vec<Uuid>> {
    let query = format!(
        "INSERT INTO {table} SELECT * FROM jsonb_populate_recordset(NULL::{table}, $1) RETURNING id"
    );
    let ids = sqlx::query_scalar::<_, Uuid>(&query)
        .bind(serde_json::Value::Array(rows))
        .fetch_all(pool)
        .await
        .with_context(|| format!("insert into {} failed", table))?;
    Ok(ids)
}

pub async fn delete_rows_by_ids(pool: &PgPool, table: &'static str, ids: &[Uuid]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }
    let query = format!("DELETE FROM {} WHERE id = ANY($1)", table);
    let result = sqlx::query(&query).bind(ids).execute(pool).await?;
    Ok(result.rows_affected())
}

pub async fn insert_history(pool: &PgPool, entry: &NewImportHistory) -> Result<ImportHistoryEntry> {
    let query = format!(
        r#"
        INSERT INTO csv_import_history (id, file_name, import_type, project_name, records_imported,
                                        records_failed, imported_record_ids, file_checksum,
                                        import_summary, imported_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {}
        "#,
        HISTORY_COLUMNS
    );
    let row = sqlx::query_as::<_, ImportHistoryEntry>(&query)
        .bind(Uuid::new_v4())
        .bind(&entry.file_name)
        .bind(entry.import_type.as_str())
        .bind(&entry.project_name)
        .bind(entry.records_imported)
        .bind(entry.records_failed)
        .bind(&entry.imported_record_ids)
        .bind(&entry.file_checksum)
        .bind(&entry.import_summary)
        .bind(entry.imported_by)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

pub async fn get_history(pool: &PgPool, id: Uuid) -> Result<Option<ImportHistoryEntry>> {
    let query = format!("SELECT {} FROM csv_import_history WHERE id = $1", HISTORY_COLUMNS);
    let row = sqlx::query_as::<_, ImportHistoryEntry>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Newest first, with the total row count
pub async fn list_history(pool: &PgPool, limit: i64, offset: i64) -> Result<(Vec<ImportHistoryEntry>, i64)> {
    let query = format!(
        "SELECT {} FROM csv_import_history ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        HISTORY_COLUMNS
    );
    let rows = sqlx::query_as::<_, ImportHistoryEntry>(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM csv_import_history")
        .fetch_one(pool)
        .await?;

    Ok((rows, total.0))
}

pub async fn find_active_by_checksum(pool: &PgPool, import_type: &str, checksum: &str) -> Result<Option<Uuid>> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id FROM csv_import_history
        WHERE import_type = $1 AND file_checksum = $2 AND NOT is_undone
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(import_type)
    .bind(checksum)
    .fetch_optional(pool)
    .await?;
    Ok(id)
}

/// Flag an import undone; false if it already was
pub async fn mark_undone(pool: &PgPool, id: Uuid, undone_by: Option<Uuid>) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE csv_import_history SET is_undone = TRUE, undone_at = $2, undone_by = $3
        WHERE id = $1 AND NOT is_undone
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .bind(undone_by)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
