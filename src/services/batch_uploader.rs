//! Sequential batch insertion of validated import records
//!
//! Records are sent in chunks of [`BATCH_SIZE`], one chunk at a time. A chunk
//! that fails is reported as an error string and the upload moves on to the
//! next one; chunks that already succeeded stay in place.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::defaults::BATCH_SIZE;
use crate::services::csv_import::ImportRecord;

/// Destination of imported rows
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Insert rows into `table`, returning the ids that were stored
    async fn insert_batch(&self, table: &'static str, rows: Vec<serde_json::Value>) -> Result<Vec<Uuid>>;

    /// Delete rows of `table` whose id is in `ids`, returning the number deleted
    async fn delete_by_ids(&self, table: &'static str, ids: &[Uuid]) -> Result<u64>;
}

/// Postgres sink. Each row is a JSON object whose keys are column names.
pub struct PgRecordSink {
    pool: PgPool,
}

impl PgRecordSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordSink for PgRecordSink {
    async fn insert_batch(&self, table: &'static str, rows: Vec<serde_json::Value>) -> Result<Vec<Uuid>> {
        crate::db::queries::import::insert_json_rows(&self.pool, table, rows).await
    }

    async fn delete_by_ids(&self, table: &'static str, ids: &[Uuid]) -> Result<u64> {
        crate::db::queries::import::delete_rows_by_ids(&self.pool, table, ids).await
    }
}

/// What happened to an upload
#[derive(Debug, Clone, Default)]
pub struct UploadOutcome {
    pub inserted_ids: Vec<Uuid>,
    /// Records in batches that failed
    pub failed_records: usize,
    pub batch_errors: Vec<String>,
}

/// Insert `records` in chunks of [`BATCH_SIZE`]. `lines` holds the file line
/// of each record and is only used to label failed batches.
pub async fn upload_in_batches<R: ImportRecord>(
    sink: &dyn RecordSink,
    records: &[R],
    lines: &[usize],
) -> Result<UploadOutcome> {
    let table = R::KIND.table();
    let mut outcome = UploadOutcome::default();

    for (batch_idx, chunk) in records.chunks(BATCH_SIZE).enumerate() {
        let batch_number = batch_idx + 1;
        let start = batch_idx * BATCH_SIZE;
        let rows = chunk
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .context("failed to serialize import batch")?;

        match sink.insert_batch(table, rows).await {
            Ok(ids) => {
                debug!(table, batch_number, inserted = ids.len(), "Import batch inserted");
                outcome.inserted_ids.extend(ids);
            }
            Err(e) => {
                let first = lines.get(start).copied().unwrap_or(start + 2);
                let last = lines.get(start + chunk.len() - 1).copied().unwrap_or(first);
                warn!(table, batch_number, "Import batch failed: {:#}", e);
                outcome.failed_records += chunk.len();
                outcome
                    .batch_errors
                    .push(format!("Batch {} (rows {}-{}): {}", batch_number, first, last, e));
            }
        }
    }

    Ok(outcome)
}
