//! Import orchestration, history and undo
//!
//! An import runs parse -> validate -> batch upload, then records a history
//! row holding the ids that were actually inserted. Undo deletes exactly those
//! ids and flags the history row.

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::queries;
use crate::error::{ApiError, ApiResult};
use crate::services::batch_uploader::{upload_in_batches, RecordSink};
use crate::services::csv_import::{parse_csv, validate_rows, ImportContext, ImportRecord};
use crate::types::{
    ImportCsvRequest, ImportHistoryEntry, ImportKind, ImportResponse, NewAdSpend,
    NewAppointment, NewCall, NewImportHistory, NewLead, ProjectRef, UndoImportResponse,
};

/// Row errors kept in the stored summary
const SUMMARY_ERROR_LIMIT: usize = 20;

#[async_trait]
pub trait ImportHistoryStore: Send + Sync {
    async fn record(&self, entry: NewImportHistory) -> Result<ImportHistoryEntry>;
    async fn get(&self, id: Uuid) -> Result<Option<ImportHistoryEntry>>;
    /// Most recent import of the same file that has not been undone
    async fn find_active_by_checksum(&self, kind: ImportKind, checksum: &str) -> Result<Option<Uuid>>;
    /// Flag an import undone. False when it was already undone.
    async fn mark_undone(&self, id: Uuid, undone_by: Option<Uuid>) -> Result<bool>;
}

pub struct PgImportHistoryStore {
    pool: PgPool,
}

impl PgImportHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImportHistoryStore for PgImportHistoryStore {
    async fn record(&self, entry: NewImportHistory) -> Result<ImportHistoryEntry> {
        queries::import::insert_history(&self.pool, &entry).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<ImportHistoryEntry>> {
        queries::import::get_history(&self.pool, id).await
    }

    async fn find_active_by_checksum(&self, kind: ImportKind, checksum: &str) -> Result<Option<Uuid>> {
        queries::import::find_active_by_checksum(&self.pool, kind.as_str(), checksum).await
    }

    async fn mark_undone(&self, id: Uuid, undone_by: Option<Uuid>) -> Result<bool> {
        queries::import::mark_undone(&self.pool, id, undone_by).await
    }
}

pub fn file_checksum(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

pub struct ImportService<'a> {
    sink: &'a dyn RecordSink,
    history: &'a dyn ImportHistoryStore,
}

impl<'a> ImportService<'a> {
    pub fn new(sink: &'a dyn RecordSink, history: &'a dyn ImportHistoryStore) -> Self {
        Self { sink, history }
    }

    /// Run a CSV import of `kind`. Row and batch failures are reported in the
    /// response; only an unreadable or empty file is an error.
    pub async fn import_csv(
        &self,
        kind: ImportKind,
        request: ImportCsvRequest,
        projects: Vec<ProjectRef>,
        imported_by: Option<Uuid>,
    ) -> ApiResult<ImportResponse> {
        match kind {
            ImportKind::Calls => self.run::<NewCall>(request, projects, imported_by).await,
            ImportKind::Leads => self.run::<NewLead>(request, projects, imported_by).await,
            ImportKind::Appointments => self.run::<NewAppointment>(request, projects, imported_by).await,
            ImportKind::AdSpend => self.run::<NewAdSpend>(request, projects, imported_by).await,
        }
    }

    async fn run<R: ImportRecord>(
        &self,
        request: ImportCsvRequest,
        projects: Vec<ProjectRef>,
        imported_by: Option<Uuid>,
    ) -> ApiResult<ImportResponse> {
        let kind = R::KIND;
        let parsed = parse_csv(kind, &request.csv_content)
            .map_err(|e| ApiError::validation(format!("Could not parse CSV: {:#}", e)))?;
        if parsed.rows.is_empty() {
            return Err(ApiError::validation("CSV file contains no records"));
        }

        let checksum = file_checksum(&request.csv_content);
        let duplicate_of = self.history.find_active_by_checksum(kind, &checksum).await?;
        if let Some(previous) = duplicate_of {
            warn!(import_type = kind.as_str(), %previous, "File was already imported");
        }

        let ctx = ImportContext::new(projects, request.project_name.clone());
        let validated = validate_rows::<R>(&parsed.rows, &ctx);
        let total_rows = validated.total_rows();

        let outcome = upload_in_batches(self.sink, &validated.records, &validated.lines).await?;
        let imported = outcome.inserted_ids.len();
        let failed = validated.errors.len() + outcome.failed_records;

        let summary = serde_json::json!({
            "total_rows": total_rows,
            "row_errors": validated.errors.iter().take(SUMMARY_ERROR_LIMIT).collect::<Vec<_>>(),
            "row_error_count": validated.errors.len(),
            "batch_errors": outcome.batch_errors,
        });

        let import_id = if imported > 0 {
            let entry = self
                .history
                .record(NewImportHistory {
                    file_name: request.file_name.clone(),
                    import_type: kind,
                    project_name: request.project_name.clone(),
                    records_imported: imported as i32,
                    records_failed: failed as i32,
                    imported_record_ids: outcome.inserted_ids.clone(),
                    file_checksum: checksum,
                    import_summary: summary,
                    imported_by,
                })
                .await?;
            Some(entry.id)
        } else {
            None
        };

        info!(
            import_type = kind.as_str(),
            file = %request.file_name,
            total_rows,
            imported,
            failed,
            "CSV import finished"
        );

        Ok(ImportResponse {
            import_id,
            import_type: kind,
            total_rows,
            imported,
            failed,
            row_errors: validated.errors,
            batch_errors: outcome.batch_errors,
            duplicate_of,
        })
    }

    /// Delete the records created by an import and mark it undone
    pub async fn undo(&self, import_id: Uuid, undone_by: Option<Uuid>) -> ApiResult<UndoImportResponse> {
        let entry = self
            .history
            .get(import_id)
            .await?
            .ok_or_else(|| ApiError::not_found("import"))?;

        if entry.is_undone {
            return Err(ApiError::Conflict(format!("import {} was already undone", import_id)));
        }

        let kind = entry
            .kind()
            .ok_or_else(|| anyhow::anyhow!("unknown import type '{}'", entry.import_type))?;

        let deleted = self
            .sink
            .delete_by_ids(kind.table(), &entry.imported_record_ids)
            .await?;
        // A concurrent undo may have flagged the import after the check above
        if !self.history.mark_undone(import_id, undone_by).await? {
            return Err(ApiError::Conflict(format!("import {} was already undone", import_id)));
        }

        if deleted as usize != entry.imported_record_ids.len() {
            warn!(
                %import_id,
                expected = entry.imported_record_ids.len(),
                deleted,
                "Undo removed fewer rows than were imported"
            );
        }
        info!(%import_id, deleted, "Import undone");

        Ok(UndoImportResponse {
            import_id,
            expected: entry.imported_record_ids.len(),
            deleted,
        })
    }
}
