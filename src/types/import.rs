//! CSV import and import-history types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The kinds of records that can be imported from CSV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Calls,
    Leads,
    Appointments,
    AdSpend,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Calls => "calls",
            ImportKind::Leads => "leads",
            ImportKind::Appointments => "appointments",
            ImportKind::AdSpend => "ad_spend",
        }
    }

    /// Table the records of this kind are inserted into
    pub fn table(&self) -> &'static str {
        match self {
            ImportKind::Calls => "all_calls",
            ImportKind::Leads => "new_leads",
            ImportKind::Appointments => "all_appointments",
            ImportKind::AdSpend => "facebook_ad_spend",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "calls" | "all_calls" => Some(ImportKind::Calls),
            "leads" | "new_leads" => Some(ImportKind::Leads),
            "appointments" | "all_appointments" => Some(ImportKind::Appointments),
            "ad_spend" | "adspend" | "facebook_ad_spend" => Some(ImportKind::AdSpend),
            _ => None,
        }
    }
}

/// One rejected row. `row` is the 1-based line number in the file
/// (the header is line 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub error: String,
}

/// Request body of a CSV upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportCsvRequest {
    pub file_name: String,
    pub csv_content: String,
    /// Project applied to rows that do not name one
    #[serde(default)]
    pub project_name: Option<String>,
}

/// Outcome of a CSV upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub import_id: Option<Uuid>,
    pub import_type: ImportKind,
    pub total_rows: usize,
    pub imported: usize,
    pub failed: usize,
    pub row_errors: Vec<RowError>,
    pub batch_errors: Vec<String>,
    /// Earlier, still active import of the same file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<Uuid>,
}

/// Row of `csv_import_history`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ImportHistoryEntry {
    pub id: Uuid,
    pub file_name: String,
    pub import_type: String,
    pub project_name: Option<String>,
    pub records_imported: i32,
    pub records_failed: i32,
    pub imported_record_ids: Vec<Uuid>,
    pub file_checksum: String,
    pub import_summary: Option<serde_json::Value>,
    pub imported_by: Option<Uuid>,
    pub is_undone: bool,
    pub undone_at: Option<DateTime<Utc>>,
    pub undone_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ImportHistoryEntry {
    pub fn kind(&self) -> Option<ImportKind> {
        ImportKind::parse(&self.import_type)
    }
}

/// History row to be recorded after an import
#[derive(Debug, Clone)]
pub struct NewImportHistory {
    pub file_name: String,
    pub import_type: ImportKind,
    pub project_name: Option<String>,
    pub records_imported: i32,
    pub records_failed: i32,
    pub imported_record_ids: Vec<Uuid>,
    pub file_checksum: String,
    pub import_summary: serde_json::Value,
    pub imported_by: Option<Uuid>,
}

/// Result of undoing an import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoImportResponse {
    pub import_id: Uuid,
    pub expected: usize,
    pub deleted: u64,
}
