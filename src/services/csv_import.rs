//! CSV parsing and per-record validation for imports
//!
//! Every data row is validated independently. A bad row yields exactly one
//! [`RowError`] (the first check it fails) and never stops the rest of the
//! file from being processed. Row numbers are 1-based file line numbers, so
//! the first data row under the header is row 2.
//!
//! The same validators back the JSON ingestion endpoints: a JSON object is
//! turned into a [`CsvRow`] and run through [`ImportRecord::from_row`].

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::types::{
    normalize_call_outcome, AppointmentStatus, ImportKind, LeadStatus, NewAdSpend,
    NewAppointment, NewCall, NewLead, ProjectRef, RowError,
};

// =============================================================================
// ROWS
// =============================================================================

/// A single data row keyed by canonical field name
#[derive(Debug, Clone, Default)]
pub struct CsvRow {
    pub line: usize,
    fields: HashMap<String, String>,
}

impl CsvRow {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            fields: HashMap::new(),
        }
    }

    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.fields.insert(field.to_string(), value.to_string());
        self
    }

    /// Trimmed, non-empty value of `field`
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn owned(&self, field: &str) -> Option<String> {
        self.get(field).map(str::to_string)
    }

    fn is_blank(&self) -> bool {
        self.fields.values().all(|v| v.trim().is_empty())
    }

    /// Build a row from a JSON object body. Keys go through the same header
    /// aliasing as CSV columns; scalars are stringified, nulls dropped.
    pub fn from_json(kind: ImportKind, value: &serde_json::Value) -> Result<Self> {
        let object = value
            .as_object()
            .context("request body must be a JSON object")?;
        let mut row = CsvRow::new(1);
        for (key, v) in object {
            let text = match v {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            row.fields.insert(canonical_field(kind, key), text);
        }
        Ok(row)
    }
}

/// Parsed CSV file: canonical headers and data rows
#[derive(Debug, Clone)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
}

/// Parse CSV text for `kind`. Headers are normalised and aliased to the
/// canonical column names; fully blank rows are skipped.
pub fn parse_csv(kind: ImportKind, content: &str) -> Result<ParsedCsv> {
    let content = content.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("failed to read CSV header row")?
        .iter()
        .map(|h| canonical_field(kind, h))
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        anyhow::bail!("CSV header row is empty");
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("malformed CSV near data row {}", idx + 1))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);

        let mut row = CsvRow::new(line);
        for (header, value) in headers.iter().zip(record.iter()) {
            if !header.is_empty() {
                row.fields.insert(header.clone(), value.to_string());
            }
        }
        if !row.is_blank() {
            rows.push(row);
        }
    }

    Ok(ParsedCsv { headers, rows })
}

/// Lowercase, collapse punctuation to `_`, then resolve per-kind aliases
pub fn canonical_field(kind: ImportKind, header: &str) -> String {
    let mut normalized = String::with_capacity(header.len());
    for c in header.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            normalized.push(c);
        } else if !normalized.ends_with('_') {
            normalized.push('_');
        }
    }
    let normalized = normalized.trim_matches('_').to_string();

    aliases(kind)
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(normalized)
}

fn aliases(kind: ImportKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        ImportKind::Calls => &[
            ("project", "project_name"),
            ("name", "lead_name"),
            ("lead", "lead_name"),
            ("phone", "lead_phone_number"),
            ("phone_number", "lead_phone_number"),
            ("lead_phone", "lead_phone_number"),
            ("datetime", "call_datetime"),
            ("date_time", "call_datetime"),
            ("call_time", "call_datetime"),
            ("call_date_time", "call_datetime"),
            ("caller", "caller_phone_number"),
            ("caller_number", "caller_phone_number"),
            ("agent_name", "agent"),
            ("outcome", "call_outcome"),
            ("disposition", "call_outcome"),
            ("duration", "duration_seconds"),
            ("call_duration", "duration_seconds"),
            ("call_duration_seconds", "duration_seconds"),
            ("campaign", "campaign_name"),
        ],
        ImportKind::Leads => &[
            ("project", "project_name"),
            ("name", "lead_name"),
            ("full_name", "lead_name"),
            ("phone", "phone_number"),
            ("lead_phone_number", "phone_number"),
            ("email_address", "email"),
            ("lead_date", "date"),
            ("date_created", "date"),
            ("created", "date"),
            ("lead_source", "source"),
        ],
        ImportKind::Appointments => &[
            ("project", "project_name"),
            ("name", "lead_name"),
            ("email", "lead_email"),
            ("phone", "lead_phone_number"),
            ("phone_number", "lead_phone_number"),
            ("appointment_date", "date_of_appointment"),
            ("date", "date_of_appointment"),
            ("time", "requested_time"),
            ("appointment_time", "requested_time"),
            ("created", "date_appointment_created"),
            ("date_created", "date_appointment_created"),
            ("booked_on", "date_appointment_created"),
            ("calendar", "calendar_name"),
        ],
        ImportKind::AdSpend => &[
            ("project_name", "project"),
            ("project_id", "project"),
            ("day", "date"),
            ("reporting_starts", "date"),
            ("amount_spent", "spend"),
            ("amount_spent_usd", "spend"),
            ("cost", "spend"),
            ("campaign", "campaign_name"),
            ("link_clicks", "clicks"),
        ],
    }
}

// =============================================================================
// VALIDATION CONTEXT
// =============================================================================

/// Why a row was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Option<String>,
    pub message: String,
}

impl FieldError {
    pub fn missing(field: &str) -> Self {
        Self {
            field: Some(field.to_string()),
            message: format!("Missing required field '{}'", field),
        }
    }

    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }

    pub fn into_row_error(self, row: usize) -> RowError {
        RowError {
            row,
            field: self.field,
            error: self.message,
        }
    }
}

/// Lookup data shared by all rows of one import
#[derive(Debug, Clone)]
pub struct ImportContext {
    default_project: Option<String>,
    projects_by_name: HashMap<String, ProjectRef>,
    projects_by_id: HashMap<Uuid, ProjectRef>,
    pub now: DateTime<Utc>,
}

impl ImportContext {
    pub fn new(projects: Vec<ProjectRef>, default_project: Option<String>) -> Self {
        let projects_by_name = projects
            .iter()
            .map(|p| (p.project_name.trim().to_lowercase(), p.clone()))
            .collect();
        let projects_by_id = projects.into_iter().map(|p| (p.id, p)).collect();
        Self {
            default_project: default_project.filter(|p| !p.trim().is_empty()),
            projects_by_name,
            projects_by_id,
            now: Utc::now(),
        }
    }

    /// Resolve the project of a row, falling back to the import's default.
    /// Accepts a project name (case-insensitive) or id.
    pub fn resolve_project(&self, row: &CsvRow, field: &str) -> Result<ProjectRef, FieldError> {
        let raw = row
            .get(field)
            .or(self.default_project.as_deref())
            .ok_or_else(|| FieldError::missing(field))?;

        if let Some(project) = self.projects_by_name.get(&raw.trim().to_lowercase()) {
            return Ok(project.clone());
        }
        if let Ok(id) = Uuid::parse_str(raw.trim()) {
            if let Some(project) = self.projects_by_id.get(&id) {
                return Ok(project.clone());
            }
        }
        Err(FieldError::invalid(field, format!("Unknown project '{}'", raw)))
    }
}

// =============================================================================
// RECORD VALIDATION
// =============================================================================

/// A record type that can be built from an import row
pub trait ImportRecord: serde::Serialize + Send + Sync + Sized {
    const KIND: ImportKind;

    fn from_row(row: &CsvRow, ctx: &ImportContext) -> Result<Self, FieldError>;

    fn id(&self) -> Uuid;
}

/// Valid records and rejected rows of one file
#[derive(Debug, Clone)]
pub struct Validated<R> {
    pub records: Vec<R>,
    /// File line of each record, parallel to `records`
    pub lines: Vec<usize>,
    pub errors: Vec<RowError>,
}

impl<R> Validated<R> {
    pub fn total_rows(&self) -> usize {
        self.records.len() + self.errors.len()
    }
}

pub fn validate_rows<R: ImportRecord>(rows: &[CsvRow], ctx: &ImportContext) -> Validated<R> {
    let mut records = Vec::with_capacity(rows.len());
    let mut lines = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();

    for row in rows {
        match R::from_row(row, ctx) {
            Ok(record) => {
                records.push(record);
                lines.push(row.line);
            }
            Err(e) => errors.push(e.into_row_error(row.line)),
        }
    }

    Validated {
        records,
        lines,
        errors,
    }
}

fn required<'a>(row: &'a CsvRow, field: &str) -> Result<&'a str, FieldError> {
    row.get(field).ok_or_else(|| FieldError::missing(field))
}

fn optional_phone(row: &CsvRow, field: &str) -> Result<Option<String>, FieldError> {
    match row.get(field) {
        Some(raw) => validate_phone(field, raw).map(Some),
        None => Ok(None),
    }
}

fn validate_phone(field: &str, raw: &str) -> Result<String, FieldError> {
    let digits = raw.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits) {
        return Err(FieldError::invalid(field, format!("Invalid phone number '{}'", raw)));
    }
    Ok(raw.trim().to_string())
}

fn optional_email(row: &CsvRow, field: &str) -> Result<Option<String>, FieldError> {
    match row.get(field) {
        Some(raw) if is_valid_email(raw) => Ok(Some(raw.to_lowercase())),
        Some(raw) => Err(FieldError::invalid(field, format!("Invalid email '{}'", raw))),
        None => Ok(None),
    }
}

pub fn is_valid_email(s: &str) -> bool {
    let s = s.trim();
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Digits-only phone key (last 10 digits) for matching calls to leads
pub fn phone_key(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 7 {
        return None;
    }
    let start = digits.len().saturating_sub(10);
    Some(digits[start..].to_string())
}

fn date_field(row: &CsvRow, field: &str) -> Result<Option<NaiveDate>, FieldError> {
    match row.get(field) {
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| FieldError::invalid(field, format!("Invalid date '{}'", raw))),
        None => Ok(None),
    }
}

/// Accepts `YYYY-MM-DD`, `MM/DD/YYYY`, `M/D/YY`, or the date part of a datetime
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    // Two-digit years first: `%Y` would read "24" as year 24.
    for format in ["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }
    parse_datetime(s).map(|dt| dt.date_naive())
}

/// Accepts RFC 3339 and common naive layouts. Naive values are taken as UTC.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%m/%d/%Y %I:%M %p",
        "%m/%d/%Y %I:%M:%S %p",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Accepts `HH:MM`, `HH:MM:SS` and `H:MM AM`
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    for format in ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p", "%I %p"] {
        if let Ok(time) = NaiveTime::parse_from_str(s, format) {
            return Some(time);
        }
    }
    None
}

/// Parses a decimal, ignoring `$`, thousands separators and surrounding spaces
pub fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn optional_int(row: &CsvRow, field: &str) -> Result<Option<i64>, FieldError> {
    match row.get(field) {
        Some(raw) => match parse_number(raw) {
            Some(n) if n >= 0.0 && n.fract() == 0.0 => Ok(Some(n as i64)),
            _ => Err(FieldError::invalid(
                field,
                format!("Expected a whole non-negative number, got '{}'", raw),
            )),
        },
        None => Ok(None),
    }
}

/// Call durations may be plain seconds or `MM:SS` / `HH:MM:SS`
fn parse_duration_seconds(raw: &str) -> Option<i32> {
    if raw.contains(':') {
        let mut total: i64 = 0;
        for part in raw.trim().split(':') {
            let n: i64 = part.trim().parse().ok()?;
            if n < 0 {
                return None;
            }
            total = total.checked_mul(60)?.checked_add(n)?;
        }
        return i32::try_from(total).ok();
    }
    let n = parse_number(raw)?.round();
    (0.0..=f64::from(i32::MAX)).contains(&n).then(|| n as i32)
}

fn optional_bool(row: &CsvRow, field: &str) -> Result<Option<bool>, FieldError> {
    match row.get(field) {
        Some(raw) => match raw.to_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "x" => Ok(Some(true)),
            "false" | "no" | "n" | "0" => Ok(Some(false)),
            _ => Err(FieldError::invalid(field, format!("Expected yes/no, got '{}'", raw))),
        },
        None => Ok(None),
    }
}

impl ImportRecord for NewCall {
    const KIND: ImportKind = ImportKind::Calls;

    fn from_row(row: &CsvRow, ctx: &ImportContext) -> Result<Self, FieldError> {
        let project = ctx.resolve_project(row, "project_name")?;
        let lead_name = required(row, "lead_name")?;
        let phone = validate_phone("lead_phone_number", required(row, "lead_phone_number")?)?;
        let raw_datetime = required(row, "call_datetime")?;
        let call_datetime = parse_datetime(raw_datetime)
            .or_else(|| parse_date(raw_datetime).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|n| n.and_utc()))
            .ok_or_else(|| FieldError::invalid("call_datetime", format!("Invalid date/time '{}'", raw_datetime)))?;
        let date = date_field(row, "date")?.unwrap_or_else(|| call_datetime.date_naive());

        let duration_seconds = match row.get("duration_seconds") {
            Some(raw) => Some(parse_duration_seconds(raw).ok_or_else(|| {
                FieldError::invalid("duration_seconds", format!("Invalid call duration '{}'", raw))
            })?),
            None => None,
        };

        Ok(NewCall {
            id: Uuid::new_v4(),
            project_name: project.project_name,
            date,
            call_datetime,
            lead_name: lead_name.to_string(),
            lead_phone_number: phone,
            caller_phone_number: optional_phone(row, "caller_phone_number")?,
            agent: row.owned("agent"),
            call_outcome: row.get("call_outcome").and_then(normalize_call_outcome),
            duration_seconds,
            campaign_name: row.owned("campaign_name"),
            created_at: ctx.now,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl ImportRecord for NewLead {
    const KIND: ImportKind = ImportKind::Leads;

    fn from_row(row: &CsvRow, ctx: &ImportContext) -> Result<Self, FieldError> {
        let project = ctx.resolve_project(row, "project_name")?;

        let first_name = row.owned("first_name");
        let last_name = row.owned("last_name");
        let lead_name = match row.owned("lead_name") {
            Some(name) => name,
            None => {
                let joined = [first_name.as_deref(), last_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                if joined.is_empty() {
                    return Err(FieldError::missing("lead_name"));
                }
                joined
            }
        };

        let date = date_field(row, "date")?.ok_or_else(|| FieldError::missing("date"))?;

        let email = optional_email(row, "email")?;
        let phone_number = optional_phone(row, "phone_number")?;
        if email.is_none() && phone_number.is_none() {
            return Err(FieldError {
                field: Some("email".into()),
                message: "Either 'email' or 'phone_number' is required".into(),
            });
        }

        let status = match row.get("status") {
            Some(raw) => LeadStatus::parse(raw)
                .ok_or_else(|| FieldError::invalid("status", format!("Unknown lead status '{}'", raw)))?,
            None => LeadStatus::New,
        };

        Ok(NewLead {
            id: Uuid::new_v4(),
            project_name: project.project_name,
            date,
            lead_name,
            first_name,
            last_name,
            email,
            phone_number,
            source: row.owned("source"),
            status: status.as_str().to_string(),
            notes: row.owned("notes"),
            created_at: ctx.now,
            updated_at: ctx.now,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl ImportRecord for NewAppointment {
    const KIND: ImportKind = ImportKind::Appointments;

    fn from_row(row: &CsvRow, ctx: &ImportContext) -> Result<Self, FieldError> {
        let project = ctx.resolve_project(row, "project_name")?;
        let lead_name = required(row, "lead_name")?;
        let date_of_appointment = date_field(row, "date_of_appointment")?
            .ok_or_else(|| FieldError::missing("date_of_appointment"))?;

        let requested_time = match row.get("requested_time") {
            Some(raw) => Some(parse_time(raw).ok_or_else(|| {
                FieldError::invalid("requested_time", format!("Invalid time '{}'", raw))
            })?),
            None => None,
        };

        let status = match row.get("status") {
            Some(raw) => Some(AppointmentStatus::parse(raw).ok_or_else(|| {
                FieldError::invalid("status", format!("Unknown appointment status '{}'", raw))
            })?),
            None => None,
        };

        let date_appointment_created = date_field(row, "date_appointment_created")?
            .unwrap_or_else(|| ctx.now.date_naive());

        let confirmed = optional_bool(row, "confirmed")?
            .unwrap_or(status == Some(AppointmentStatus::Confirmed));
        let showed = match optional_bool(row, "showed")? {
            Some(showed) => Some(showed),
            None => status.and_then(|s| s.implied_showed()),
        };

        Ok(NewAppointment {
            id: Uuid::new_v4(),
            project_name: project.project_name,
            lead_name: lead_name.to_string(),
            lead_email: optional_email(row, "lead_email")?,
            lead_phone_number: optional_phone(row, "lead_phone_number")?,
            date_appointment_created,
            date_of_appointment: Some(date_of_appointment),
            requested_time,
            status: status.map(|s| s.as_str().to_string()),
            agent: row.owned("agent"),
            agent_number: row.owned("agent_number"),
            calendar_name: row.owned("calendar_name"),
            confirmed,
            showed,
            internal_process_complete: false,
            created_at: ctx.now,
            updated_at: ctx.now,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl ImportRecord for NewAdSpend {
    const KIND: ImportKind = ImportKind::AdSpend;

    fn from_row(row: &CsvRow, ctx: &ImportContext) -> Result<Self, FieldError> {
        let project = ctx.resolve_project(row, "project")?;
        let date = date_field(row, "date")?.ok_or_else(|| FieldError::missing("date"))?;

        let raw_spend = required(row, "spend")?;
        let spend = parse_number(raw_spend)
            .filter(|n| *n >= 0.0)
            .ok_or_else(|| FieldError::invalid("spend", format!("Invalid spend amount '{}'", raw_spend)))?;

        Ok(NewAdSpend {
            id: Uuid::new_v4(),
            project_id: project.id,
            date,
            spend: (spend * 100.0).round() / 100.0,
            campaign_name: row.owned("campaign_name"),
            impressions: optional_int(row, "impressions")?,
            clicks: optional_int(row, "clicks")?,
            created_at: ctx.now,
        })
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ImportContext {
        ImportContext::new(
            vec![
                ProjectRef { id: Uuid::new_v4(), project_name: "Smile Dental".into() },
                ProjectRef { id: Uuid::new_v4(), project_name: "Vein Center".into() },
            ],
            None,
        )
    }

    fn validate<R: ImportRecord>(kind: ImportKind, csv: &str, ctx: &ImportContext) -> Validated<R> {
        let parsed = parse_csv(kind, csv).unwrap();
        validate_rows::<R>(&parsed.rows, ctx)
    }

    #[test]
    fn headers_are_normalised_and_aliased() {
        assert_eq!(canonical_field(ImportKind::Calls, " Phone "), "lead_phone_number");
        assert_eq!(canonical_field(ImportKind::Leads, "Phone"), "phone_number");
        assert_eq!(canonical_field(ImportKind::AdSpend, "Amount spent (USD)"), "spend");
        assert_eq!(canonical_field(ImportKind::Calls, "Lead Name"), "lead_name");
    }

    #[test]
    fn missing_required_field_reports_one_error_with_line_number() {
        let csv = "project_name,lead_name,lead_phone_number,call_datetime\n\
                   Smile Dental,Ann Lee,555-123-4567,2024-03-01 10:00\n\
                   Smile Dental,,555-123-9999,2024-03-01 11:00\n\
                   Smile Dental,Bo Chen,555-222-1111,2024-03-01 12:00\n";
        let v = validate::<NewCall>(ImportKind::Calls, csv, &ctx());

        assert_eq!(v.records.len(), 2);
        assert_eq!(v.errors.len(), 1);
        assert_eq!(v.errors[0].row, 3);
        assert_eq!(v.errors[0].field.as_deref(), Some("lead_name"));
        assert_eq!(v.lines, vec![2, 4]);
    }

    #[test]
    fn row_with_several_problems_reports_only_the_first() {
        let csv = "project_name,lead_name,lead_phone_number,call_datetime\n\
                   Smile Dental,,not-a-phone,yesterday\n";
        let v = validate::<NewCall>(ImportKind::Calls, csv, &ctx());
        assert_eq!(v.errors.len(), 1);
        assert_eq!(v.errors[0].row, 2);
    }

    #[test]
    fn every_bad_row_is_reported_without_aborting() {
        let mut csv = String::from("project_name,lead_name,lead_phone_number,call_datetime\n");
        for i in 0..10 {
            if i % 2 == 0 {
                csv.push_str("Smile Dental,Someone,5551234567,\n");
            } else {
                csv.push_str("Smile Dental,Someone,5551234567,2024-01-01T09:00:00Z\n");
            }
        }
        let v = validate::<NewCall>(ImportKind::Calls, &csv, &ctx());
        assert_eq!(v.records.len(), 5);
        let rows: Vec<usize> = v.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![2, 4, 6, 8, 10]);
        assert_eq!(v.total_rows(), 10);
    }

    #[test]
    fn quoted_multiline_fields_keep_file_line_numbers() {
        let csv = "project_name,lead_name,lead_phone_number,call_datetime,campaign_name\n\
                   Smile Dental,Ann,5551234567,2024-03-01 10:00,\"spring\npromo\"\n\
                   Smile Dental,,5551234567,2024-03-01 10:00,x\n";
        let v = validate::<NewCall>(ImportKind::Calls, csv, &ctx());
        assert_eq!(v.records[0].campaign_name.as_deref(), Some("spring\npromo"));
        assert_eq!(v.errors[0].row, 4);
    }

    #[test]
    fn unknown_project_is_rejected_and_default_project_applies() {
        let csv = "lead_name,lead_phone_number,call_datetime,project_name\n\
                   Ann,5551234567,2024-03-01 10:00,Nowhere Clinic\n\
                   Bo,5551234567,2024-03-01 10:00,\n";
        let ctx = ImportContext::new(
            vec![ProjectRef { id: Uuid::new_v4(), project_name: "Smile Dental".into() }],
            Some("smile dental".into()),
        );
        let v = validate::<NewCall>(ImportKind::Calls, csv, &ctx);
        assert_eq!(v.errors.len(), 1);
        assert!(v.errors[0].error.contains("Nowhere Clinic"));
        assert_eq!(v.records[0].project_name, "Smile Dental");
    }

    #[test]
    fn call_fields_are_parsed() {
        let csv = "Project,Name,Phone,Date Time,Duration,Outcome,Agent\n\
                   Vein Center,Ann,(555) 123-4567,03/01/2024 2:30 PM,4:05,VM,A-1\n";
        let v = validate::<NewCall>(ImportKind::Calls, csv, &ctx());
        let call = &v.records[0];
        assert_eq!(call.duration_seconds, Some(245));
        assert_eq!(call.call_outcome.as_deref(), Some("voicemail"));
        assert_eq!(call.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(call.call_datetime.to_rfc3339(), "2024-03-01T14:30:00+00:00");
    }

    #[test]
    fn oversized_durations_are_row_errors() {
        let csv = "project_name,lead_name,lead_phone_number,call_datetime,duration\n\
                   Smile Dental,Ann,5551234567,2024-03-01 10:00,9223372036854775807:00\n\
                   Smile Dental,Bo,5551234567,2024-03-01 10:00,99999999999\n\
                   Smile Dental,Cy,5551234567,2024-03-01 10:00,1:00:00\n";
        let v = validate::<NewCall>(ImportKind::Calls, csv, &ctx());
        let rows: Vec<usize> = v.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![2, 3]);
        assert!(v.errors.iter().all(|e| e.field.as_deref() == Some("duration_seconds")));
        assert_eq!(v.records[0].duration_seconds, Some(3600));
    }

    #[test]
    fn leads_need_email_or_phone() {
        let csv = "project_name,lead_name,date,email,phone_number\n\
                   Smile Dental,Ann,2024-02-02,,\n\
                   Smile Dental,Bo,2024-02-02,bo@example.com,\n\
                   Smile Dental,Cy,2024-02-02,,555-000-1234\n\
                   Smile Dental,Di,2024-02-02,not-an-email,\n";
        let v = validate::<NewLead>(ImportKind::Leads, csv, &ctx());
        assert_eq!(v.records.len(), 2);
        assert_eq!(v.errors.iter().map(|e| e.row).collect::<Vec<_>>(), vec![2, 5]);
    }

    #[test]
    fn lead_name_falls_back_to_first_and_last() {
        let csv = "project_name,first_name,last_name,date,email,status\n\
                   Smile Dental,Ann,Lee,2/3/24,ann@example.com,Contacted\n";
        let v = validate::<NewLead>(ImportKind::Leads, csv, &ctx());
        assert_eq!(v.records[0].lead_name, "Ann Lee");
        assert_eq!(v.records[0].status, "contacted");
        assert_eq!(v.records[0].date, NaiveDate::from_ymd_opt(2024, 2, 3).unwrap());
    }

    #[test]
    fn appointment_status_must_be_known() {
        let csv = "project_name,lead_name,date_of_appointment,status,time\n\
                   Smile Dental,Ann,2024-05-01,Showed,9:30 AM\n\
                   Smile Dental,Bo,2024-05-01,Maybe,\n";
        let v = validate::<NewAppointment>(ImportKind::Appointments, csv, &ctx());
        assert_eq!(v.records.len(), 1);
        assert_eq!(v.records[0].showed, Some(true));
        assert_eq!(v.records[0].requested_time, NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(v.errors[0].field.as_deref(), Some("status"));
    }

    #[test]
    fn ad_spend_accepts_currency_and_project_ids() {
        let project_id = Uuid::new_v4();
        let ctx = ImportContext::new(
            vec![ProjectRef { id: project_id, project_name: "Smile Dental".into() }],
            None,
        );
        let csv = format!(
            "Project ID,Day,Amount spent (USD),Impressions\n\
             {project_id},2024-01-05,\"$1,234.567\",1000\n\
             Smile Dental,2024-01-06,-5,10\n\
             Smile Dental,2024-01-07,12.5,lots\n"
        );
        let v = validate::<NewAdSpend>(ImportKind::AdSpend, &csv, &ctx);
        assert_eq!(v.records.len(), 1);
        assert_eq!(v.records[0].spend, 1234.57);
        assert_eq!(v.records[0].project_id, project_id);
        assert_eq!(v.errors.iter().map(|e| e.row).collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn blank_rows_are_skipped() {
        let csv = "project_name,lead_name,date,email\n,,,\nSmile Dental,Ann,2024-01-01,a@b.co\n";
        let parsed = parse_csv(ImportKind::Leads, csv).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].line, 3);
    }

    #[test]
    fn json_rows_use_the_same_rules() {
        let body = serde_json::json!({
            "project": "Smile Dental",
            "name": "Ann",
            "phone": "555-123-4567",
            "call_datetime": "2024-03-01T10:00:00-05:00",
            "duration": 90,
            "agent": null
        });
        let row = CsvRow::from_json(ImportKind::Calls, &body).unwrap();
        let call = NewCall::from_row(&row, &ctx()).unwrap();
        assert_eq!(call.duration_seconds, Some(90));
        assert_eq!(call.agent, None);
        assert_eq!(call.call_datetime.to_rfc3339(), "2024-03-01T15:00:00+00:00");
    }

    #[test]
    fn phone_keys_ignore_formatting_and_country_code() {
        assert_eq!(phone_key("+1 (555) 123-4567").as_deref(), Some("5551234567"));
        assert_eq!(phone_key("555.123.4567").as_deref(), Some("5551234567"));
        assert_eq!(phone_key("12"), None);
    }

    #[test]
    fn number_parsing() {
        assert_eq!(parse_number("$1,000.50"), Some(1000.5));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
    }
}
