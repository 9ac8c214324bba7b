//! CSV lead import
//!
//! **Algorithm:**
//! 1. Snapshot the duplicate keys of every existing lead (once per import)
//! 2. Parse the whole file; a parse failure aborts before any row is processed
//! 3. Validate rows in file order; each valid row is inserted inside its own
//!    savepoint and its key joins the running set
//! 4. Write the import report, its error entries and the lead back-links
//! 5. Commit: created leads, report and back-links land together or not at all
//!
//! Concurrent imports each take their own snapshot in step 1, so two imports
//! racing on the same new name pair can both insert it. Steps 3 to 5 hold the
//! SQLite write lock, so other writers wait on the busy timeout meanwhile.

use leads_common::db::{ImportErrorEntry, ImportErrorKind, NewImportReport, NewLead};
use serde::Serialize;
use sqlx::{Acquire, Sqlite, SqlitePool};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

use super::lead_rows::{duplicate_key, parse_csv, validate_row};
use crate::db::{import_reports, leads};

/// Report filename when no upload was received
const UNKNOWN_FILENAME: &str = "unknown";

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Message for the missing-upload case
pub const NO_FILE_MESSAGE: &str = "No CSV file uploaded";

/// Message for imports that failed after a file was received
pub const IMPORT_FAILED_MESSAGE: &str = "CSV import failed";

/// An uploaded CSV in temporary storage
///
/// The file is deleted when this value is dropped, on every path.
#[derive(Debug)]
pub struct UploadedCsv {
    original_name: String,
    path: PathBuf,
    size: u64,
}

impl UploadedCsv {
    /// Take ownership of the temp file at `path`
    pub fn new(original_name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            original_name: original_name.into(),
            path,
            size: 0,
        }
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn set_size(&mut self, size: u64) {
        self.size = size;
    }
}

impl Drop for UploadedCsv {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove temporary upload"
            ),
        }
    }
}

/// Response body of the import endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success: bool,
    pub imported: usize,
    pub errors: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub error_details: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_report_id: Option<i64>,
}

impl ImportResult {
    /// Result for an import that never reached the row stage
    pub fn failure(message: impl Into<String>, error_details: Vec<String>) -> Self {
        Self {
            success: false,
            imported: 0,
            errors: 1,
            message: message.into(),
            error_details,
            import_report_id: None,
        }
    }
}

/// How an import attempt ended
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    /// Rows were processed (possibly all rejected)
    Completed(ImportResult),
    /// No file was supplied
    NoFile(ImportResult),
    /// The file could not be parsed or storage failed
    Failed(ImportResult),
}

/// Reasons an import aborts as a whole
#[derive(Debug, Error)]
pub enum ImportFailure {
    #[error("Failed to read uploaded file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse CSV: {0}")]
    Parse(#[from] csv::Error),

    #[error(transparent)]
    Database(#[from] leads_common::Error),
}

impl From<sqlx::Error> for ImportFailure {
    fn from(err: sqlx::Error) -> Self {
        ImportFailure::Database(err.into())
    }
}

/// CSV import processor
pub struct CsvImporter {
    db: SqlitePool,
}

impl CsvImporter {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Run one import attempt and persist its report
    ///
    /// Consumes the upload so its temp file is removed before returning.
    pub async fn import(&self, upload: Option<UploadedCsv>) -> ImportOutcome {
        let Some(upload) = upload else {
            warn!("CSV import requested without a file");
            self.record_file_error(UNKNOWN_FILENAME, 0, NO_FILE_MESSAGE, NO_FILE_MESSAGE)
                .await;
            return ImportOutcome::NoFile(ImportResult::failure(NO_FILE_MESSAGE, Vec::new()));
        };

        match self.process(&upload).await {
            Ok(result) => ImportOutcome::Completed(result),
            Err(failure) => {
                self.upload_failed(upload.original_name(), upload.size(), failure.to_string())
                    .await
            }
        }
    }

    /// Record an import that failed after a file was received
    ///
    /// Also used by the upload boundary when the multipart stream breaks.
    pub async fn upload_failed(&self, filename: &str, size: u64, detail: String) -> ImportOutcome {
        error!(filename = %filename, error = %detail, "CSV import failed");
        self.record_file_error(filename, size as i64, IMPORT_FAILED_MESSAGE, &detail)
            .await;
        ImportOutcome::Failed(ImportResult::failure(IMPORT_FAILED_MESSAGE, vec![detail]))
    }

    async fn process(&self, upload: &UploadedCsv) -> Result<ImportResult, ImportFailure> {
        let mut seen: HashSet<String> = leads::load_name_pairs(&self.db)
            .await?
            .iter()
            .map(|(first, last)| duplicate_key(first, last.as_deref().unwrap_or("")))
            .collect();

        let content = tokio::fs::read(upload.path()).await?;
        let rows = parse_csv(&content)?;

        let mut tx = self.db.begin().await?;
        let mut created_ids: Vec<i64> = Vec::new();
        let mut failures: Vec<ImportErrorEntry> = Vec::new();

        for row in &rows {
            let valid = match validate_row(row, &seen) {
                Ok(valid) => valid,
                Err(rejection) => {
                    failures.push(rejection.into_entry(row));
                    continue;
                }
            };

            match insert_in_savepoint(&mut tx, &valid.lead).await {
                Ok(lead_id) => {
                    seen.insert(valid.key);
                    created_ids.push(lead_id);
                }
                Err(e) => {
                    warn!(row = row.row_number, error = %e, "Failed to create lead from CSV row");
                    failures.push(ImportErrorEntry {
                        row_number: row.row_number,
                        error_type: ImportErrorKind::DatabaseError,
                        error_message: format!("Failed to create lead: {}", e),
                        raw_data: row.raw_json(),
                    });
                }
            }
        }

        let imported = created_ids.len();
        let errors = failures.len();
        let message = format!(
            "Import completed. {} leads imported, {} errors.",
            imported, errors
        );

        let report = NewImportReport {
            filename: upload.original_name().to_string(),
            file_size: upload.size() as i64,
            total_rows: rows.len() as i64,
            imported: imported as i64,
            errors: errors as i64,
            success: errors == 0,
            message: message.clone(),
        };

        let report_id = import_reports::insert_report_with_errors(&mut tx, &report, &failures).await?;
        leads::link_to_import_report(&mut tx, report_id, &created_ids).await?;
        tx.commit().await?;

        info!(
            filename = %upload.original_name(),
            report_id,
            total_rows = rows.len(),
            imported,
            errors,
            "CSV import completed"
        );

        Ok(ImportResult {
            success: errors == 0,
            imported,
            errors,
            message,
            error_details: failures
                .iter()
                .map(|f| format!("Row {}: {}", f.row_number, f.error_message))
                .collect(),
            import_report_id: Some(report_id),
        })
    }

    /// Persist a report for an import that never reached the row stage
    ///
    /// Best effort: a storage failure here is logged, not returned.
    async fn record_file_error(&self, filename: &str, file_size: i64, message: &str, detail: &str) {
        let report = NewImportReport {
            filename: filename.to_string(),
            file_size,
            total_rows: 0,
            imported: 0,
            errors: 1,
            success: false,
            message: message.to_string(),
        };
        let entry = ImportErrorEntry {
            row_number: 0,
            error_type: ImportErrorKind::FileError,
            error_message: detail.to_string(),
            raw_data: String::new(),
        };

        if let Err(e) = import_reports::create_report(&self.db, &report, &[entry]).await {
            error!(error = %e, "Failed to record import failure report");
        }
    }
}

/// Insert one lead in a nested savepoint so a failure rolls back only this row
async fn insert_in_savepoint(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    lead: &NewLead,
) -> leads_common::Result<i64> {
    let mut savepoint = tx.begin().await?;
    let created = leads::insert_lead(&mut *savepoint, lead).await?;
    savepoint.commit().await?;
    Ok(created.id)
}
