//! Database models
//!
//! JSON representations use camelCase keys, matching what the web client
//! expects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Template placeholders a message may reference
pub const TEMPLATE_FIELDS: [&str; 7] = [
    "firstName",
    "lastName",
    "email",
    "jobTitle",
    "countryCode",
    "companyName",
    "message",
];

/// A contact record
///
/// `first_name` is never empty. `gender` is only written by enrichment and
/// `message` only by template generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub job_title: Option<String>,
    pub country_code: Option<String>,
    pub company_name: Option<String>,
    pub gender: Option<String>,
    pub message: Option<String>,
    /// Import report that created this lead, if it came from a CSV import
    pub import_report_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Look up a template field by its camelCase name
    ///
    /// Returns `None` for unknown names and for unset values.
    pub fn field_value(&self, field: &str) -> Option<&str> {
        match field {
            "firstName" => Some(self.first_name.as_str()),
            "lastName" => self.last_name.as_deref(),
            "email" => self.email.as_deref(),
            "jobTitle" => self.job_title.as_deref(),
            "countryCode" => self.country_code.as_deref(),
            "companyName" => self.company_name.as_deref(),
            "message" => self.message.as_deref(),
            _ => None,
        }
    }
}

/// Column values for a lead that has not been stored yet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLead {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub job_title: Option<String>,
    pub country_code: Option<String>,
    pub company_name: Option<String>,
    pub gender: Option<String>,
}

/// Classification of a failed import row (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportErrorKind {
    MissingField,
    InvalidEmail,
    Duplicate,
    DatabaseError,
    FileError,
}

impl ImportErrorKind {
    /// Stored and serialized name
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportErrorKind::MissingField => "MISSING_FIELD",
            ImportErrorKind::InvalidEmail => "INVALID_EMAIL",
            ImportErrorKind::Duplicate => "DUPLICATE",
            ImportErrorKind::DatabaseError => "DATABASE_ERROR",
            ImportErrorKind::FileError => "FILE_ERROR",
        }
    }
}

impl fmt::Display for ImportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportErrorKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MISSING_FIELD" => Ok(ImportErrorKind::MissingField),
            "INVALID_EMAIL" => Ok(ImportErrorKind::InvalidEmail),
            "DUPLICATE" => Ok(ImportErrorKind::Duplicate),
            "DATABASE_ERROR" => Ok(ImportErrorKind::DatabaseError),
            "FILE_ERROR" => Ok(ImportErrorKind::FileError),
            other => Err(crate::Error::UnknownErrorKind(other.to_string())),
        }
    }
}

/// Audit record of one CSV import attempt (immutable once written)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub id: i64,
    pub filename: String,
    pub file_size: i64,
    pub total_rows: i64,
    pub imported: i64,
    pub errors: i64,
    pub success: bool,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Column values for an import report that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewImportReport {
    pub filename: String,
    pub file_size: i64,
    pub total_rows: i64,
    pub imported: i64,
    pub errors: i64,
    pub success: bool,
    pub message: String,
}

/// One failed row within an import report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportErrorEntry {
    /// File line of the row; the header is row 1, so data starts at row 2
    pub row_number: i64,
    pub error_type: ImportErrorKind,
    pub error_message: String,
    /// Raw row content kept for debugging, never re-parsed
    pub raw_data: String,
}

/// An import report together with its error entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReportDetail {
    #[serde(flatten)]
    pub report: ImportReport,
    pub error_entries: Vec<ImportErrorEntry>,
}
