//! CSV row parsing and per-row validation for lead import
//!
//! Validation is an ordered rule chain; the first failing rule decides the
//! row's single error.

use csv::{ReaderBuilder, Trim};
use leads_common::db::{ImportErrorEntry, ImportErrorKind, NewLead};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// local-part@domain.tld with no whitespace and a single `@`
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Reported number of the first data row (the header is row 1)
pub const FIRST_DATA_ROW: i64 = 2;

/// One parsed data row, cells keyed by header name in column order
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub row_number: i64,
    cells: Vec<(String, String)>,
}

impl CsvRow {
    pub fn new(row_number: i64, cells: Vec<(String, String)>) -> Self {
        Self { row_number, cells }
    }

    /// Cell under `header`; `None` when the column is absent or the row is short
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == header)
            .map(|(_, value)| value.as_str())
    }

    /// Row content as a JSON object, kept in import error records for audit
    pub fn raw_json(&self) -> String {
        let object: serde_json::Map<String, serde_json::Value> = self
            .cells
            .iter()
            .map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
            .collect();
        serde_json::Value::Object(object).to_string()
    }
}

/// Parse CSV text into rows
///
/// The first record is the header. Short rows are allowed (missing cells are
/// absent) and cells beyond the header are kept under `_<column>` keys; any
/// malformed record or invalid UTF-8 fails the whole parse.
pub fn parse_csv(content: &[u8]) -> Result<Vec<CsvRow>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(content);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let mut cells: Vec<(String, String)> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect();
        // Cells past the header keep their 1-based column position as key
        cells.extend(
            record
                .iter()
                .enumerate()
                .skip(headers.len())
                .map(|(column, value)| (format!("_{}", column + 1), value.to_string())),
        );
        rows.push(CsvRow::new(FIRST_DATA_ROW + index as i64, cells));
    }

    Ok(rows)
}

/// Email shape check used by the importer
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Advisory uniqueness key: lowercase trimmed first and last name
pub fn duplicate_key(first_name: &str, last_name: &str) -> String {
    format!(
        "{}|{}",
        first_name.trim().to_lowercase(),
        last_name.trim().to_lowercase()
    )
}

/// A row that passed validation, ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRow {
    pub lead: NewLead,
    pub key: String,
}

/// Why a row was rejected
#[derive(Debug, Clone, PartialEq)]
pub struct RowRejection {
    pub kind: ImportErrorKind,
    pub message: String,
}

impl RowRejection {
    fn missing(field: &str) -> Self {
        Self {
            kind: ImportErrorKind::MissingField,
            message: format!("Missing required field: {}", field),
        }
    }

    /// Import error record for `row`
    pub fn into_entry(self, row: &CsvRow) -> ImportErrorEntry {
        ImportErrorEntry {
            row_number: row.row_number,
            error_type: self.kind,
            error_message: self.message,
            raw_data: row.raw_json(),
        }
    }
}

/// Trimmed cell value, `None` when absent or blank
fn non_blank<'a>(row: &'a CsvRow, header: &str) -> Option<&'a str> {
    row.get(header).map(str::trim).filter(|v| !v.is_empty())
}

/// Check a row against the import rules in priority order
///
/// `seen` holds the duplicate keys of existing leads plus those created
/// earlier in the same file.
pub fn validate_row(row: &CsvRow, seen: &HashSet<String>) -> Result<ValidRow, RowRejection> {
    let first_name = non_blank(row, "firstName").ok_or_else(|| RowRejection::missing("firstName"))?;
    let last_name = non_blank(row, "lastName").ok_or_else(|| RowRejection::missing("lastName"))?;
    let email = non_blank(row, "email").ok_or_else(|| RowRejection::missing("email"))?;

    if !is_valid_email(email) {
        return Err(RowRejection {
            kind: ImportErrorKind::InvalidEmail,
            message: format!("Invalid email format: {}", email),
        });
    }

    let key = duplicate_key(first_name, last_name);
    if seen.contains(&key) {
        return Err(RowRejection {
            kind: ImportErrorKind::Duplicate,
            message: format!(
                "Duplicate lead: {} {} already exists",
                first_name, last_name
            ),
        });
    }

    let lead = NewLead {
        first_name: first_name.to_string(),
        last_name: Some(last_name.to_string()),
        email: Some(email.to_string()),
        job_title: non_blank(row, "jobTitle").map(str::to_string),
        country_code: non_blank(row, "countryCode").map(str::to_string),
        company_name: non_blank(row, "companyName").map(str::to_string),
        gender: non_blank(row, "gender").map(str::to_string),
    };

    Ok(ValidRow { lead, key })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> CsvRow {
        CsvRow::new(
            FIRST_DATA_ROW,
            cells
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn complete_row() -> CsvRow {
        row(&[
            ("firstName", " Jane "),
            ("lastName", "Doe"),
            ("email", "jane@example.com"),
            ("jobTitle", "  "),
            ("companyName", "Acme"),
        ])
    }

    #[test]
    fn test_email_examples() {
        assert!(is_valid_email("a@b.c"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a.b@"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("a@@b.c"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_duplicate_key_normalizes_case_and_whitespace() {
        assert_eq!(duplicate_key(" Jane", "DOE "), "jane|doe");
        assert_eq!(duplicate_key("jane", "doe"), duplicate_key("JANE", "Doe"));
    }

    #[test]
    fn test_valid_row_is_trimmed_and_blank_optionals_dropped() {
        let valid = validate_row(&complete_row(), &HashSet::new()).unwrap();

        assert_eq!(valid.lead.first_name, "Jane");
        assert_eq!(valid.lead.email.as_deref(), Some("jane@example.com"));
        assert_eq!(valid.lead.job_title, None);
        assert_eq!(valid.lead.company_name.as_deref(), Some("Acme"));
        assert_eq!(valid.key, "jane|doe");
    }

    #[test]
    fn test_missing_fields_checked_in_order() {
        let rejection = validate_row(&row(&[("email", "bad")]), &HashSet::new()).unwrap_err();
        assert_eq!(rejection.kind, ImportErrorKind::MissingField);
        assert_eq!(rejection.message, "Missing required field: firstName");

        let rejection =
            validate_row(&row(&[("firstName", "A"), ("email", "bad")]), &HashSet::new()).unwrap_err();
        assert_eq!(rejection.message, "Missing required field: lastName");

        let rejection =
            validate_row(&row(&[("firstName", "A"), ("lastName", "B"), ("email", " ")]), &HashSet::new())
                .unwrap_err();
        assert_eq!(rejection.kind, ImportErrorKind::MissingField);
        assert_eq!(rejection.message, "Missing required field: email");
    }

    #[test]
    fn test_invalid_email_before_duplicate() {
        let seen: HashSet<String> = [duplicate_key("A", "B")].into_iter().collect();
        let rejection = validate_row(
            &row(&[("firstName", "A"), ("lastName", "B"), ("email", "nope")]),
            &seen,
        )
        .unwrap_err();

        assert_eq!(rejection.kind, ImportErrorKind::InvalidEmail);
        assert_eq!(rejection.message, "Invalid email format: nope");
    }

    #[test]
    fn test_duplicate_message_keeps_original_case() {
        let seen: HashSet<String> = [duplicate_key("jane", "doe")].into_iter().collect();
        let rejection = validate_row(&complete_row(), &seen).unwrap_err();

        assert_eq!(rejection.kind, ImportErrorKind::Duplicate);
        assert_eq!(rejection.message, "Duplicate lead: Jane Doe already exists");
    }

    #[test]
    fn test_parse_numbers_rows_from_two() {
        let csv = "firstName,lastName,email\nA,B,a@b.co\nC,D,c@d.co\n";
        let rows = parse_csv(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[1].row_number, 3);
        assert_eq!(rows[1].get("firstName"), Some("C"));
    }

    #[test]
    fn test_parse_short_rows_and_trimmed_headers() {
        let csv = "\u{feff}firstName , lastName,email\nA\n";
        let rows = parse_csv(csv.as_bytes()).unwrap();

        assert_eq!(rows[0].get("firstName"), Some("A"));
        assert_eq!(rows[0].get("lastName"), None);
    }

    #[test]
    fn test_parse_keeps_cells_past_header() {
        let csv = "firstName,lastName,email\n,B,b@b.io,EXTRA,\n";
        let rows = parse_csv(csv.as_bytes()).unwrap();

        assert_eq!(rows[0].get("_4"), Some("EXTRA"));
        let raw: serde_json::Value = serde_json::from_str(&rows[0].raw_json()).unwrap();
        assert_eq!(raw["firstName"], "");
        assert_eq!(raw["_4"], "EXTRA");
        assert_eq!(raw["_5"], "");
    }

    #[test]
    fn test_parse_rejects_invalid_utf8() {
        let mut content = b"firstName,lastName,email\n".to_vec();
        content.extend_from_slice(&[0xff, 0xfe, b',', b'x', b',', b'y', b'\n']);

        assert!(parse_csv(&content).is_err());
    }

    #[test]
    fn test_raw_json_contains_cells() {
        let raw = complete_row().raw_json();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["firstName"], " Jane ");
        assert_eq!(value["companyName"], "Acme");
    }
}
