//! Import report persistence
//!
//! Reports are written once, together with their error entries, and never
//! updated afterwards.

use chrono::Utc;
use leads_common::db::{ImportErrorEntry, ImportReport, ImportReportDetail, NewImportReport};
use leads_common::Result;
use sqlx::{Row, Sqlite, SqlitePool};

/// Insert a report and its error entries inside an open transaction
///
/// Returns the new report id.
pub async fn insert_report_with_errors(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    report: &NewImportReport,
    errors: &[ImportErrorEntry],
) -> Result<i64> {
    let report_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO import_reports (
            filename, file_size, total_rows, imported, errors,
            success, message, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&report.filename)
    .bind(report.file_size)
    .bind(report.total_rows)
    .bind(report.imported)
    .bind(report.errors)
    .bind(report.success)
    .bind(&report.message)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await?;

    for entry in errors {
        sqlx::query(
            r#"
            INSERT INTO import_errors (
                import_report_id, row_number, error_type, error_message, raw_data
            )
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(report_id)
        .bind(entry.row_number)
        .bind(entry.error_type.as_str())
        .bind(&entry.error_message)
        .bind(&entry.raw_data)
        .execute(&mut **tx)
        .await?;
    }

    Ok(report_id)
}

/// Write a report with its errors in a transaction of its own
pub async fn create_report(
    pool: &SqlitePool,
    report: &NewImportReport,
    errors: &[ImportErrorEntry],
) -> Result<i64> {
    let mut tx = pool.begin().await?;
    let report_id = insert_report_with_errors(&mut tx, report, errors).await?;
    tx.commit().await?;
    Ok(report_id)
}

/// All reports, newest first
pub async fn list_reports(pool: &SqlitePool) -> Result<Vec<ImportReport>> {
    let reports =
        sqlx::query_as::<_, ImportReport>("SELECT * FROM import_reports ORDER BY id DESC")
            .fetch_all(pool)
            .await?;
    Ok(reports)
}

/// One report with its error entries in row order
pub async fn get_report_detail(pool: &SqlitePool, id: i64) -> Result<Option<ImportReportDetail>> {
    let report = sqlx::query_as::<_, ImportReport>("SELECT * FROM import_reports WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(report) = report else {
        return Ok(None);
    };

    let rows = sqlx::query(
        r#"
        SELECT row_number, error_type, error_message, raw_data
        FROM import_errors
        WHERE import_report_id = ?
        ORDER BY row_number ASC, id ASC
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let error_entries = rows
        .iter()
        .map(|row| -> Result<ImportErrorEntry> {
            let error_type: String = row.get("error_type");
            Ok(ImportErrorEntry {
                row_number: row.get("row_number"),
                error_type: error_type.parse()?,
                error_message: row.get("error_message"),
                raw_data: row.get("raw_data"),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(ImportReportDetail {
        report,
        error_entries,
    }))
}
