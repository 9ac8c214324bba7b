//! CSV import upload endpoint
//!
//! The upload is streamed to `<root>/uploads/<uuid>.csv` and handed to the
//! importer. Type and size rejections happen here and write no report.

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::services::csv_import::{CsvImporter, ImportOutcome, ImportResult, UploadedCsv};
use crate::services::MAX_UPLOAD_BYTES;
use crate::AppState;

/// Headroom for multipart framing and other form fields
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

const ONLY_CSV_MESSAGE: &str = "Only CSV files are allowed";
const TOO_LARGE_MESSAGE: &str = "File size must be less than 10MB";

/// Why an upload never reached the importer
enum UploadError {
    /// Rejected at the boundary (400, no report)
    Rejected(&'static str),
    /// Broken stream or storage failure after the file part began
    Failed { filename: String, detail: String },
}

fn is_csv(content_type: Option<&str>, file_name: Option<&str>) -> bool {
    let type_ok = content_type.map_or(false, |t| t.to_ascii_lowercase().contains("csv"));
    let name_ok = file_name.map_or(false, |n| n.to_ascii_lowercase().ends_with(".csv"));
    type_ok || name_ok
}

fn stream_error(filename: &str, err: MultipartError) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::Rejected(TOO_LARGE_MESSAGE)
    } else {
        UploadError::Failed {
            filename: filename.to_string(),
            detail: err.body_text(),
        }
    }
}

/// Copy the file part into temporary storage
async fn store_upload(state: &AppState, mut field: Field<'_>) -> Result<UploadedCsv, UploadError> {
    let original_name = field.file_name().unwrap_or("upload.csv").to_string();

    if !is_csv(field.content_type(), field.file_name()) {
        return Err(UploadError::Rejected(ONLY_CSV_MESSAGE));
    }

    let storage_failed = |e: std::io::Error| UploadError::Failed {
        filename: original_name.clone(),
        detail: format!("Failed to store upload: {}", e),
    };

    let path = state.upload_dir.join(format!("{}.csv", Uuid::new_v4()));
    // Guard first so a partial file is removed on every exit
    let mut upload = UploadedCsv::new(original_name.clone(), path);
    let mut file = tokio::fs::File::create(upload.path())
        .await
        .map_err(storage_failed)?;

    let mut size: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| stream_error(&original_name, e))?
    {
        size += chunk.len() as u64;
        if size > MAX_UPLOAD_BYTES {
            return Err(UploadError::Rejected(TOO_LARGE_MESSAGE));
        }
        file.write_all(&chunk).await.map_err(storage_failed)?;
    }
    file.flush().await.map_err(storage_failed)?;

    upload.set_size(size);
    debug!(filename = %original_name, size, "Stored CSV upload");
    Ok(upload)
}

/// Find the first `file` part; other parts are skipped
async fn receive_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Option<UploadedCsv>, UploadError> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Import request is not multipart");
            return Ok(None);
        }
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(UploadError::Rejected(TOO_LARGE_MESSAGE))
            }
            Err(e) => {
                warn!(error = %e.body_text(), "Malformed multipart body");
                return Ok(None);
            }
        };

        if field.name() == Some("file") {
            return store_upload(state, field).await.map(Some);
        }
    }
}

fn respond(status: StatusCode, result: ImportResult) -> Response {
    (status, Json(result)).into_response()
}

/// POST /leads/import-csv
pub async fn import_csv(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let importer = CsvImporter::new(state.db.clone());

    let outcome = match receive_upload(&state, multipart).await {
        Ok(upload) => importer.import(upload).await,
        Err(UploadError::Rejected(message)) => {
            warn!(reason = message, "CSV upload rejected");
            return respond(
                StatusCode::BAD_REQUEST,
                ImportResult::failure(message, Vec::new()),
            );
        }
        Err(UploadError::Failed { filename, detail }) => {
            importer.upload_failed(&filename, 0, detail).await
        }
    };

    match outcome {
        ImportOutcome::Completed(result) => respond(StatusCode::OK, result),
        ImportOutcome::NoFile(result) => respond(StatusCode::BAD_REQUEST, result),
        ImportOutcome::Failed(result) => respond(StatusCode::INTERNAL_SERVER_ERROR, result),
    }
}

pub fn import_routes() -> Router<AppState> {
    Router::new().route(
        "/leads/import-csv",
        post(import_csv).layer(DefaultBodyLimit::max(
            MAX_UPLOAD_BYTES as usize + MULTIPART_OVERHEAD_BYTES,
        )),
    )
}
