//! Import report audit endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use leads_common::db::{ImportReport, ImportReportDetail};

use crate::db::import_reports;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /import-reports
pub async fn list_reports(State(state): State<AppState>) -> ApiResult<Json<Vec<ImportReport>>> {
    Ok(Json(import_reports::list_reports(&state.db).await?))
}

/// GET /import-reports/:id
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ImportReportDetail>> {
    import_reports::get_report_detail(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Import report {} not found", id)))
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/import-reports", get(list_reports))
        .route("/import-reports/:id", get(get_report))
}
