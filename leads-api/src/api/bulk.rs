//! Bulk lead deletion

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use super::lead_ids::{json_body, parse_lead_ids};
use crate::db::leads;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    pub deleted_count: u64,
    pub message: String,
}

/// POST /leads/bulk-delete
pub async fn bulk_delete(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<BulkDeleteResponse>> {
    let body = json_body(body)?;
    let ids = parse_lead_ids(body.get("leadIds"))?;

    let deleted_count = leads::delete_leads(&state.db, &ids).await.map_err(|e| {
        error!(error = %e, "Bulk delete failed");
        ApiError::Internal("Failed to delete leads".to_string())
    })?;

    info!(requested = ids.len(), deleted_count, "Bulk delete completed");

    Ok(Json(BulkDeleteResponse {
        deleted_count,
        message: format!("Successfully deleted {} lead(s)", deleted_count),
    }))
}

pub fn bulk_routes() -> Router<AppState> {
    Router::new().route("/leads/bulk-delete", post(bulk_delete))
}
