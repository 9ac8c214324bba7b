//! Gender enrichment endpoint

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use super::lead_ids::{json_body, parse_lead_ids};
use crate::error::{ApiError, ApiResult};
use crate::services::{guess_genders, GenderResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct GuessGenderResponse {
    pub results: Vec<GenderResult>,
}

/// POST /leads/guess-gender
pub async fn guess_gender(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<GuessGenderResponse>> {
    let body = json_body(body)?;
    let ids = parse_lead_ids(body.get("leadIds"))?;

    let results = guess_genders(&state.db, &state.genderize, &ids)
        .await
        .map_err(|e| {
            error!(error = %e, "Gender enrichment failed");
            ApiError::Internal("Failed to guess gender".to_string())
        })?;

    Ok(Json(GuessGenderResponse { results }))
}

pub fn gender_routes() -> Router<AppState> {
    Router::new().route("/leads/guess-gender", post(guess_gender))
}
