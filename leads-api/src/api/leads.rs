//! Lead CRUD endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use leads_common::db::{Lead, NewLead};
use serde::Deserialize;
use tracing::info;

use crate::db::leads::{self, LeadUpdate};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Body of POST /leads
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadRequest {
    #[serde(alias = "name")]
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub job_title: Option<String>,
    pub country_code: Option<String>,
    pub company_name: Option<String>,
}

/// Body of PATCH/PUT /leads/:id; absent fields stay unchanged
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadRequest {
    #[serde(alias = "name")]
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub job_title: Option<String>,
    pub country_code: Option<String>,
    pub company_name: Option<String>,
}

/// Trimmed value, `None` when blank
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn lead_not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Lead {} not found", id))
}

fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))
}

/// POST /leads
pub async fn create_lead(
    State(state): State<AppState>,
    body: Result<Json<CreateLeadRequest>, JsonRejection>,
) -> ApiResult<Json<Lead>> {
    let request = parse_body(body)?;

    let first_name = present(request.first_name)
        .ok_or_else(|| ApiError::InvalidRequest("firstName is required".to_string()))?;

    let lead = NewLead {
        first_name,
        last_name: present(request.last_name),
        email: present(request.email),
        job_title: present(request.job_title),
        country_code: present(request.country_code),
        company_name: present(request.company_name),
        gender: None,
    };

    let created = leads::insert_lead(&state.db, &lead).await?;
    info!(lead_id = created.id, "Lead created");

    Ok(Json(created))
}

/// GET /leads
pub async fn list_leads(State(state): State<AppState>) -> ApiResult<Json<Vec<Lead>>> {
    Ok(Json(leads::list_leads(&state.db).await?))
}

/// GET /leads/:id
pub async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Lead>> {
    leads::get_lead(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| lead_not_found(id))
}

/// PATCH or PUT /leads/:id
pub async fn update_lead(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<UpdateLeadRequest>, JsonRejection>,
) -> ApiResult<Json<Lead>> {
    let request = parse_body(body)?;

    if matches!(&request.first_name, Some(name) if name.trim().is_empty()) {
        return Err(ApiError::InvalidRequest(
            "firstName must not be empty".to_string(),
        ));
    }

    let update = LeadUpdate {
        first_name: present(request.first_name),
        last_name: present(request.last_name),
        email: present(request.email),
        job_title: present(request.job_title),
        country_code: present(request.country_code),
        company_name: present(request.company_name),
    };

    leads::update_lead(&state.db, id, &update)
        .await?
        .map(Json)
        .ok_or_else(|| lead_not_found(id))
}

/// DELETE /leads/:id
pub async fn delete_lead(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if leads::delete_lead(&state.db, id).await? {
        info!(lead_id = id, "Lead deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(lead_not_found(id))
    }
}

pub fn lead_routes() -> Router<AppState> {
    Router::new()
        .route("/leads", get(list_leads).post(create_lead))
        .route(
            "/leads/:id",
            get(get_lead)
                .patch(update_lead)
                .put(update_lead)
                .delete(delete_lead),
        )
}
