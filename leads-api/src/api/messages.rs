//! Template message generation

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, error, info};

use super::lead_ids::{json_body, parse_lead_ids};
use crate::db::leads;
use crate::error::{ApiError, ApiResult};
use crate::services::message_template::{missing_fields_message, MessageTemplate, TemplateError};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResult {
    pub lead_id: i64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageResult {
    fn failed(lead_id: i64, error: String) -> Self {
        Self {
            lead_id,
            success: false,
            message: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateMessagesResponse {
    pub results: Vec<MessageResult>,
}

/// POST /leads/generate-messages
pub async fn generate_messages(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<GenerateMessagesResponse>> {
    let body = json_body(body)?;

    let text = body
        .get("template")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest(TemplateError::Empty.to_string()))?;
    let ids = parse_lead_ids(body.get("leadIds"))?;

    let template = MessageTemplate::parse(text).map_err(|e| match e {
        TemplateError::Empty => ApiError::InvalidRequest(e.to_string()),
        TemplateError::UnknownFields(_) => ApiError::InvalidTemplateFields(e.to_string()),
    })?;

    debug!(fields = ?template.fields(), leads = ids.len(), "Rendering lead messages");

    let results = render_for_leads(&state, &template, &ids).await.map_err(|e| {
        error!(error = %e, "Message generation failed");
        ApiError::Internal("Failed to generate messages".to_string())
    })?;

    info!(
        requested = ids.len(),
        generated = results.iter().filter(|r| r.success).count(),
        "Generated lead messages"
    );

    Ok(Json(GenerateMessagesResponse { results }))
}

async fn render_for_leads(
    state: &AppState,
    template: &MessageTemplate,
    ids: &[i64],
) -> leads_common::Result<Vec<MessageResult>> {
    let found: HashMap<i64, _> = leads::find_leads_by_ids(&state.db, ids)
        .await?
        .into_iter()
        .map(|lead| (lead.id, lead))
        .collect();

    let mut results = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(lead) = found.get(id) else {
            results.push(MessageResult::failed(*id, "Lead not found".to_string()));
            continue;
        };

        match template.render(lead) {
            Ok(message) => {
                leads::set_message(&state.db, *id, &message).await?;
                results.push(MessageResult {
                    lead_id: *id,
                    success: true,
                    message: Some(message),
                    error: None,
                });
            }
            Err(missing) => results.push(MessageResult::failed(*id, missing_fields_message(&missing))),
        }
    }

    Ok(results)
}

pub fn message_routes() -> Router<AppState> {
    Router::new().route("/leads/generate-messages", post(generate_messages))
}
