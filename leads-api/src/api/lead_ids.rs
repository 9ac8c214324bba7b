//! `leadIds` validation shared by the bulk endpoints
//!
//! Validation is all-or-nothing: one bad element rejects the whole request
//! before anything is read or written.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

pub const LEAD_IDS_REQUIRED: &str = "leadIds must be a non-empty array of numbers";
pub const LEAD_IDS_NOT_POSITIVE: &str = "All leadIds must be positive numbers";

/// Unwrap a JSON body, mapping extractor rejections to 400
pub fn json_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))
}

/// Positive integer id from a JSON number; `1.0` counts, `1.5` does not
fn positive_id(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(id) = number.as_i64() {
        return (id > 0).then_some(id);
    }
    let float = number.as_f64()?;
    if float.fract() == 0.0 && float > 0.0 && float <= i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

/// Validate the `leadIds` field of a request body
pub fn parse_lead_ids(field: Option<&Value>) -> ApiResult<Vec<i64>> {
    let items = match field {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(ApiError::InvalidRequest(LEAD_IDS_REQUIRED.to_string())),
    };

    items
        .iter()
        .map(positive_id)
        .collect::<Option<Vec<i64>>>()
        .ok_or_else(|| ApiError::InvalidLeadIds(LEAD_IDS_NOT_POSITIVE.to_string()))
}
