//! Genderize API client
//!
//! One GET per batch: `{base_url}?name[]=a&name[]=b`. The service answers with
//! an array aligned to the request order, or a single object for one name.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("leads-api/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Genderize client errors
#[derive(Debug, Error)]
pub enum GenderizeError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}")]
    ApiError(u16),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// One name's prediction
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GenderPrediction {
    pub name: String,
    pub gender: Option<String>,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GenderizeResponse {
    Batch(Vec<GenderPrediction>),
    Single(GenderPrediction),
}

/// Genderize API client
pub struct GenderizeClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GenderizeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GenderizeError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GenderizeError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Predict genders for `names`; results follow the request order
    pub async fn predict(&self, names: &[String]) -> Result<Vec<GenderPrediction>, GenderizeError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let params: Vec<(&str, &str)> = names.iter().map(|n| ("name[]", n.as_str())).collect();

        tracing::debug!(count = names.len(), "Querying genderize API");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| GenderizeError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenderizeError::ApiError(status.as_u16()));
        }

        let parsed: GenderizeResponse = response
            .json()
            .await
            .map_err(|e| GenderizeError::ParseError(e.to_string()))?;

        Ok(match parsed {
            GenderizeResponse::Batch(predictions) => predictions,
            GenderizeResponse::Single(prediction) => vec![prediction],
        })
    }
}
