//! Gender enrichment of stored leads

use leads_common::db::Lead;
use leads_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::{info, warn};

use super::genderize_client::GenderizeClient;
use crate::db::leads;

/// Names sent per genderize request
pub const BATCH_SIZE: usize = 10;

const LEAD_NOT_FOUND: &str = "Lead not found";
const MISSING_FIRST_NAME: &str = "Missing firstName";
const SERVICE_UNAVAILABLE: &str = "Gender prediction service unavailable";
const NO_PREDICTION: &str = "No gender prediction available";

/// Outcome for one requested lead id
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderResult {
    pub lead_id: i64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenderResult {
    fn failed(lead_id: i64, error: &str) -> Self {
        Self {
            lead_id,
            success: false,
            gender: None,
            probability: None,
            error: Some(error.to_string()),
        }
    }
}

/// Predict and store genders for `lead_ids`
///
/// Ids are handled in request order in batches of [`BATCH_SIZE`]; the
/// returned results are sorted by lead id. A genderize failure only affects
/// its own batch. Storage errors abort the whole call.
pub async fn guess_genders(
    db: &SqlitePool,
    client: &GenderizeClient,
    lead_ids: &[i64],
) -> Result<Vec<GenderResult>> {
    let found: HashMap<i64, Lead> = leads::find_leads_by_ids(db, lead_ids)
        .await?
        .into_iter()
        .map(|lead| (lead.id, lead))
        .collect();

    let mut results = Vec::with_capacity(lead_ids.len());

    for batch in lead_ids.chunks(BATCH_SIZE) {
        let mut queried: Vec<(i64, String)> = Vec::new();

        for id in batch {
            match found.get(id) {
                None => results.push(GenderResult::failed(*id, LEAD_NOT_FOUND)),
                Some(lead) if lead.first_name.trim().is_empty() => {
                    results.push(GenderResult::failed(*id, MISSING_FIRST_NAME))
                }
                Some(lead) => queried.push((*id, lead.first_name.trim().to_string())),
            }
        }

        if queried.is_empty() {
            continue;
        }

        let names: Vec<String> = queried.iter().map(|(_, name)| name.clone()).collect();
        let predictions = match client.predict(&names).await {
            Ok(predictions) => predictions,
            Err(e) => {
                warn!(error = %e, batch_size = names.len(), "Gender prediction request failed");
                results.extend(
                    queried
                        .iter()
                        .map(|(id, _)| GenderResult::failed(*id, SERVICE_UNAVAILABLE)),
                );
                continue;
            }
        };

        for (index, (id, _)) in queried.iter().enumerate() {
            let prediction = predictions.get(index);
            match prediction.and_then(|p| p.gender.as_deref().map(|g| (g, p.probability))) {
                Some((gender, probability)) => {
                    leads::set_gender(db, *id, gender).await?;
                    results.push(GenderResult {
                        lead_id: *id,
                        success: true,
                        gender: Some(gender.to_string()),
                        probability,
                        error: None,
                    });
                }
                None => results.push(GenderResult::failed(*id, NO_PREDICTION)),
            }
        }
    }

    results.sort_by_key(|r| r.lead_id);

    info!(
        requested = lead_ids.len(),
        updated = results.iter().filter(|r| r.success).count(),
        "Gender enrichment finished"
    );

    Ok(results)
}
