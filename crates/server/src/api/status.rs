//! Pipeline statistics endpoint.

use axum::{extract::State, http::StatusCode, Json};
use leadflow_core::{ActivitySnapshot, LeadStatus};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::state::AppState;

use super::{lead_error_response, ErrorResponse};

/// Aggregate pipeline statistics
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub total_leads: i64,
    /// Lead counts per status; every status appears, zero-filled.
    pub counts: BTreeMap<String, i64>,
    pub agents: ActivitySnapshot,
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    let raw_counts = state.store().count_by_status().map_err(lead_error_response)?;

    let mut counts: BTreeMap<String, i64> = LeadStatus::ALL
        .into_iter()
        .map(|status| (status.as_str().to_string(), 0))
        .collect();
    let mut total = 0;
    for entry in raw_counts {
        total += entry.count;
        counts.insert(entry.status.as_str().to_string(), entry.count);
    }

    Ok(Json(StatusResponse {
        total_leads: total,
        counts,
        agents: state.activity().snapshot(),
    }))
}
