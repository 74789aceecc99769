//! Administrative endpoints.

use axum::{extract::State, http::StatusCode, Json};
use leadflow_core::ResetSummary;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::state::AppState;

use super::{lead_error_response, ErrorResponse};

/// Response for the reset endpoint
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
    pub summary: ResetSummary,
}

/// Return in-flight work to its stage baseline and clear all claims.
///
/// Terminal and queued leads are untouched; this is for recovering from a
/// bad deploy or a fleet of crashed workers without waiting out leases.
pub async fn reset(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResetResponse>, (StatusCode, Json<ErrorResponse>)> {
    let summary = state.store().reset_in_flight().map_err(lead_error_response)?;

    let message = format!(
        "Reset {} calling leads to pending and {} in-progress entries to confirmed; cleared {} other claims. Terminal leads untouched.",
        summary.calls_reset, summary.entries_reset, summary.claims_cleared
    );
    info!(
        calls_reset = summary.calls_reset,
        entries_reset = summary.entries_reset,
        claims_cleared = summary.claims_cleared,
        "Administrative reset"
    );

    Ok(Json(ResetResponse {
        success: true,
        message,
        summary,
    }))
}
