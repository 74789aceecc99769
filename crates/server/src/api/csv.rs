//! CSV import endpoint.

use axum::{extract::State, http::StatusCode, Json};
use leadflow_core::ImportReport;
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

use super::ErrorResponse;

/// Response for a CSV import sweep
#[derive(Debug, Serialize)]
pub struct ProcessCsvResponse {
    pub success: bool,
    pub message: String,
    pub report: ImportReport,
}

/// Sweep the import directory and import every new CSV file.
pub async fn process_csv(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProcessCsvResponse>, (StatusCode, Json<ErrorResponse>)> {
    let importer = state.importer();

    // File IO and row parsing are blocking work
    let report = tokio::task::spawn_blocking(move || importer.process_new_files())
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Import task failed: {}", e),
                }),
            )
        })?
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
        })?;

    let message = format!(
        "Imported {} leads from {} files ({} files failed, {} rows skipped)",
        report.leads_imported, report.files_processed, report.files_failed, report.rows_skipped
    );

    Ok(Json(ProcessCsvResponse {
        success: report.files_failed == 0,
        message,
        report,
    }))
}
