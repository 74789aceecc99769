pub mod admin;
pub mod csv;
pub mod handlers;
pub mod leads;
pub mod routes;
pub mod status;

pub use routes::create_router;

use axum::http::StatusCode;
use axum::Json;
use leadflow_core::LeadError;
use serde::Serialize;

/// Error response body shared by all endpoints
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a lead store error to an HTTP response.
///
/// State-machine violations and lost races map to 409 so callers can
/// re-read and retry; everything else is the usual 404/500 split.
pub(crate) fn lead_error_response(e: LeadError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &e {
        LeadError::NotFound(_) => StatusCode::NOT_FOUND,
        LeadError::InvalidTransition { .. }
        | LeadError::StaleState { .. }
        | LeadError::ClaimConflict { .. } => StatusCode::CONFLICT,
        LeadError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}
