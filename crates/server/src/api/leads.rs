//! Lead API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use leadflow_core::{Claim, Lead, LeadFilter, LeadStatus, NewLead};

use crate::state::AppState;

use super::{lead_error_response, ErrorResponse};

/// Maximum allowed limit for lead queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for lead queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing leads
#[derive(Debug, Deserialize)]
pub struct ListLeadsParams {
    /// Filter by status
    pub status: Option<String>,
    /// Maximum number of leads to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Request body for updating a lead's status
#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
}

/// Claim details in responses
#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub owner_role: String,
    pub claimed_at: String,
    pub lease_expires_at: String,
}

impl From<Claim> for ClaimResponse {
    fn from(claim: Claim) -> Self {
        Self {
            owner_role: claim.owner_role.as_str().to_string(),
            claimed_at: claim.claimed_at.to_rfc3339(),
            lease_expires_at: claim.lease_expires_at.to_rfc3339(),
        }
    }
}

/// Response for lead operations
#[derive(Debug, Serialize)]
pub struct LeadResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim: Option<ClaimResponse>,
    pub call_attempts: u32,
    pub entry_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Lead> for LeadResponse {
    fn from(lead: Lead) -> Self {
        Self {
            id: lead.id,
            first_name: lead.first_name,
            last_name: lead.last_name,
            phone: lead.phone,
            email: lead.email,
            address: lead.address,
            city: lead.city,
            state: lead.state,
            zip_code: lead.zip_code,
            status: lead.status.as_str().to_string(),
            claim: lead.claim.map(ClaimResponse::from),
            call_attempts: lead.call_attempts,
            entry_attempts: lead.entry_attempts,
            notes: lead.notes,
            recording_reference: lead.recording_reference,
            last_error: lead.last_error,
            retry_after: lead.retry_after.map(|dt| dt.to_rfc3339()),
            created_at: lead.created_at.to_rfc3339(),
            updated_at: lead.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing leads
#[derive(Debug, Serialize)]
pub struct ListLeadsResponse {
    pub leads: Vec<LeadResponse>,
    pub limit: i64,
    pub offset: i64,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new lead
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewLead>,
) -> Result<(StatusCode, Json<LeadResponse>), (StatusCode, Json<ErrorResponse>)> {
    if body.first_name.trim().is_empty()
        || body.last_name.trim().is_empty()
        || body.phone.trim().is_empty()
        || body.email.trim().is_empty()
    {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "first_name, last_name, phone and email are required".to_string(),
            }),
        ));
    }

    match state.store().create(body) {
        Ok(lead) => Ok((StatusCode::CREATED, Json(LeadResponse::from(lead)))),
        Err(e) => Err(lead_error_response(e)),
    }
}

/// Get a lead by ID
pub async fn get_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LeadResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.store().get(&id) {
        Ok(Some(lead)) => Ok(Json(LeadResponse::from(lead))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Lead not found: {}", id),
            }),
        )),
        Err(e) => Err(lead_error_response(e)),
    }
}

/// List leads with optional status filter
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListLeadsParams>,
) -> Result<Json<ListLeadsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = LeadFilter::new().with_limit(limit).with_offset(offset);

    if let Some(ref status_str) = params.status {
        let status = LeadStatus::parse(status_str).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Unknown status: {}", status_str),
                }),
            )
        })?;
        filter = filter.with_status(status);
    }

    match state.store().list(&filter) {
        Ok(leads) => Ok(Json(ListLeadsResponse {
            leads: leads.into_iter().map(LeadResponse::from).collect(),
            limit,
            offset,
        })),
        Err(e) => Err(lead_error_response(e)),
    }
}

/// Update a lead's status.
///
/// The write goes through the same transition checks as the workers: an
/// edge not in the graph is a 409, and so is losing a race against a
/// concurrent writer.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<LeadResponse>, (StatusCode, Json<ErrorResponse>)> {
    let new_status = LeadStatus::parse(&body.status).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Unknown status: {}", body.status),
            }),
        )
    })?;

    let current = match state.store().get(&id) {
        Ok(Some(lead)) => lead,
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Lead not found: {}", id),
                }),
            ));
        }
        Err(e) => return Err(lead_error_response(e)),
    };

    match state.store().apply_transition(
        &id,
        current.status,
        new_status,
        leadflow_core::LeadPatch::new(),
    ) {
        Ok(lead) => Ok(Json(LeadResponse::from(lead))),
        Err(e) => Err(lead_error_response(e)),
    }
}
