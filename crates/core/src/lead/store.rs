//! Lead store trait and related types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::types::{AgentRole, Lead, LeadStatus, NewLead};

/// Errors from lead store operations.
#[derive(Debug, Error)]
pub enum LeadError {
    #[error("Lead not found: {0}")]
    NotFound(String),

    #[error("Lead {id} could not be claimed: not {expected} or already claimed")]
    ClaimConflict { id: String, expected: LeadStatus },

    #[error("Lead {id} changed under us: expected {expected}, found {actual}")]
    StaleState {
        id: String,
        expected: LeadStatus,
        actual: LeadStatus,
    },

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: LeadStatus, to: LeadStatus },

    #[error("Database error: {0}")]
    Database(String),
}

/// Filter for listing leads.
#[derive(Debug, Clone)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl LeadFilter {
    pub fn new() -> Self {
        Self {
            status: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_status(mut self, status: LeadStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

impl Default for LeadFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Field changes applied together with a status transition.
///
/// Everything in a patch lands in the same atomic update as the status
/// change, so observers never see a half-applied transition.
#[derive(Debug, Clone, Default)]
pub struct LeadPatch {
    /// Release the claim as part of the transition.
    pub clear_claim: bool,
    /// Increment this role's attempt counter (failures only).
    pub increment_attempts: Option<AgentRole>,
    /// Set the call recording reference.
    pub recording_reference: Option<String>,
    /// Append a line to the notes.
    pub append_note: Option<String>,
    /// Record the failure reason.
    pub last_error: Option<String>,
    /// Mark the lead eligible for another attempt after this instant.
    pub retry_after: Option<DateTime<Utc>>,
    /// Clear any pending retry marker.
    pub clear_retry_after: bool,
}

impl LeadPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_claim(mut self) -> Self {
        self.clear_claim = true;
        self
    }

    pub fn increment_attempts(mut self, role: AgentRole) -> Self {
        self.increment_attempts = Some(role);
        self
    }

    pub fn with_recording_reference(mut self, reference: impl Into<String>) -> Self {
        self.recording_reference = Some(reference.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.append_note = Some(note.into());
        self
    }

    pub fn with_last_error(mut self, error: impl Into<String>) -> Self {
        self.last_error = Some(error.into());
        self
    }

    pub fn with_retry_after(mut self, when: DateTime<Utc>) -> Self {
        self.retry_after = Some(when);
        self
    }

    pub fn clear_retry_after(mut self) -> Self {
        self.clear_retry_after = true;
        self
    }
}

/// Per-status lead count, for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: LeadStatus,
    pub count: i64,
}

/// Outcome of a batch insert.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchInsertReport {
    pub inserted: usize,
    pub failed: usize,
}

/// What an administrative reset touched.
#[derive(Debug, Clone, Serialize)]
pub struct ResetSummary {
    /// Leads returned from `calling` to `pending`.
    pub calls_reset: usize,
    /// Leads returned from `entry_in_progress` to `confirmed`.
    pub entries_reset: usize,
    /// Claims cleared on leads in other statuses.
    pub claims_cleared: usize,
}

/// Storage abstraction for leads.
///
/// The claim protocol lives here: `try_claim` and `apply_transition` are
/// conditional updates keyed on the status the caller last observed, so
/// two workers racing for the same lead cannot both win.
pub trait LeadStore: Send + Sync {
    /// Insert a new lead in `Pending` status.
    fn create(&self, new_lead: NewLead) -> Result<Lead, LeadError>;

    /// Insert many leads, counting per-row success and failure.
    fn create_batch(&self, new_leads: Vec<NewLead>) -> Result<BatchInsertReport, LeadError>;

    /// Fetch a lead by id.
    fn get(&self, id: &str) -> Result<Option<Lead>, LeadError>;

    /// List leads matching the filter, newest first.
    fn list(&self, filter: &LeadFilter) -> Result<Vec<Lead>, LeadError>;

    /// Count leads grouped by status. Statuses with no leads are omitted.
    fn count_by_status(&self) -> Result<Vec<StatusCount>, LeadError>;

    /// List leads in `status` that are workable right now: no live claim,
    /// and (for failure statuses) a due `retry_after`. Oldest `updated_at`
    /// first, so starved leads surface eventually.
    fn list_eligible(&self, status: LeadStatus, limit: usize) -> Result<Vec<Lead>, LeadError>;

    /// Atomically claim a lead for `role`.
    ///
    /// Succeeds only if the lead is still in `expected` status and carries
    /// no unexpired claim; on success the claim columns and lease are set
    /// in the same update that checks the preconditions. A lost race
    /// surfaces as [`LeadError::ClaimConflict`].
    fn try_claim(
        &self,
        id: &str,
        expected: LeadStatus,
        role: AgentRole,
        lease_expires_at: DateTime<Utc>,
    ) -> Result<Lead, LeadError>;

    /// Atomically transition a lead from `expected` to `new_status`,
    /// applying `patch` in the same update.
    ///
    /// The edge must exist in the transition graph
    /// ([`LeadError::InvalidTransition`] otherwise) and the lead must still
    /// be in `expected` status ([`LeadError::StaleState`] otherwise).
    fn apply_transition(
        &self,
        id: &str,
        expected: LeadStatus,
        new_status: LeadStatus,
        patch: LeadPatch,
    ) -> Result<Lead, LeadError>;

    /// Return in-flight leads to their stage baseline and clear all claims.
    /// Terminal and queued leads are untouched.
    fn reset_in_flight(&self) -> Result<ResetSummary, LeadError>;
}
