//! Batch work scheduler.
//!
//! Decides which leads a worker role should act on next and claims them
//! before handing them over. Claiming happens lead by lead, so two
//! scheduler instances running against the same store simply split the
//! work between them.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use crate::config::WorkflowConfig;
use crate::lead::{AgentRole, Lead, LeadError, LeadStatus, LeadStore};

/// Selects and claims batches of workable leads for a role.
pub struct WorkScheduler {
    store: Arc<dyn LeadStore>,
    config: WorkflowConfig,
}

impl WorkScheduler {
    pub fn new(store: Arc<dyn LeadStore>, config: WorkflowConfig) -> Self {
        Self { store, config }
    }

    fn batch_size(&self, role: AgentRole) -> usize {
        match role {
            AgentRole::Voice => self.config.voice_batch_size,
            AgentRole::Entry => self.config.entry_batch_size,
        }
    }

    fn max_attempts(&self, role: AgentRole) -> u32 {
        match role {
            AgentRole::Voice => self.config.max_voice_attempts,
            AgentRole::Entry => self.config.max_entry_attempts,
        }
    }

    /// Source statuses for a role: fresh work, scheduled retries, and
    /// in-progress leads whose claim lease has lapsed (crashed workers).
    fn source_statuses(role: AgentRole) -> [LeadStatus; 3] {
        [
            role.queue_status(),
            role.failure_status(),
            role.working_status(),
        ]
    }

    /// Claim up to a batch of leads for `role`.
    ///
    /// Candidates are gathered from all source statuses, merged oldest
    /// `updated_at` first, and claimed one by one. Losing a claim race is
    /// not an error; the candidate is simply skipped.
    pub fn next_batch(&self, role: AgentRole) -> Result<Vec<Lead>, LeadError> {
        let batch_size = self.batch_size(role);
        let max_attempts = self.max_attempts(role);

        // Over-fetch so lost claim races don't leave the batch short
        let mut candidates = Vec::new();
        for status in Self::source_statuses(role) {
            candidates.extend(self.store.list_eligible(status, batch_size * 2)?);
        }
        candidates.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));

        let lease_expires_at = Utc::now() + Duration::seconds(self.config.claim_lease_secs as i64);

        let mut claimed = Vec::with_capacity(batch_size);
        for lead in candidates {
            if claimed.len() >= batch_size {
                break;
            }

            // Failed leads past the attempt limit never go back out
            if lead.status == role.failure_status() && lead.attempts(role) >= max_attempts {
                continue;
            }

            match self
                .store
                .try_claim(&lead.id, lead.status, role, lease_expires_at)
            {
                Ok(lead) => claimed.push(lead),
                Err(LeadError::ClaimConflict { .. }) => {
                    debug!(lead_id = %lead.id, role = %role, "Lost claim race, skipping lead");
                }
                Err(LeadError::NotFound(_)) => {
                    debug!(lead_id = %lead.id, "Lead disappeared between listing and claiming");
                }
                Err(e) => {
                    warn!(lead_id = %lead.id, error = %e, "Failed to claim lead");
                    return Err(e);
                }
            }
        }

        Ok(claimed)
    }
}
