//! The outreach coordinator: drives the voice stage of the pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::lead::{AgentRole, Lead, LeadError, LeadPatch, LeadStatus, LeadStore};
use crate::workflow::{RetryDecision, RetryPolicy};

use super::{ActionOutcome, ActivityTracker, Coordinator, VoiceProvider};

/// Takes claimed leads through an outreach call and records the result.
///
/// All status writes go through `apply_transition`, so a lead that changed
/// under us (another worker, an operator edit) surfaces as a stale-state
/// error rather than a silent overwrite.
pub struct OutreachCoordinator {
    store: Arc<dyn LeadStore>,
    provider: Arc<dyn VoiceProvider>,
    policy: RetryPolicy,
    activity: ActivityTracker,
}

impl OutreachCoordinator {
    pub fn new(
        store: Arc<dyn LeadStore>,
        provider: Arc<dyn VoiceProvider>,
        policy: RetryPolicy,
        activity: ActivityTracker,
    ) -> Self {
        Self {
            store,
            provider,
            policy,
            activity,
        }
    }

    fn settle(&self, lead: Lead, outcome: ActionOutcome) -> Result<(), LeadError> {
        match outcome {
            ActionOutcome::Success(result) => {
                let mut patch = LeadPatch::new().clear_claim();
                if let Some(reference) = result.recording_reference {
                    patch = patch.with_recording_reference(reference);
                }
                if let Some(note) = result.note {
                    patch = patch.with_note(note);
                }
                self.store.apply_transition(
                    &lead.id,
                    LeadStatus::Calling,
                    LeadStatus::Confirmed,
                    patch,
                )?;
                info!(lead_id = %lead.id, "Lead confirmed interest");
            }
            ActionOutcome::Declined => {
                self.store.apply_transition(
                    &lead.id,
                    LeadStatus::Calling,
                    LeadStatus::NotInterested,
                    LeadPatch::new().clear_claim().with_note("contact declined"),
                )?;
                info!(lead_id = %lead.id, "Lead not interested");
            }
            outcome => {
                let reason = outcome
                    .failure_reason()
                    .unwrap_or("unknown failure")
                    .to_string();
                let mut patch = LeadPatch::new()
                    .clear_claim()
                    .increment_attempts(AgentRole::Voice)
                    .with_last_error(reason.clone());

                match self
                    .policy
                    .decide(AgentRole::Voice, lead.call_attempts, &outcome)
                {
                    RetryDecision::Retry { delay } => {
                        let retry_at =
                            Utc::now() + chrono::Duration::from_std(delay).unwrap_or_default();
                        patch = patch.with_retry_after(retry_at);
                        warn!(
                            lead_id = %lead.id,
                            reason = %reason,
                            retry_at = %retry_at,
                            "Call failed, retry scheduled"
                        );
                    }
                    RetryDecision::TerminalFail => {
                        warn!(lead_id = %lead.id, reason = %reason, "Call failed for good");
                    }
                }

                self.store.apply_transition(
                    &lead.id,
                    LeadStatus::Calling,
                    LeadStatus::CallFailed,
                    patch,
                )?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Coordinator for OutreachCoordinator {
    fn role(&self) -> AgentRole {
        AgentRole::Voice
    }

    async fn process(&self, lead: Lead) -> Result<(), LeadError> {
        self.activity.touch(AgentRole::Voice);

        let lead = match lead.status {
            // A lead reclaimed mid-call after a worker crash is already Calling
            LeadStatus::Calling => lead,
            LeadStatus::Pending | LeadStatus::CallFailed => self.store.apply_transition(
                &lead.id,
                lead.status,
                LeadStatus::Calling,
                LeadPatch::new().clear_retry_after(),
            )?,
            other => {
                warn!(lead_id = %lead.id, status = %other, "Voice worker handed an unworkable lead");
                return Ok(());
            }
        };

        info!(
            lead_id = %lead.id,
            provider = self.provider.name(),
            attempt = lead.call_attempts + 1,
            "Placing outreach call"
        );
        let outcome = self.provider.place_call(&lead).await;
        self.settle(lead, outcome)
    }
}
