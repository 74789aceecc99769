//! The submission coordinator: drives the portal entry stage.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::lead::{AgentRole, Lead, LeadError, LeadPatch, LeadStatus, LeadStore};
use crate::workflow::{RetryDecision, RetryPolicy};

use super::{ActionOutcome, ActivityTracker, Coordinator, EntryProvider};

/// Takes confirmed leads through a portal submission.
///
/// The portal has no decline concept, so a `Declined` outcome from the
/// provider is handled as a permanent failure.
pub struct SubmissionCoordinator {
    store: Arc<dyn LeadStore>,
    provider: Arc<dyn EntryProvider>,
    policy: RetryPolicy,
    activity: ActivityTracker,
}

impl SubmissionCoordinator {
    pub fn new(
        store: Arc<dyn LeadStore>,
        provider: Arc<dyn EntryProvider>,
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
                if let Some(note) = result.note {
                    patch = patch.with_note(note);
                }
                self.store.apply_transition(
                    &lead.id,
                    LeadStatus::EntryInProgress,
                    LeadStatus::Entered,
                    patch,
                )?;
                info!(lead_id = %lead.id, "Lead entered into portal");
            }
            outcome => {
                let outcome = match outcome {
                    ActionOutcome::Declined => ActionOutcome::PermanentFailure(
                        "submission rejected by portal".to_string(),
                    ),
                    other => other,
                };
                let reason = outcome
                    .failure_reason()
                    .unwrap_or("unknown failure")
                    .to_string();
                let mut patch = LeadPatch::new()
                    .clear_claim()
                    .increment_attempts(AgentRole::Entry)
                    .with_last_error(reason.clone());

                match self
                    .policy
                    .decide(AgentRole::Entry, lead.entry_attempts, &outcome)
                {
                    RetryDecision::Retry { delay } => {
                        let retry_at =
                            Utc::now() + chrono::Duration::from_std(delay).unwrap_or_default();
                        patch = patch.with_retry_after(retry_at);
                        warn!(
                            lead_id = %lead.id,
                            reason = %reason,
                            retry_at = %retry_at,
                            "Portal entry failed, retry scheduled"
                        );
                    }
                    RetryDecision::TerminalFail => {
                        warn!(lead_id = %lead.id, reason = %reason, "Portal entry failed for good");
                    }
                }

                self.store.apply_transition(
                    &lead.id,
                    LeadStatus::EntryInProgress,
                    LeadStatus::EntryFailed,
                    patch,
                )?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Coordinator for SubmissionCoordinator {
    fn role(&self) -> AgentRole {
        AgentRole::Entry
    }

    async fn process(&self, lead: Lead) -> Result<(), LeadError> {
        self.activity.touch(AgentRole::Entry);

        let lead = match lead.status {
            LeadStatus::EntryInProgress => lead,
            LeadStatus::Confirmed | LeadStatus::EntryFailed => self.store.apply_transition(
                &lead.id,
                lead.status,
                LeadStatus::EntryInProgress,
                LeadPatch::new().clear_retry_after(),
            )?,
            other => {
                warn!(lead_id = %lead.id, status = %other, "Entry worker handed an unworkable lead");
                return Ok(());
            }
        };

        info!(
            lead_id = %lead.id,
            provider = self.provider.name(),
            attempt = lead.entry_attempts + 1,
            "Submitting lead to portal"
        );
        let outcome = self.provider.submit(&lead).await;
        self.settle(lead, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowConfig;
    use crate::lead::{NewLead, SqliteLeadStore};
    use crate::testing::MockEntryProvider;

    fn confirmed_lead(store: &SqliteLeadStore) -> Lead {
        let lead = store
            .create(NewLead {
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                phone: "555-123-4567".to_string(),
                email: "jane@example.com".to_string(),
                address: None,
                city: None,
                state: None,
                zip_code: None,
                notes: None,
            })
            .unwrap();
        store
            .apply_transition(
                &lead.id,
                LeadStatus::Pending,
                LeadStatus::Calling,
                LeadPatch::new(),
            )
            .unwrap();
        store
            .apply_transition(
                &lead.id,
                LeadStatus::Calling,
                LeadStatus::Confirmed,
                LeadPatch::new(),
            )
            .unwrap()
    }

    fn setup() -> (Arc<SqliteLeadStore>, Arc<MockEntryProvider>, SubmissionCoordinator) {
        let store = Arc::new(SqliteLeadStore::in_memory().unwrap());
        let provider = Arc::new(MockEntryProvider::new());
        let config = WorkflowConfig {
            max_entry_attempts: 3,
            retry_backoff_secs: 60,
            ..WorkflowConfig::default()
        };
        let coordinator = SubmissionCoordinator::new(
            store.clone(),
            provider.clone(),
            RetryPolicy::new(&config),
            ActivityTracker::new(),
        );
        (store, provider, coordinator)
    }

    #[tokio::test]
    async fn test_successful_submission_enters_lead() {
        let (store, provider, coordinator) = setup();

        let lead = confirmed_lead(&store);
        coordinator.process(lead.clone()).await.unwrap();

        let updated = store.get(&lead.id).unwrap().unwrap();
        assert_eq!(updated.status, LeadStatus::Entered);
        assert_eq!(updated.entry_attempts, 0);
        assert!(updated.claim.is_none());
        assert_eq!(provider.submission_count().await, 1);
    }

    #[tokio::test]
    async fn test_transient_failure_schedules_retry() {
        let (store, provider, coordinator) = setup();
        provider
            .set_outcome(ActionOutcome::TransientFailure("portal timeout".to_string()))
            .await;

        let lead = confirmed_lead(&store);
        coordinator.process(lead.clone()).await.unwrap();

        let updated = store.get(&lead.id).unwrap().unwrap();
        assert_eq!(updated.status, LeadStatus::EntryFailed);
        assert_eq!(updated.entry_attempts, 1);
        assert_eq!(updated.last_error.as_deref(), Some("portal timeout"));
        assert!(updated.retry_after.is_some());
    }

    #[tokio::test]
    async fn test_declined_is_terminal_for_entry_stage() {
        let (store, provider, coordinator) = setup();
        provider.set_outcome(ActionOutcome::Declined).await;

        let lead = confirmed_lead(&store);
        coordinator.process(lead.clone()).await.unwrap();

        let updated = store.get(&lead.id).unwrap().unwrap();
        assert_eq!(updated.status, LeadStatus::EntryFailed);
        assert_eq!(updated.entry_attempts, 1);
        assert!(updated.retry_after.is_none());
    }

    #[tokio::test]
    async fn test_entry_failures_do_not_touch_call_attempts() {
        let (store, provider, coordinator) = setup();
        provider
            .set_outcome(ActionOutcome::TransientFailure("flaky portal".to_string()))
            .await;

        let lead = confirmed_lead(&store);
        coordinator.process(lead.clone()).await.unwrap();

        let updated = store.get(&lead.id).unwrap().unwrap();
        assert_eq!(updated.call_attempts, 0);
        assert_eq!(updated.entry_attempts, 1);
    }
}
