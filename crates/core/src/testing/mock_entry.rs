//! Mock entry provider with configurable outcomes.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::agents::{ActionOutcome, ActionResult, EntryProvider};
use crate::lead::Lead;

/// Entry provider double. Defaults to accepting every submission.
pub struct MockEntryProvider {
    default_outcome: RwLock<ActionOutcome>,
    queued: RwLock<VecDeque<ActionOutcome>>,
    submissions: RwLock<Vec<String>>,
    delay: RwLock<Option<Duration>>,
}

impl MockEntryProvider {
    pub fn new() -> Self {
        Self {
            default_outcome: RwLock::new(ActionOutcome::Success(ActionResult {
                recording_reference: None,
                note: Some("portal accepted submission".to_string()),
            })),
            queued: RwLock::new(VecDeque::new()),
            submissions: RwLock::new(Vec::new()),
            delay: RwLock::new(None),
        }
    }

    pub async fn set_outcome(&self, outcome: ActionOutcome) {
        *self.default_outcome.write().await = outcome;
    }

    /// Queue an outcome for the next submission only.
    pub async fn queue_outcome(&self, outcome: ActionOutcome) {
        self.queued.write().await.push_back(outcome);
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Ids of leads submitted so far, in submission order.
    pub async fn recorded_submissions(&self) -> Vec<String> {
        self.submissions.read().await.clone()
    }

    pub async fn submission_count(&self) -> usize {
        self.submissions.read().await.len()
    }
}

impl Default for MockEntryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntryProvider for MockEntryProvider {
    fn name(&self) -> &str {
        "mock-entry"
    }

    async fn submit(&self, lead: &Lead) -> ActionOutcome {
        if let Some(delay) = *self.delay.read().await {
            tokio::time::sleep(delay).await;
        }

        self.submissions.write().await.push(lead.id.clone());

        if let Some(outcome) = self.queued.write().await.pop_front() {
            return outcome;
        }
        self.default_outcome.read().await.clone()
    }
}
