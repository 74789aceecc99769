//! Mock voice provider with configurable outcomes.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::agents::{ActionOutcome, ActionResult, VoiceProvider};
use crate::lead::Lead;

/// Voice provider double.
///
/// Returns queued outcomes first, then falls back to the default outcome
/// (a success with a recording). Records the id of every lead it is asked
/// to call.
pub struct MockVoiceProvider {
    default_outcome: RwLock<ActionOutcome>,
    queued: RwLock<VecDeque<ActionOutcome>>,
    calls: RwLock<Vec<String>>,
    delay: RwLock<Option<Duration>>,
}

impl MockVoiceProvider {
    pub fn new() -> Self {
        Self {
            default_outcome: RwLock::new(ActionOutcome::Success(ActionResult {
                recording_reference: Some("mock-recording".to_string()),
                note: None,
            })),
            queued: RwLock::new(VecDeque::new()),
            calls: RwLock::new(Vec::new()),
            delay: RwLock::new(None),
        }
    }

    /// Set the outcome returned for every call (unless queued outcomes
    /// are pending).
    pub async fn set_outcome(&self, outcome: ActionOutcome) {
        *self.default_outcome.write().await = outcome;
    }

    /// Queue an outcome for the next call only.
    pub async fn queue_outcome(&self, outcome: ActionOutcome) {
        self.queued.write().await.push_back(outcome);
    }

    /// Make every call take this long, for exercising concurrency.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Ids of leads called so far, in call order.
    pub async fn recorded_calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

impl Default for MockVoiceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VoiceProvider for MockVoiceProvider {
    fn name(&self) -> &str {
        "mock-voice"
    }

    async fn place_call(&self, lead: &Lead) -> ActionOutcome {
        if let Some(delay) = *self.delay.read().await {
            tokio::time::sleep(delay).await;
        }

        self.calls.write().await.push(lead.id.clone());

        if let Some(outcome) = self.queued.write().await.pop_front() {
            return outcome;
        }
        self.default_outcome.read().await.clone()
    }
}
