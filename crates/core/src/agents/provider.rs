//! Provider traits for the two external actions.
//!
//! Providers perform the outward-facing work (placing a call, submitting a
//! portal entry) and report back a pass/fail outcome. They never touch lead
//! status themselves; the coordinators own all status writes.

use async_trait::async_trait;

use crate::lead::Lead;

/// Extra data carried by a successful action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionResult {
    /// Reference to the call recording, if the provider produced one.
    pub recording_reference: Option<String>,
    /// Free-form note appended to the lead.
    pub note: Option<String>,
}

/// Outcome of an external action on a lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action achieved its goal.
    Success(ActionResult),
    /// The contact declined. Only meaningful for the voice stage.
    Declined,
    /// The action failed in a way worth retrying (timeout, no answer,
    /// upstream 5xx).
    TransientFailure(String),
    /// The action failed in a way a retry cannot fix (bad data, upstream
    /// rejection).
    PermanentFailure(String),
}

impl ActionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ActionOutcome::TransientFailure(_) | ActionOutcome::PermanentFailure(_)
        )
    }

    /// The failure reason, if this is a failure.
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            ActionOutcome::TransientFailure(reason)
            | ActionOutcome::PermanentFailure(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Places outreach calls.
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Place a call to the lead and wait for it to finish.
    async fn place_call(&self, lead: &Lead) -> ActionOutcome;
}

/// Submits confirmed leads to the enrollment portal.
#[async_trait]
pub trait EntryProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Submit the lead and wait for the portal to accept or reject it.
    async fn submit(&self, lead: &Lead) -> ActionOutcome;
}
