//! Retry and failure policy.

use std::time::Duration;

use crate::agents::ActionOutcome;
use crate::config::WorkflowConfig;
use crate::lead::AgentRole;

/// What to do with a failed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Schedule another attempt after `delay`.
    Retry { delay: Duration },
    /// Give up; the failure status becomes final for this lead.
    TerminalFail,
}

/// Pure policy deciding between retry and terminal failure.
///
/// Attempt counters track failures only: a lead that fails once and then
/// succeeds ends its stage with a counter of 1. The decision is therefore
/// made against the count *including* the failure being handled.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_voice_attempts: u32,
    max_entry_attempts: u32,
    base_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(config: &WorkflowConfig) -> Self {
        Self {
            max_voice_attempts: config.max_voice_attempts,
            max_entry_attempts: config.max_entry_attempts,
            base_backoff: Duration::from_secs(config.retry_backoff_secs),
        }
    }

    pub fn max_attempts(&self, role: AgentRole) -> u32 {
        match role {
            AgentRole::Voice => self.max_voice_attempts,
            AgentRole::Entry => self.max_entry_attempts,
        }
    }

    /// Decide the fate of a failure.
    ///
    /// `attempts_before` is the lead's attempt counter as it stood before
    /// this failure; the failure itself counts as attempt
    /// `attempts_before + 1`. Permanent failures are always terminal.
    pub fn decide(
        &self,
        role: AgentRole,
        attempts_before: u32,
        outcome: &ActionOutcome,
    ) -> RetryDecision {
        match outcome {
            ActionOutcome::TransientFailure(_)
                if attempts_before + 1 < self.max_attempts(role) =>
            {
                RetryDecision::Retry {
                    delay: self.backoff(attempts_before),
                }
            }
            _ => RetryDecision::TerminalFail,
        }
    }

    /// Exponential backoff: base * 2^n, capped to keep the exponent sane.
    fn backoff(&self, attempts_before: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempts_before.min(6))
    }
}
