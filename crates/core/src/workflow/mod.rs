//! The lead state machine and failure policy.

pub mod retry;
pub mod transitions;

pub use retry::{RetryDecision, RetryPolicy};
