//! Worker roles: providers, coordinators, and the runner that drives them.
//!
//! Providers do the external work; coordinators own the status writes
//! around it; the [`AgentRunner`] polls the scheduler and feeds claimed
//! leads to the coordinators.

mod activity;
mod entry;
mod phone_api;
mod portal;
mod provider;
mod runner;
mod voice;

pub use activity::{ActivitySnapshot, ActivityTracker};
pub use entry::SubmissionCoordinator;
pub use phone_api::PhoneApiVoiceProvider;
pub use portal::PortalEntryProvider;
pub use provider::{ActionOutcome, ActionResult, EntryProvider, VoiceProvider};
pub use runner::AgentRunner;
pub use voice::OutreachCoordinator;

use async_trait::async_trait;

use crate::lead::{AgentRole, Lead, LeadError};

/// A stage coordinator: takes a claimed lead through one external action
/// and the status writes around it.
#[async_trait]
pub trait Coordinator: Send + Sync {
    fn role(&self) -> AgentRole;

    /// Process one claimed lead to its next status.
    ///
    /// Must not panic over a single bad lead; failures are recorded on the
    /// lead and surfaced as an error for the caller to log.
    async fn process(&self, lead: Lead) -> Result<(), LeadError>;
}
