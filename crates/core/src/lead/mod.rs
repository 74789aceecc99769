//! Lead storage and data model.
//!
//! A [`Lead`] is the unit of work moved through the pipeline. The
//! [`LeadStore`] trait defines the persistence seam; [`SqliteLeadStore`]
//! is the production implementation.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteLeadStore;
pub use store::{
    BatchInsertReport, LeadError, LeadFilter, LeadPatch, LeadStore, ResetSummary, StatusCount,
};
pub use types::{AgentRole, Claim, Lead, LeadStatus, NewLead};
