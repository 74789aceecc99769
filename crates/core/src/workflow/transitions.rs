//! The lead status transition graph.
//!
//! Every status write in the system, whether from a worker or the HTTP API,
//! goes through [`check`]. There is no bypass.

use crate::lead::{LeadError, LeadStatus};

/// Whether `from -> to` is an edge of the transition graph.
pub fn is_allowed(from: LeadStatus, to: LeadStatus) -> bool {
    use LeadStatus::*;

    matches!(
        (from, to),
        (Pending, Calling)
            | (Calling, Confirmed)
            | (Calling, NotInterested)
            | (Calling, CallFailed)
            | (Confirmed, EntryInProgress)
            | (EntryInProgress, Entered)
            | (EntryInProgress, EntryFailed)
            | (CallFailed, Calling)
            | (EntryFailed, EntryInProgress)
    )
}

/// Validate a transition, returning [`LeadError::InvalidTransition`] for
/// edges not in the graph.
pub fn check(from: LeadStatus, to: LeadStatus) -> Result<(), LeadError> {
    if is_allowed(from, to) {
        Ok(())
    } else {
        Err(LeadError::InvalidTransition { from, to })
    }
}
