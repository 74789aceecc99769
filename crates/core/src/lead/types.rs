//! Core lead types: status enumeration, claims, and the lead record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing status of a lead.
///
/// Leads move through these statuses along a fixed transition graph; any
/// write that does not follow an edge of the graph is rejected by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    /// Imported, waiting for an outreach call.
    Pending,
    /// An outreach call is in flight.
    Calling,
    /// The contact agreed; waiting for portal entry.
    Confirmed,
    /// A portal submission is in flight.
    EntryInProgress,
    /// Submitted to the portal. Terminal.
    Entered,
    /// The contact declined. Terminal.
    NotInterested,
    /// The call failed. Retryable until attempts are exhausted.
    CallFailed,
    /// The portal submission failed. Retryable until attempts are exhausted.
    EntryFailed,
}

impl LeadStatus {
    /// All statuses, in pipeline order. Used for zero-filled statistics.
    pub const ALL: [LeadStatus; 8] = [
        LeadStatus::Pending,
        LeadStatus::Calling,
        LeadStatus::Confirmed,
        LeadStatus::EntryInProgress,
        LeadStatus::Entered,
        LeadStatus::NotInterested,
        LeadStatus::CallFailed,
        LeadStatus::EntryFailed,
    ];

    /// The snake_case wire/database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Pending => "pending",
            LeadStatus::Calling => "calling",
            LeadStatus::Confirmed => "confirmed",
            LeadStatus::EntryInProgress => "entry_in_progress",
            LeadStatus::Entered => "entered",
            LeadStatus::NotInterested => "not_interested",
            LeadStatus::CallFailed => "call_failed",
            LeadStatus::EntryFailed => "entry_failed",
        }
    }

    /// Parse the snake_case representation back into a status.
    pub fn parse(s: &str) -> Option<LeadStatus> {
        LeadStatus::ALL.into_iter().find(|st| st.as_str() == s)
    }

    /// Whether this status has no outgoing edges at all.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Entered | LeadStatus::NotInterested)
    }

    /// Whether this is one of the per-stage failure statuses.
    pub fn is_failure(&self) -> bool {
        matches!(self, LeadStatus::CallFailed | LeadStatus::EntryFailed)
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two worker roles that claim and process leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Voice,
    Entry,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Voice => "voice",
            AgentRole::Entry => "entry",
        }
    }

    /// Parse the snake_case representation back into a role.
    pub fn parse(s: &str) -> Option<AgentRole> {
        match s {
            "voice" => Some(AgentRole::Voice),
            "entry" => Some(AgentRole::Entry),
            _ => None,
        }
    }

    /// The status in which fresh work for this role waits.
    pub fn queue_status(&self) -> LeadStatus {
        match self {
            AgentRole::Voice => LeadStatus::Pending,
            AgentRole::Entry => LeadStatus::Confirmed,
        }
    }

    /// The in-progress status this role moves a lead into while acting on it.
    pub fn working_status(&self) -> LeadStatus {
        match self {
            AgentRole::Voice => LeadStatus::Calling,
            AgentRole::Entry => LeadStatus::EntryInProgress,
        }
    }

    /// The retryable failure status for this role's stage.
    pub fn failure_status(&self) -> LeadStatus {
        match self {
            AgentRole::Voice => LeadStatus::CallFailed,
            AgentRole::Entry => LeadStatus::EntryFailed,
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An exclusive, lease-bounded claim on a lead.
///
/// A claim whose lease has expired counts as no claim at all, which is how
/// work held by a crashed worker becomes claimable again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub owner_role: AgentRole,
    pub claimed_at: DateTime<Utc>,
    pub lease_expires_at: DateTime<Utc>,
}

impl Claim {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.lease_expires_at <= now
    }
}

/// A lead record as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub status: LeadStatus,
    pub claim: Option<Claim>,
    /// Failed outreach call attempts. Incremented on failure only.
    pub call_attempts: u32,
    /// Failed portal entry attempts. Incremented on failure only.
    pub entry_attempts: u32,
    /// Append-only, newline-separated processing notes.
    pub notes: Option<String>,
    /// Reference to the call recording, set when a call completes.
    pub recording_reference: Option<String>,
    /// Reason string from the most recent failure.
    pub last_error: Option<String>,
    /// When a retryable failure becomes eligible for another attempt.
    /// `None` on a failure status means the failure is terminal.
    pub retry_after: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Attempt counter for the given role's stage.
    pub fn attempts(&self, role: AgentRole) -> u32 {
        match role {
            AgentRole::Voice => self.call_attempts,
            AgentRole::Entry => self.entry_attempts,
        }
    }

    /// Whether the lead is held by an unexpired claim.
    pub fn has_live_claim(&self, now: DateTime<Utc>) -> bool {
        self.claim.as_ref().is_some_and(|c| !c.is_expired(now))
    }
}

/// Request to create a lead. New leads always start out `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}
