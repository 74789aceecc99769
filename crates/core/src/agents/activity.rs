//! Per-role last-activity tracking, surfaced by the status endpoint.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::lead::AgentRole;

#[derive(Debug, Default)]
struct Inner {
    voice: Option<DateTime<Utc>>,
    entry: Option<DateTime<Utc>>,
}

/// Shared, cheaply clonable tracker of when each role last did anything.
#[derive(Debug, Clone, Default)]
pub struct ActivityTracker {
    inner: Arc<RwLock<Inner>>,
}

/// Snapshot of per-role activity for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ActivitySnapshot {
    pub voice_last_activity: Option<DateTime<Utc>>,
    pub entry_last_activity: Option<DateTime<Utc>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch(&self, role: AgentRole) {
        let mut inner = self.inner.write().unwrap();
        let now = Some(Utc::now());
        match role {
            AgentRole::Voice => inner.voice = now,
            AgentRole::Entry => inner.entry = now,
        }
    }

    pub fn last_activity(&self, role: AgentRole) -> Option<DateTime<Utc>> {
        let inner = self.inner.read().unwrap();
        match role {
            AgentRole::Voice => inner.voice,
            AgentRole::Entry => inner.entry,
        }
    }

    pub fn snapshot(&self) -> ActivitySnapshot {
        let inner = self.inner.read().unwrap();
        ActivitySnapshot {
            voice_last_activity: inner.voice,
            entry_last_activity: inner.entry,
        }
    }
}
