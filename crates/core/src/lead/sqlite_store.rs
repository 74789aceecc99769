//! SQLite-backed lead store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};

use crate::workflow::transitions;

use super::{
    AgentRole, BatchInsertReport, Claim, Lead, LeadError, LeadFilter, LeadPatch, LeadStatus,
    LeadStore, NewLead, ResetSummary, StatusCount,
};

const LEAD_COLUMNS: &str = "id, first_name, last_name, phone, email, address, city, state, \
     zip_code, status, claim_owner, claim_claimed_at, claim_expires_at, call_attempts, \
     entry_attempts, notes, recording_reference, last_error, retry_after, created_at, updated_at";

/// Fixed-width RFC 3339 rendering so that TEXT comparison in SQL matches
/// chronological order.
fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// SQLite-backed lead store.
pub struct SqliteLeadStore {
    conn: Mutex<Connection>,
}

impl SqliteLeadStore {
    /// Open or create the database file and initialize the schema.
    pub fn new(path: &Path) -> Result<Self, LeadError> {
        let conn = Connection::open(path).map_err(|e| LeadError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, LeadError> {
        let conn = Connection::open_in_memory().map_err(|e| LeadError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), LeadError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS leads (
                id TEXT PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                phone TEXT NOT NULL,
                email TEXT NOT NULL,
                address TEXT,
                city TEXT,
                state TEXT,
                zip_code TEXT,
                status TEXT NOT NULL,
                claim_owner TEXT,
                claim_claimed_at TEXT,
                claim_expires_at TEXT,
                call_attempts INTEGER NOT NULL DEFAULT 0,
                entry_attempts INTEGER NOT NULL DEFAULT 0,
                notes TEXT,
                recording_reference TEXT,
                last_error TEXT,
                retry_after TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_leads_status ON leads(status);
            CREATE INDEX IF NOT EXISTS idx_leads_updated_at ON leads(updated_at);
            "#,
        )
        .map_err(|e| LeadError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_lead(row: &rusqlite::Row) -> rusqlite::Result<Lead> {
        let status_str: String = row.get(9)?;
        let claim_owner: Option<String> = row.get(10)?;
        let claim_claimed_at: Option<String> = row.get(11)?;
        let claim_expires_at: Option<String> = row.get(12)?;
        let retry_after: Option<String> = row.get(18)?;
        let created_at_str: String = row.get(19)?;
        let updated_at_str: String = row.get(20)?;

        // Parse status - default to pending if the value is unrecognized
        // (shouldn't happen with data we wrote ourselves)
        let status = LeadStatus::parse(&status_str).unwrap_or(LeadStatus::Pending);

        let claim = match (claim_owner, claim_claimed_at, claim_expires_at) {
            (Some(owner), Some(claimed_at), Some(expires_at)) => {
                AgentRole::parse(&owner).map(|owner_role| Claim {
                    owner_role,
                    claimed_at: parse_ts(&claimed_at),
                    lease_expires_at: parse_ts(&expires_at),
                })
            }
            _ => None,
        };

        Ok(Lead {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            phone: row.get(3)?,
            email: row.get(4)?,
            address: row.get(5)?,
            city: row.get(6)?,
            state: row.get(7)?,
            zip_code: row.get(8)?,
            status,
            claim,
            call_attempts: row.get(13)?,
            entry_attempts: row.get(14)?,
            notes: row.get(15)?,
            recording_reference: row.get(16)?,
            last_error: row.get(17)?,
            retry_after: retry_after.map(|s| parse_ts(&s)),
            created_at: parse_ts(&created_at_str),
            updated_at: parse_ts(&updated_at_str),
        })
    }

    fn get_locked(conn: &Connection, id: &str) -> Result<Option<Lead>, LeadError> {
        let sql = format!("SELECT {} FROM leads WHERE id = ?", LEAD_COLUMNS);
        let result = conn.query_row(&sql, params![id], Self::row_to_lead);

        match result {
            Ok(lead) => Ok(Some(lead)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(LeadError::Database(e.to_string())),
        }
    }

    fn insert_locked(conn: &Connection, new_lead: NewLead) -> Result<Lead, LeadError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO leads (id, first_name, last_name, phone, email, address, city, state, \
             zip_code, status, notes, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                new_lead.first_name,
                new_lead.last_name,
                new_lead.phone,
                new_lead.email,
                new_lead.address,
                new_lead.city,
                new_lead.state,
                new_lead.zip_code,
                LeadStatus::Pending.as_str(),
                new_lead.notes,
                ts(now),
                ts(now),
            ],
        )
        .map_err(|e| LeadError::Database(e.to_string()))?;

        Ok(Lead {
            id,
            first_name: new_lead.first_name,
            last_name: new_lead.last_name,
            phone: new_lead.phone,
            email: new_lead.email,
            address: new_lead.address,
            city: new_lead.city,
            state: new_lead.state,
            zip_code: new_lead.zip_code,
            status: LeadStatus::Pending,
            claim: None,
            call_attempts: 0,
            entry_attempts: 0,
            notes: new_lead.notes,
            recording_reference: None,
            last_error: None,
            retry_after: None,
            created_at: now,
            updated_at: now,
        })
    }
}

impl LeadStore for SqliteLeadStore {
    fn create(&self, new_lead: NewLead) -> Result<Lead, LeadError> {
        let conn = self.conn.lock().unwrap();
        Self::insert_locked(&conn, new_lead)
    }

    fn create_batch(&self, new_leads: Vec<NewLead>) -> Result<BatchInsertReport, LeadError> {
        let conn = self.conn.lock().unwrap();

        let mut report = BatchInsertReport::default();
        for new_lead in new_leads {
            match Self::insert_locked(&conn, new_lead) {
                Ok(_) => report.inserted += 1,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to insert lead during batch import");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    fn get(&self, id: &str) -> Result<Option<Lead>, LeadError> {
        let conn = self.conn.lock().unwrap();
        Self::get_locked(&conn, id)
    }

    fn list(&self, filter: &LeadFilter) -> Result<Vec<Lead>, LeadError> {
        let conn = self.conn.lock().unwrap();

        let mut conditions = Vec::new();
        let mut sql_params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            sql_params.push(Box::new(status.as_str()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT {} FROM leads {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            LEAD_COLUMNS, where_clause
        );

        sql_params.push(Box::new(filter.limit));
        sql_params.push(Box::new(filter.offset));

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| LeadError::Database(e.to_string()))?;

        let param_refs: Vec<&dyn rusqlite::ToSql> = sql_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_lead)
            .map_err(|e| LeadError::Database(e.to_string()))?;

        let mut leads = Vec::new();
        for row_result in rows {
            leads.push(row_result.map_err(|e| LeadError::Database(e.to_string()))?);
        }

        Ok(leads)
    }

    fn count_by_status(&self) -> Result<Vec<StatusCount>, LeadError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare("SELECT status, COUNT(*) FROM leads GROUP BY status")
            .map_err(|e| LeadError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let status: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((status, count))
            })
            .map_err(|e| LeadError::Database(e.to_string()))?;

        let mut counts = Vec::new();
        for row_result in rows {
            let (status_str, count) = row_result.map_err(|e| LeadError::Database(e.to_string()))?;
            if let Some(status) = LeadStatus::parse(&status_str) {
                counts.push(StatusCount { status, count });
            }
        }

        Ok(counts)
    }

    fn list_eligible(&self, status: LeadStatus, limit: usize) -> Result<Vec<Lead>, LeadError> {
        let conn = self.conn.lock().unwrap();
        let now = ts(Utc::now());

        // Failure statuses are only workable while a retry is scheduled;
        // a NULL retry_after there means the failure is terminal.
        let retry_clause = if status.is_failure() {
            "retry_after IS NOT NULL AND retry_after <= ?2"
        } else {
            "(retry_after IS NULL OR retry_after <= ?2)"
        };

        let sql = format!(
            "SELECT {} FROM leads \
             WHERE status = ?1 \
               AND (claim_expires_at IS NULL OR claim_expires_at <= ?2) \
               AND {} \
             ORDER BY updated_at ASC LIMIT ?3",
            LEAD_COLUMNS, retry_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| LeadError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![status.as_str(), now, limit as i64],
                Self::row_to_lead,
            )
            .map_err(|e| LeadError::Database(e.to_string()))?;

        let mut leads = Vec::new();
        for row_result in rows {
            leads.push(row_result.map_err(|e| LeadError::Database(e.to_string()))?);
        }

        Ok(leads)
    }

    fn try_claim(
        &self,
        id: &str,
        expected: LeadStatus,
        role: AgentRole,
        lease_expires_at: DateTime<Utc>,
    ) -> Result<Lead, LeadError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        // The status and lease checks live in the WHERE clause, so the
        // claim either lands whole or not at all.
        let updated = conn
            .execute(
                "UPDATE leads SET claim_owner = ?1, claim_claimed_at = ?2, \
                 claim_expires_at = ?3, updated_at = ?2 \
                 WHERE id = ?4 AND status = ?5 \
                   AND (claim_expires_at IS NULL OR claim_expires_at <= ?2)",
                params![
                    role.as_str(),
                    ts(now),
                    ts(lease_expires_at),
                    id,
                    expected.as_str(),
                ],
            )
            .map_err(|e| LeadError::Database(e.to_string()))?;

        if updated == 1 {
            return Self::get_locked(&conn, id)?.ok_or_else(|| LeadError::NotFound(id.to_string()));
        }

        match Self::get_locked(&conn, id)? {
            Some(_) => Err(LeadError::ClaimConflict {
                id: id.to_string(),
                expected,
            }),
            None => Err(LeadError::NotFound(id.to_string())),
        }
    }

    fn apply_transition(
        &self,
        id: &str,
        expected: LeadStatus,
        new_status: LeadStatus,
        patch: LeadPatch,
    ) -> Result<Lead, LeadError> {
        transitions::check(expected, new_status)?;

        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        let mut sets = vec!["status = ?".to_string(), "updated_at = ?".to_string()];
        let mut sql_params: Vec<Box<dyn rusqlite::ToSql>> =
            vec![Box::new(new_status.as_str()), Box::new(ts(now))];

        if patch.clear_claim {
            sets.push("claim_owner = NULL".to_string());
            sets.push("claim_claimed_at = NULL".to_string());
            sets.push("claim_expires_at = NULL".to_string());
        }

        if let Some(role) = patch.increment_attempts {
            match role {
                AgentRole::Voice => sets.push("call_attempts = call_attempts + 1".to_string()),
                AgentRole::Entry => sets.push("entry_attempts = entry_attempts + 1".to_string()),
            }
        }

        if let Some(reference) = patch.recording_reference {
            sets.push("recording_reference = ?".to_string());
            sql_params.push(Box::new(reference));
        }

        if let Some(note) = patch.append_note {
            sets.push(
                "notes = CASE WHEN notes IS NULL THEN ? ELSE notes || char(10) || ? END"
                    .to_string(),
            );
            sql_params.push(Box::new(note.clone()));
            sql_params.push(Box::new(note));
        }

        if let Some(error) = patch.last_error {
            sets.push("last_error = ?".to_string());
            sql_params.push(Box::new(error));
        }

        if let Some(when) = patch.retry_after {
            sets.push("retry_after = ?".to_string());
            sql_params.push(Box::new(ts(when)));
        } else if patch.clear_retry_after {
            sets.push("retry_after = NULL".to_string());
        }

        let sql = format!("UPDATE leads SET {} WHERE id = ? AND status = ?", sets.join(", "));
        sql_params.push(Box::new(id.to_string()));
        sql_params.push(Box::new(expected.as_str()));

        let param_refs: Vec<&dyn rusqlite::ToSql> = sql_params.iter().map(|p| p.as_ref()).collect();

        let updated = conn
            .execute(&sql, param_refs.as_slice())
            .map_err(|e| LeadError::Database(e.to_string()))?;

        if updated == 1 {
            return Self::get_locked(&conn, id)?.ok_or_else(|| LeadError::NotFound(id.to_string()));
        }

        match Self::get_locked(&conn, id)? {
            Some(lead) => Err(LeadError::StaleState {
                id: id.to_string(),
                expected,
                actual: lead.status,
            }),
            None => Err(LeadError::NotFound(id.to_string())),
        }
    }

    fn reset_in_flight(&self) -> Result<ResetSummary, LeadError> {
        let conn = self.conn.lock().unwrap();
        let now = ts(Utc::now());

        let calls_reset = conn
            .execute(
                "UPDATE leads SET status = ?1, claim_owner = NULL, claim_claimed_at = NULL, \
                 claim_expires_at = NULL, retry_after = NULL, updated_at = ?2 WHERE status = ?3",
                params![
                    LeadStatus::Pending.as_str(),
                    now,
                    LeadStatus::Calling.as_str()
                ],
            )
            .map_err(|e| LeadError::Database(e.to_string()))?;

        let entries_reset = conn
            .execute(
                "UPDATE leads SET status = ?1, claim_owner = NULL, claim_claimed_at = NULL, \
                 claim_expires_at = NULL, retry_after = NULL, updated_at = ?2 WHERE status = ?3",
                params![
                    LeadStatus::Confirmed.as_str(),
                    now,
                    LeadStatus::EntryInProgress.as_str()
                ],
            )
            .map_err(|e| LeadError::Database(e.to_string()))?;

        let claims_cleared = conn
            .execute(
                "UPDATE leads SET claim_owner = NULL, claim_claimed_at = NULL, \
                 claim_expires_at = NULL, updated_at = ?1 WHERE claim_owner IS NOT NULL",
                params![now],
            )
            .map_err(|e| LeadError::Database(e.to_string()))?;

        Ok(ResetSummary {
            calls_reset,
            entries_reset,
            claims_cleared,
        })
    }
}
