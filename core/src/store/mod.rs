//! SQLite entity store.
//!
//! RULE: Only the store modules talk to the database.
//! Domain modules call typed store methods — they never execute SQL.
//!
//! The store owns all four collections (plus the event log). The
//! connection is single-threaded; holding the store behind one owner
//! serializes every mutation, which is what upholds the at-most-one
//! invariants here.

mod payout;
mod review;
mod transaction;
mod user;

use crate::{
    error::OpsResult,
    event::{event_type_name, EventLogEntry, OpsEvent},
};
use chrono::NaiveDate;
use rusqlite::{params, Connection};

pub struct PayoutStore {
    conn: Connection,
}

impl PayoutStore {
    /// Open (or create) a store at `path`.
    pub fn open(path: &str) -> OpsResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory store — the default for the admin tool and tests.
    pub fn in_memory() -> OpsResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> OpsResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, logged_on: NaiveDate, event: &OpsEvent) -> OpsResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (logged_on, event_type, payload) VALUES (?1, ?2, ?3)",
            params![
                logged_on,
                event_type_name(event),
                serde_json::to_string(event)?
            ],
        )?;
        Ok(())
    }

    pub fn recent_events(&self, limit: i64) -> OpsResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, logged_on, event_type, payload
             FROM event_log ORDER BY id DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    logged_on: row.get(1)?,
                    event_type: row.get(2)?,
                    payload: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, event_type: &str) -> OpsResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE event_type = ?1",
            params![event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
