//! @ai:module:intent Append-only SQLite history of comparison runs
//! @ai:module:layer infrastructure
//! @ai:module:public_api HistoryStore, HistoryEntry
//! @ai:module:stateless false

use crate::error::{BenchError, Result};
use crate::metrics::ComparisonRecord;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// @ai:intent One persisted run, newest rows have the highest id
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: i64,
    pub timestamp: String,
    pub codebase1: String,
    pub codebase2: String,
    pub total1: f64,
    pub total2: f64,
    pub details_json: String,
}

impl HistoryEntry {
    /// @ai:intent Decode the stored record blob
    /// @ai:effects pure
    pub fn record(&self) -> Result<ComparisonRecord> {
        Ok(serde_json::from_str(&self.details_json)?)
    }
}

/// @ai:intent Durable run history; rows are inserted, never updated or deleted
#[derive(Clone)]
pub struct HistoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl HistoryStore {
    /// @ai:intent Open or create the history database at a path
    /// @ai:effects fs:write
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| BenchError::History("connection lock poisoned".to_string()))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                codebase1 TEXT NOT NULL,
                codebase2 TEXT NOT NULL,
                total1 REAL NOT NULL,
                total2 REAL NOT NULL,
                details_json TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// @ai:intent Persist one run atomically and return its row id
    /// @ai:post either the whole row is stored or nothing is
    /// @ai:effects fs:write
    pub fn append(&self, record: &ComparisonRecord) -> Result<i64> {
        let details_json = serde_json::to_string(record)?;

        let conn = self.connection()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO runs (timestamp, codebase1, codebase2, total1, total2, details_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.timestamp,
                record.codebase1,
                record.codebase2,
                record.total_score1,
                record.total_score2,
                details_json
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::info!("Run {} saved to history", id);
        Ok(id)
    }

    /// @ai:intent Most recent runs, newest first
    /// @ai:effects fs:read
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, codebase1, codebase2, total1, total2, details_json
             FROM runs ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(HistoryEntry {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                codebase1: row.get(2)?,
                codebase2: row.get(3)?,
                total1: row.get(4)?,
                total2: row.get(5)?,
                details_json: row.get(6)?,
            })
        })?;

        let entries = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.connection()?;
        let count = conn.query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(count)
    }
}
