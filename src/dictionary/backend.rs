//! Persistence backends for the dictionary store.
//!
//! The store keeps its working set in memory and hands the full record list
//! to a [`PersistenceBackend`] after every mutation, together with the words
//! it deleted. Rows the store never names are left alone, so a record the
//! store could not decode survives later saves. [`SqliteBackend`] is the
//! durable implementation; [`MemoryBackend`] keeps records in process.

use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

use super::record::RawRecord;
use super::types::Timestamp;

/// One grading event, appended to the review history.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewLogEntry {
    pub word: String,
    pub quality: u8,
    pub interval_days: f64,
    pub ease_factor: f64,
    pub reviewed_at: Timestamp,
}

/// Load-all / save-all storage for serialized dictionary records.
pub trait PersistenceBackend: Send {
    /// Every persisted record, in no particular order. A row that cannot be
    /// read as text still comes back, so the caller can reject it alone.
    fn load_all(&self) -> Result<Vec<RawRecord>>;

    /// Insert or replace `records` by word and delete the rows for `removed`,
    /// atomically. Rows for any other word are kept as they are.
    fn save_all(&mut self, records: &[RawRecord], removed: &[String]) -> Result<()>;

    /// Append one grading event. Backends without history may ignore it.
    fn log_review(&mut self, _entry: &ReviewLogEntry) -> Result<()> {
        Ok(())
    }

    /// Number of grading events at or after `since`.
    fn reviews_since(&self, _since: Timestamp) -> Result<u64> {
        Ok(0)
    }
}

/// SQLite-backed storage: one row per word in `entries`, grading history in `review_log`.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Wrap a connection that already has the schema and migrations applied
    /// (see [`crate::db::open_database`]).
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl PersistenceBackend for SqliteBackend {
    fn load_all(&self) -> Result<Vec<RawRecord>> {
        let mut stmt = self.conn.prepare("SELECT word, record FROM entries")?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().context("failed to read entries")? {
            records.push(RawRecord {
                word: column_text(row.get_ref(0)?),
                json: column_text(row.get_ref(1)?),
            });
        }
        Ok(records)
    }

    fn save_all(&mut self, records: &[RawRecord], removed: &[String]) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut delete = tx.prepare("DELETE FROM entries WHERE word = ?1")?;
            for word in removed {
                delete.execute(params![word])?;
            }
            let mut upsert = tx.prepare(
                "INSERT INTO entries (word, record, updated_at) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(word) DO UPDATE SET record = excluded.record, updated_at = excluded.updated_at",
            )?;
            for record in records {
                upsert.execute(params![record.word, record.json, now])?;
            }
        }
        tx.commit().context("failed to commit entries")?;
        Ok(())
    }

    fn log_review(&mut self, entry: &ReviewLogEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO review_log (word, quality, interval_days, ease_factor, reviewed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.word,
                entry.quality,
                entry.interval_days,
                entry.ease_factor,
                entry.reviewed_at,
            ],
        )?;
        Ok(())
    }

    fn reviews_since(&self, since: Timestamp) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM review_log WHERE reviewed_at >= ?1",
            params![since],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

/// A column value as text. Non-text values (a stray blob, a number, NULL)
/// become text the record decoder rejects, which fails that row only.
fn column_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Integer(n) => n.to_string(),
        ValueRef::Real(x) => x.to_string(),
        ValueRef::Null => String::new(),
    }
}

/// Shared contents of a [`MemoryBackend`].
#[derive(Debug, Default)]
pub struct MemoryContents {
    pub records: Vec<RawRecord>,
    pub reviews: Vec<ReviewLogEntry>,
    pub saves: u64,
}

/// In-process backend. Clones share the same contents, so a caller can keep
/// a handle to inspect what the store persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    contents: Arc<Mutex<MemoryContents>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from already-serialized records (e.g. a legacy export).
    pub fn with_records(records: Vec<RawRecord>) -> Self {
        let backend = Self::default();
        backend.lock().records = records;
        backend
    }

    pub fn records(&self) -> Vec<RawRecord> {
        self.lock().records.clone()
    }

    pub fn reviews(&self) -> Vec<ReviewLogEntry> {
        self.lock().reviews.clone()
    }

    /// Number of `save_all` calls so far.
    pub fn save_count(&self) -> u64 {
        self.lock().saves
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryContents> {
        // A poisoned lock only means a test panicked mid-write; the data is still usable.
        self.contents.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PersistenceBackend for MemoryBackend {
    fn load_all(&self) -> Result<Vec<RawRecord>> {
        Ok(self.records())
    }

    fn save_all(&mut self, records: &[RawRecord], removed: &[String]) -> Result<()> {
        let mut contents = self.lock();
        contents.records.retain(|r| !removed.contains(&r.word));
        for record in records {
            match contents.records.iter_mut().find(|r| r.word == record.word) {
                Some(existing) => existing.json.clone_from(&record.json),
                None => contents.records.push(record.clone()),
            }
        }
        contents.saves += 1;
        Ok(())
    }

    fn log_review(&mut self, entry: &ReviewLogEntry) -> Result<()> {
        self.lock().reviews.push(entry.clone());
        Ok(())
    }

    fn reviews_since(&self, since: Timestamp) -> Result<u64> {
        Ok(self
            .lock()
            .reviews
            .iter()
            .filter(|r| r.reviewed_at >= since)
            .count() as u64)
    }
}
