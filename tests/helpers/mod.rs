#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use glossa::db;
use glossa::dictionary::record::RawRecord;
use glossa::dictionary::{
    DictionaryStore, MemoryBackend, PersistenceBackend, SqliteBackend, Timestamp,
};
use glossa::segment::{AiError, AiSegmenter, SegmentTriple, Segmenter};
use rusqlite::Connection;

/// Fixed clock for deterministic tests.
pub const T0: Timestamp = 1_700_000_000_000;
pub const DAY_MS: Timestamp = 86_400_000;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// Open (or reopen) a store over the SQLite file at `path`.
pub fn file_store(path: &Path, now: Timestamp) -> DictionaryStore {
    let conn = db::open_database(path).unwrap();
    DictionaryStore::open(Box::new(SqliteBackend::new(conn)), now)
}

/// Empty store plus a handle on its backend for inspecting what was saved.
pub fn memory_store() -> (DictionaryStore, MemoryBackend) {
    let backend = MemoryBackend::new();
    let store = DictionaryStore::open(Box::new(backend.clone()), T0);
    (store, backend)
}

/// Memory backend whose writes can be switched off to exercise failure paths.
#[derive(Clone, Default)]
pub struct FlakyBackend {
    pub memory: MemoryBackend,
    failing: Arc<AtomicBool>,
}

impl FlakyBackend {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl PersistenceBackend for FlakyBackend {
    fn load_all(&self) -> anyhow::Result<Vec<RawRecord>> {
        self.memory.load_all()
    }

    fn save_all(&mut self, records: &[RawRecord], removed: &[String]) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("write rejected");
        }
        self.memory.save_all(records, removed)
    }
}

/// Empty store over a [`FlakyBackend`], plus the switch.
pub fn flaky_store() -> (DictionaryStore, FlakyBackend) {
    let backend = FlakyBackend::default();
    let store = DictionaryStore::open(Box::new(backend.clone()), T0);
    (store, backend)
}

pub fn triple(word: &str, romanization: &str, translation: &str) -> SegmentTriple {
    SegmentTriple {
        word: word.to_string(),
        romanization: romanization.to_string(),
        translation: translation.to_string(),
    }
}

/// AI stand-in that answers from a fixed script and fails on anything else.
#[derive(Default)]
pub struct ScriptedAi {
    replies: HashMap<String, Vec<SegmentTriple>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedAi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, unit: &str, triples: Vec<SegmentTriple>) -> Self {
        self.replies.insert(unit.to_string(), triples);
        self
    }

    /// Units the segmenter asked about, in call order.
    pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl AiSegmenter for ScriptedAi {
    async fn segment_unit(
        &self,
        unit: &str,
        _prompt_override: Option<&str>,
    ) -> Result<Vec<SegmentTriple>, AiError> {
        self.calls.lock().unwrap().push(unit.to_string());
        self.replies
            .get(unit)
            .cloned()
            .ok_or_else(|| AiError::Parse(format!("no scripted reply for {unit}")))
    }
}

/// Segmenter over `ai` plus the handle on its call log.
pub fn scripted_segmenter(ai: ScriptedAi) -> (Segmenter, Arc<Mutex<Vec<String>>>) {
    let calls = ai.call_log();
    (Segmenter::new(Box::new(ai)), calls)
}
