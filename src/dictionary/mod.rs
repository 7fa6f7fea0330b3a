//! The dictionary store: every word the learner has met.
//!
//! [`DictionaryStore`] owns entry lifetime. Its working set is a `HashMap`
//! keyed by exact word text; every mutating call builds the changed set on a
//! copy, writes it through the configured [`PersistenceBackend`], and only
//! then swaps it in. Loading runs each record through
//! [`record::upgrade_record`] once, and writes the store back immediately if
//! any record had to be upgraded. Records that fail to decode stay in the
//! backend untouched until [`DictionaryStore::clear`].

pub mod backend;
pub mod record;
pub mod transfer;
pub mod types;

use anyhow::{bail, Result};
use std::collections::HashMap;

pub use backend::{MemoryBackend, PersistenceBackend, ReviewLogEntry, SqliteBackend};
pub use types::{DictionaryEntry, ImportReport, SrsState, StoreStats, Timestamp};

use crate::error::StoreError;
use crate::review::Quality;
use types::{end_of_local_day, start_of_local_day, MATURE_INTERVAL_DAYS};

type Entries = HashMap<String, DictionaryEntry>;

pub struct DictionaryStore {
    entries: Entries,
    backend: Box<dyn PersistenceBackend>,
    /// Words whose stored record could not be decoded. Kept out of every
    /// save so the backend never loses them.
    unreadable: Vec<String>,
    /// The backend could not be read at all. Writes are refused so an empty
    /// working set never overwrites what is stored.
    load_failed: bool,
}

impl DictionaryStore {
    /// Load every record from `backend`, upgrading older formats.
    ///
    /// Never fails: an unreadable backend or malformed records leave the
    /// store empty (or without those records) and are logged. After a failed
    /// load every mutation returns [`StoreError::Persistence`].
    pub fn open(backend: Box<dyn PersistenceBackend>, now: Timestamp) -> Self {
        let mut store = Self {
            entries: HashMap::new(),
            backend,
            unreadable: Vec::new(),
            load_failed: false,
        };

        let records = match store.backend.load_all() {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "failed to load dictionary, starting empty and read-only");
                store.load_failed = true;
                return store;
            }
        };

        let mut upgraded = 0usize;
        let mut skipped = 0usize;
        for raw in records {
            match record::upgrade_record(&raw.json, now) {
                Ok((entry, was_upgraded)) => {
                    if was_upgraded {
                        upgraded += 1;
                    }
                    store.entries.insert(entry.word.clone(), entry);
                }
                Err(e) => {
                    tracing::warn!(word = %raw.word, error = %format!("{e:#}"), "skipping unreadable record");
                    store.unreadable.push(raw.word);
                    skipped += 1;
                }
            }
        }

        if upgraded > 0 {
            tracing::info!(upgraded, "backfilling upgraded dictionary records");
            let entries = std::mem::take(&mut store.entries);
            if let Err(e) = store.persist(&entries, &[]) {
                tracing::error!(error = %format!("{e:#}"), "failed to persist upgraded records");
            }
            store.entries = entries;
        }

        tracing::info!(entries = store.entries.len(), skipped, "dictionary loaded");
        store
    }

    /// Convenience: an empty store over a fresh [`MemoryBackend`].
    pub fn in_memory() -> Self {
        Self {
            entries: HashMap::new(),
            backend: Box::new(MemoryBackend::new()),
            unreadable: Vec::new(),
            load_failed: false,
        }
    }

    /// Exact, character-for-character lookup.
    pub fn lookup(&self, word: &str) -> Option<&DictionaryEntry> {
        self.entries.get(word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record an encounter of `word`.
    ///
    /// A new word becomes an entry that is due immediately. For a known word
    /// the usage count goes up, `meaning` is appended unless already present,
    /// and a non-empty `romanization` replaces the stored one. SRS fields of a
    /// known word are never touched.
    pub fn upsert(
        &mut self,
        word: &str,
        romanization: &str,
        meaning: &str,
        now: Timestamp,
    ) -> Result<&DictionaryEntry, StoreError> {
        self.commit(&[], |entries| {
            match entries.get_mut(word) {
                Some(entry) => {
                    entry.usage_count += 1;
                    if !meaning.is_empty() {
                        entry.add_meaning(meaning);
                    }
                    if !romanization.is_empty() && entry.romanization != romanization {
                        entry.romanization = romanization.to_string();
                    }
                }
                None => {
                    if meaning.is_empty() {
                        return Err(StoreError::EmptyMeaning(word.to_string()));
                    }
                    tracing::debug!(word, "new dictionary entry");
                    entries.insert(
                        word.to_string(),
                        DictionaryEntry::new(word, romanization, meaning, now),
                    );
                }
            }
            Ok(())
        })?;

        self.entries
            .get(word)
            .ok_or_else(|| StoreError::UnknownWord(word.to_string()))
    }

    /// Bump usage counts for words matched straight from the dictionary.
    pub fn record_encounters(&mut self, words: &[&str]) -> Result<(), StoreError> {
        self.commit(&[], |entries| {
            for word in words {
                let entry = entries
                    .get_mut(*word)
                    .ok_or_else(|| StoreError::UnknownWord(word.to_string()))?;
                entry.usage_count += 1;
            }
            Ok(())
        })
    }

    /// All entries, unordered.
    pub fn all_entries(&self) -> impl Iterator<Item = &DictionaryEntry> + '_ {
        self.entries.values()
    }

    /// Entries with `next_review_at <= as_of`, oldest-due first, ties by word.
    pub fn due_entries(&self, as_of: Timestamp) -> Vec<DictionaryEntry> {
        let mut due: Vec<DictionaryEntry> = self
            .entries
            .values()
            .filter(|e| e.srs.is_due(as_of))
            .cloned()
            .collect();
        due.sort_by(|a, b| {
            a.srs
                .next_review_at
                .cmp(&b.srs.next_review_at)
                .then_with(|| a.word.cmp(&b.word))
        });
        due
    }

    /// Store a scheduler result for `word`. Ease and interval are pulled
    /// into their valid ranges first.
    pub fn apply_review_result(&mut self, word: &str, state: SrsState) -> Result<(), StoreError> {
        self.commit(&[], |entries| {
            let entry = entries
                .get_mut(word)
                .ok_or_else(|| StoreError::UnknownWord(word.to_string()))?;
            entry.srs = state.normalized();
            Ok(())
        })
    }

    /// Append a grading event to the review history. History is advisory: a
    /// backend failure is logged, not returned.
    pub fn record_review(&mut self, word: &str, quality: Quality, state: &SrsState) {
        let entry = ReviewLogEntry {
            word: word.to_string(),
            quality: quality.value(),
            interval_days: state.interval_days,
            ease_factor: state.ease_factor,
            reviewed_at: state.last_reviewed_at,
        };
        if let Err(e) = self.backend.log_review(&entry) {
            tracing::warn!(word, error = %format!("{e:#}"), "failed to log review");
        }
    }

    /// Delete a single word.
    pub fn remove(&mut self, word: &str) -> Result<DictionaryEntry, StoreError> {
        self.commit(&[word.to_string()], |entries| {
            entries
                .remove(word)
                .ok_or_else(|| StoreError::UnknownWord(word.to_string()))
        })
    }

    /// Delete every entry, including stored records that failed to decode.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        let removed: Vec<String> = self
            .entries
            .keys()
            .chain(&self.unreadable)
            .cloned()
            .collect();
        let count = self.commit(&removed, |entries| {
            let count = entries.len();
            entries.clear();
            Ok(count)
        })?;
        self.unreadable.clear();
        tracing::info!(removed = count, "dictionary cleared");
        Ok(())
    }

    pub fn stats(&self, as_of: Timestamp) -> StoreStats {
        let end_of_day = end_of_local_day(as_of);
        let mut stats = StoreStats {
            total: self.entries.len() as u64,
            ..Default::default()
        };

        for entry in self.entries.values() {
            let srs = &entry.srs;
            if srs.next_review_at <= as_of {
                stats.due_now += 1;
            }
            if srs.next_review_at <= end_of_day {
                stats.due_today += 1;
            }
            match srs.review_count {
                0 => stats.new_words += 1,
                1 | 2 => stats.learning += 1,
                _ => {}
            }
            if srs.interval_days >= MATURE_INTERVAL_DAYS {
                stats.mature += 1;
            }
        }

        stats.reviewed_today = self
            .backend
            .reviews_since(start_of_local_day(as_of))
            .unwrap_or_else(|e| {
                tracing::warn!(error = %format!("{e:#}"), "failed to count today's reviews");
                0
            });

        stats
    }

    /// Bulk-import entries (e.g. from [`Self::export_entries`] output).
    ///
    /// New words are inserted as given, SRS state included. Words already in
    /// the store merge: meanings are appended without duplicates, a non-empty
    /// romanization replaces the stored one, usage counts are summed, and the
    /// existing schedule is kept. Entries without any non-empty meaning are
    /// skipped.
    pub fn import_entries(
        &mut self,
        entries: impl IntoIterator<Item = DictionaryEntry>,
    ) -> Result<ImportReport, StoreError> {
        let report = self.commit(&[], |current| {
            let mut report = ImportReport::default();

            for mut incoming in entries {
                incoming.meanings.retain(|m| !m.is_empty());
                if incoming.word.is_empty() || incoming.meanings.is_empty() {
                    tracing::warn!(word = %incoming.word, "skipping import entry without meanings");
                    continue;
                }

                match current.get_mut(&incoming.word) {
                    Some(existing) => {
                        for meaning in &incoming.meanings {
                            existing.add_meaning(meaning);
                        }
                        if !incoming.romanization.is_empty() {
                            existing.romanization = incoming.romanization;
                        }
                        existing.usage_count += incoming.usage_count;
                        report.merged += 1;
                    }
                    None => {
                        let mut deduped: Vec<String> = Vec::with_capacity(incoming.meanings.len());
                        for meaning in incoming.meanings.drain(..) {
                            if !deduped.contains(&meaning) {
                                deduped.push(meaning);
                            }
                        }
                        incoming.meanings = deduped;
                        incoming.usage_count = incoming.usage_count.max(1);
                        incoming.srs = incoming.srs.normalized();
                        current.insert(incoming.word.clone(), incoming);
                        report.imported += 1;
                    }
                }
            }
            Ok(report)
        })?;

        tracing::info!(imported = report.imported, merged = report.merged, "import complete");
        Ok(report)
    }

    /// Every entry, oldest first (ties by word).
    pub fn export_entries(&self) -> Vec<DictionaryEntry> {
        let mut entries: Vec<DictionaryEntry> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.added_at.cmp(&b.added_at).then_with(|| a.word.cmp(&b.word)));
        entries
    }

    /// Apply `change` to a copy of the working set, write the copy, and make
    /// it current only once the write succeeded. On any error the store is
    /// left exactly as it was.
    fn commit<T>(
        &mut self,
        removed: &[String],
        change: impl FnOnce(&mut Entries) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut next = self.entries.clone();
        let out = change(&mut next)?;
        self.persist(&next, removed)?;
        self.entries = next;
        Ok(out)
    }

    /// Write `entries` to the backend and delete the `removed` words.
    fn persist(&mut self, entries: &Entries, removed: &[String]) -> Result<()> {
        if self.load_failed {
            bail!("dictionary failed to load; refusing to overwrite stored records");
        }
        let mut records = entries
            .values()
            .map(record::encode_record)
            .collect::<Result<Vec<_>>>()?;
        records.sort_by(|a, b| a.word.cmp(&b.word));
        self.backend.save_all(&records, removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::record::RawRecord;

    const T0: Timestamp = 1_700_000_000_000;

    fn store_with_backend() -> (DictionaryStore, MemoryBackend) {
        let backend = MemoryBackend::new();
        let store = DictionaryStore::open(Box::new(backend.clone()), T0);
        (store, backend)
    }

    #[test]
    fn upsert_creates_due_entry() {
        let (mut store, backend) = store_with_backend();
        let entry = store.upsert("你好", "nǐ hǎo", "hello", T0).unwrap();

        assert_eq!(entry.usage_count, 1);
        assert_eq!(entry.meanings, vec!["hello"]);
        assert_eq!(entry.srs.next_review_at, T0);
        assert_eq!(entry.srs.review_count, 0);
        assert_eq!(entry.srs.ease_factor, 2.5);
        assert_eq!(backend.records().len(), 1);
    }

    #[test]
    fn upsert_existing_keeps_srs_and_updates_romanization() {
        let (mut store, _) = store_with_backend();
        store.upsert("行", "xíng", "to walk", T0).unwrap();
        let reviewed = SrsState {
            next_review_at: T0 + 1000,
            interval_days: 6.0,
            ease_factor: 2.36,
            review_count: 2,
            last_reviewed_at: T0,
        };
        store.apply_review_result("行", reviewed).unwrap();

        let entry = store.upsert("行", "háng", "row", T0 + 50).unwrap();
        assert_eq!(entry.usage_count, 2);
        assert_eq!(entry.romanization, "háng");
        assert_eq!(entry.meanings, vec!["to walk", "row"]);
        assert_eq!(entry.srs, reviewed);
        assert_eq!(entry.added_at, T0);
    }

    #[test]
    fn apply_review_result_clamps_out_of_range_schedule() {
        let (mut store, _) = store_with_backend();
        store.upsert("远", "yuǎn", "far", T0).unwrap();
        store
            .apply_review_result(
                "远",
                SrsState {
                    next_review_at: T0,
                    interval_days: 1e300,
                    ease_factor: 0.5,
                    review_count: 3,
                    last_reviewed_at: T0,
                },
            )
            .unwrap();
        let srs = store.lookup("远").unwrap().srs;
        assert_eq!(srs.interval_days, types::MAX_INTERVAL_DAYS);
        assert_eq!(srs.ease_factor, types::MIN_EASE_FACTOR);
    }

    #[test]
    fn upsert_new_word_requires_meaning() {
        let (mut store, _) = store_with_backend();
        let err = store.upsert("空", "kōng", "", T0).unwrap_err();
        assert!(matches!(err, StoreError::EmptyMeaning(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn empty_romanization_does_not_erase() {
        let (mut store, _) = store_with_backend();
        store.upsert("猫", "māo", "cat", T0).unwrap();
        let entry = store.upsert("猫", "", "cat", T0).unwrap();
        assert_eq!(entry.romanization, "māo");
    }

    #[test]
    fn apply_review_result_unknown_word_is_error() {
        let (mut store, _) = store_with_backend();
        let err = store
            .apply_review_result("不在", SrsState::new_due(T0))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownWord(w) if w == "不在"));
    }

    #[test]
    fn due_entries_sorted_with_word_tiebreak() {
        let (mut store, _) = store_with_backend();
        store.upsert("b", "", "bee", T0).unwrap();
        store.upsert("a", "", "ay", T0).unwrap();
        store.upsert("c", "", "sea", T0 - 10).unwrap();
        store.upsert("later", "", "later", T0 + 10).unwrap();

        let words: Vec<String> = store.due_entries(T0).into_iter().map(|e| e.word).collect();
        assert_eq!(words, vec!["c", "a", "b"]);
    }

    #[test]
    fn stats_counts_due_and_phases() {
        let (mut store, _) = store_with_backend();
        store.upsert("一", "yī", "one", T0).unwrap();
        store.upsert("二", "èr", "two", T0).unwrap();
        store
            .apply_review_result(
                "二",
                SrsState {
                    next_review_at: T0 + 30 * 86_400_000,
                    interval_days: 30.0,
                    ease_factor: 2.5,
                    review_count: 4,
                    last_reviewed_at: T0,
                },
            )
            .unwrap();

        let stats = store.stats(T0);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.due_now, 1);
        assert_eq!(stats.due_today, 1);
        assert_eq!(stats.new_words, 1);
        assert_eq!(stats.learning, 0);
        assert_eq!(stats.mature, 1);
    }

    #[test]
    fn record_encounters_rejects_unknown_without_partial_update() {
        let (mut store, _) = store_with_backend();
        store.upsert("好", "hǎo", "good", T0).unwrap();

        assert!(store.record_encounters(&["好", "坏"]).is_err());
        assert_eq!(store.lookup("好").unwrap().usage_count, 1);

        store.record_encounters(&["好", "好"]).unwrap();
        assert_eq!(store.lookup("好").unwrap().usage_count, 3);
    }

    #[test]
    fn open_skips_malformed_records() {
        let backend = MemoryBackend::with_records(vec![
            RawRecord {
                word: "bad".into(),
                json: "{not json".into(),
            },
            RawRecord {
                word: "猫".into(),
                json: r#"{"word":"猫","romanization":"māo","meanings":["cat"]}"#.into(),
            },
        ]);
        let store = DictionaryStore::open(Box::new(backend), T0);
        assert_eq!(store.len(), 1);
        assert!(store.contains("猫"));
    }

    #[test]
    fn malformed_records_survive_later_saves() {
        let bad = RawRecord {
            word: "bad".into(),
            json: "{not json".into(),
        };
        let backend = MemoryBackend::with_records(vec![bad.clone()]);
        let mut store = DictionaryStore::open(Box::new(backend.clone()), T0);
        assert!(store.is_empty());

        store.upsert("三", "sān", "three", T0).unwrap();
        assert!(backend.records().contains(&bad));

        let reopened = DictionaryStore::open(Box::new(backend.clone()), T0);
        assert_eq!(reopened.len(), 1);
        assert!(backend.records().contains(&bad));
    }

    /// Refuses every write while `fail` is set.
    struct RefusingBackend {
        inner: MemoryBackend,
        fail: std::sync::Arc<std::sync::atomic::AtomicBool>,
    }

    impl PersistenceBackend for RefusingBackend {
        fn load_all(&self) -> Result<Vec<RawRecord>> {
            self.inner.load_all()
        }

        fn save_all(&mut self, records: &[RawRecord], removed: &[String]) -> Result<()> {
            if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                bail!("disk full");
            }
            self.inner.save_all(records, removed)
        }
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let fail = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let backend = RefusingBackend {
            inner: MemoryBackend::new(),
            fail: fail.clone(),
        };
        let mut store = DictionaryStore::open(Box::new(backend), T0);
        store.upsert("一", "yī", "one", T0).unwrap();
        store.upsert("二", "èr", "two", T0).unwrap();
        let before = store.export_entries();

        fail.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(matches!(
            store.upsert("一", "", "unit", T0),
            Err(StoreError::Persistence(_))
        ));
        assert!(store.upsert("三", "sān", "three", T0).is_err());
        assert!(store.record_encounters(&["一"]).is_err());
        assert!(store
            .apply_review_result("一", SrsState::new_due(T0 + 99))
            .is_err());
        assert!(store.remove("二").is_err());
        assert!(store.clear().is_err());
        assert!(store
            .import_entries(vec![DictionaryEntry::new("四", "sì", "four", T0)])
            .is_err());
        assert_eq!(store.export_entries(), before);

        fail.store(false, std::sync::atomic::Ordering::SeqCst);
        assert_eq!(store.upsert("一", "", "unit", T0).unwrap().usage_count, 2);
    }

    struct UnreadableBackend;

    impl PersistenceBackend for UnreadableBackend {
        fn load_all(&self) -> Result<Vec<RawRecord>> {
            bail!("no such table: entries")
        }

        fn save_all(&mut self, _records: &[RawRecord], _removed: &[String]) -> Result<()> {
            panic!("a store that failed to load must not write");
        }
    }

    #[test]
    fn failed_load_refuses_writes() {
        let mut store = DictionaryStore::open(Box::new(UnreadableBackend), T0);
        assert!(store.is_empty());
        assert!(matches!(
            store.upsert("一", "yī", "one", T0),
            Err(StoreError::Persistence(_))
        ));
        assert!(store.clear().is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn remove_and_clear() {
        let (mut store, backend) = store_with_backend();
        store.upsert("一", "yī", "one", T0).unwrap();
        store.upsert("二", "èr", "two", T0).unwrap();

        let removed = store.remove("一").unwrap();
        assert_eq!(removed.word, "一");
        assert!(matches!(store.remove("一"), Err(StoreError::UnknownWord(_))));

        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(backend.records().is_empty());
    }
}
