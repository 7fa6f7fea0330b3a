//! Persisted record format and the load-time upgrade path.
//!
//! Records are written as the flat JSON form of [`DictionaryEntry`] plus a
//! `version` field. Version-1 records predate review scheduling: they have no
//! SRS fields, may carry a single `meaning` string instead of `meanings`, and
//! have no `version` key at all. [`upgrade_record`] turns any known version
//! into a current entry and reports whether anything had to be filled in.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::types::{DictionaryEntry, SrsState, Timestamp, DEFAULT_EASE_FACTOR};

/// Version written by this build.
pub const RECORD_VERSION: u32 = 2;

/// Serialized record as handed to and from a persistence backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub word: String,
    pub json: String,
}

#[derive(Serialize)]
struct CurrentRecord<'a> {
    version: u32,
    #[serde(flatten)]
    entry: &'a DictionaryEntry,
}

/// Any-version record. Every field a past version may omit is optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    #[serde(default)]
    version: Option<u32>,
    word: String,
    #[serde(default, alias = "pinyin")]
    romanization: String,
    #[serde(default)]
    meanings: Vec<String>,
    #[serde(default)]
    meaning: Option<String>,
    #[serde(default)]
    added_at: Option<Timestamp>,
    #[serde(default)]
    usage_count: Option<u64>,
    #[serde(default)]
    next_review_at: Option<Timestamp>,
    #[serde(default, alias = "interval")]
    interval_days: Option<f64>,
    #[serde(default)]
    ease_factor: Option<f64>,
    #[serde(default)]
    review_count: Option<u32>,
    #[serde(default)]
    last_reviewed_at: Option<Timestamp>,
}

/// Serialize an entry in the current record format.
pub fn encode_record(entry: &DictionaryEntry) -> Result<RawRecord> {
    let json = serde_json::to_string(&CurrentRecord {
        version: RECORD_VERSION,
        entry,
    })
    .with_context(|| format!("failed to encode record for {}", entry.word))?;
    Ok(RawRecord {
        word: entry.word.clone(),
        json,
    })
}

/// Parse a record of any known version into a current entry.
///
/// Missing SRS fields are backfilled with new-entry defaults anchored at
/// `now`. The returned flag is `true` when the record was not already in the
/// current format and should be written back.
pub fn upgrade_record(json: &str, now: Timestamp) -> Result<(DictionaryEntry, bool)> {
    let stored: StoredRecord = serde_json::from_str(json).context("malformed record")?;

    if stored.word.is_empty() {
        bail!("record has an empty word");
    }

    let mut upgraded = stored.version != Some(RECORD_VERSION);

    let mut meanings: Vec<String> = Vec::with_capacity(stored.meanings.len() + 1);
    for meaning in stored.meanings.into_iter().chain(stored.meaning) {
        if !meaning.is_empty() && !meanings.contains(&meaning) {
            meanings.push(meaning);
        }
    }
    if meanings.is_empty() {
        bail!("record for {} has no meanings", stored.word);
    }

    let defaults = SrsState::new_due(now);
    let srs_complete = stored.next_review_at.is_some()
        && stored.interval_days.is_some()
        && stored.ease_factor.is_some()
        && stored.review_count.is_some();
    if !srs_complete {
        upgraded = true;
    }

    let srs = if srs_complete {
        let stored_srs = SrsState {
            next_review_at: stored.next_review_at.unwrap_or(defaults.next_review_at),
            interval_days: stored.interval_days.unwrap_or(defaults.interval_days),
            ease_factor: stored.ease_factor.unwrap_or(DEFAULT_EASE_FACTOR),
            review_count: stored.review_count.unwrap_or(defaults.review_count),
            last_reviewed_at: stored.last_reviewed_at.unwrap_or(0),
        };
        let srs = SrsState {
            next_review_at: stored_srs.next_review_at.max(0),
            last_reviewed_at: stored_srs.last_reviewed_at.max(0),
            ..stored_srs.normalized()
        };
        if srs != stored_srs {
            upgraded = true;
        }
        srs
    } else {
        // Partial SRS state is not trusted: reset the whole schedule.
        defaults
    };

    let entry = DictionaryEntry {
        word: stored.word,
        romanization: stored.romanization,
        meanings,
        added_at: stored.added_at.unwrap_or(now),
        usage_count: stored.usage_count.unwrap_or(1).max(1),
        srs,
    };

    Ok((entry, upgraded))
}
