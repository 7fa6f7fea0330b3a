//! Dictionary entry types.
//!
//! A [`DictionaryEntry`] is one learned word: its romanization, an ordered set
//! of meanings, usage bookkeeping, and an embedded [`SrsState`] that the review
//! scheduler advances.

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

pub const MS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Starting ease factor for every new entry.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Ease factor floor, enforced on every scheduling branch.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Longest interval the scheduler will produce: one hundred years.
pub const MAX_INTERVAL_DAYS: f64 = 36_500.0;

/// Clamp an interval into `0..=MAX_INTERVAL_DAYS`. NaN becomes 0.
pub fn clamp_interval_days(days: f64) -> f64 {
    if days.is_nan() {
        0.0
    } else {
        days.clamp(0.0, MAX_INTERVAL_DAYS)
    }
}

/// `now` plus `interval_days`, saturating at the ends of the timestamp range.
pub fn due_after(now: Timestamp, interval_days: f64) -> Timestamp {
    let offset = (clamp_interval_days(interval_days) * MS_PER_DAY).round() as Timestamp;
    now.saturating_add(offset)
}

/// Spaced-repetition scheduling state for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SrsState {
    /// Entry is due when this is `<=` the current time.
    pub next_review_at: Timestamp,
    /// Days until the next scheduled review (fractional for sub-day steps).
    pub interval_days: f64,
    pub ease_factor: f64,
    /// 0 = never reviewed (or reset by a failed recall).
    pub review_count: u32,
    /// 0 if never reviewed.
    pub last_reviewed_at: Timestamp,
}

impl SrsState {
    /// State of a freshly created entry: due immediately.
    pub fn new_due(now: Timestamp) -> Self {
        Self {
            next_review_at: now,
            interval_days: 0.0,
            ease_factor: DEFAULT_EASE_FACTOR,
            review_count: 0,
            last_reviewed_at: 0,
        }
    }

    pub fn is_due(&self, as_of: Timestamp) -> bool {
        self.next_review_at <= as_of
    }

    /// The same state with ease and interval pulled into their valid ranges.
    /// Non-finite ease falls back to the default.
    pub fn normalized(self) -> Self {
        let ease_factor = if self.ease_factor.is_finite() {
            self.ease_factor.max(MIN_EASE_FACTOR)
        } else {
            DEFAULT_EASE_FACTOR
        };
        Self {
            interval_days: clamp_interval_days(self.interval_days),
            ease_factor,
            ..self
        }
    }
}

/// A learned word, keyed by its exact text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    pub word: String,
    pub romanization: String,
    /// Distinct glosses in first-seen order. Never empty.
    pub meanings: Vec<String>,
    pub added_at: Timestamp,
    pub usage_count: u64,
    #[serde(flatten)]
    pub srs: SrsState,
}

impl DictionaryEntry {
    pub fn new(word: &str, romanization: &str, meaning: &str, now: Timestamp) -> Self {
        Self {
            word: word.to_string(),
            romanization: romanization.to_string(),
            meanings: vec![meaning.to_string()],
            added_at: now,
            usage_count: 1,
            srs: SrsState::new_due(now),
        }
    }

    /// The gloss shown when only one fits.
    pub fn primary_meaning(&self) -> &str {
        self.meanings.first().map(String::as_str).unwrap_or_default()
    }

    /// Append `meaning` unless an identical string is already present.
    /// Returns `true` if it was appended.
    pub fn add_meaning(&mut self, meaning: &str) -> bool {
        if self.meanings.iter().any(|m| m == meaning) {
            return false;
        }
        self.meanings.push(meaning.to_string());
        true
    }
}

/// Counts reported by [`super::DictionaryStore::stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total: u64,
    pub due_now: u64,
    /// Due before the end of the local calendar day (includes `due_now`).
    pub due_today: u64,
    /// Never reviewed.
    pub new_words: u64,
    /// One or two successful reviews.
    pub learning: u64,
    /// Interval of at least [`MATURE_INTERVAL_DAYS`].
    pub mature: u64,
    pub reviewed_today: u64,
}

pub const MATURE_INTERVAL_DAYS: f64 = 21.0;

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Words that were not in the store before.
    pub imported: u64,
    /// Words merged into an existing entry.
    pub merged: u64,
}

/// Current wall-clock time as a [`Timestamp`].
pub fn now_millis() -> Timestamp {
    Utc::now().timestamp_millis()
}

/// Last millisecond of the local calendar day containing `as_of`.
pub fn end_of_local_day(as_of: Timestamp) -> Timestamp {
    local_day_boundary(as_of, false).unwrap_or(as_of)
}

/// First millisecond of the local calendar day containing `as_of`.
pub fn start_of_local_day(as_of: Timestamp) -> Timestamp {
    local_day_boundary(as_of, true).unwrap_or(as_of)
}

fn local_day_boundary(as_of: Timestamp, start: bool) -> Option<Timestamp> {
    let local = DateTime::from_timestamp_millis(as_of)?.with_timezone(&Local);
    let time = if start {
        NaiveTime::from_hms_opt(0, 0, 0)?
    } else {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?
    };
    let mapped = Local.from_local_datetime(&local.date_naive().and_time(time));
    // DST overlap: take the widest reading of the day
    let resolved = if start { mapped.earliest() } else { mapped.latest() }?;
    Some(resolved.timestamp_millis())
}
