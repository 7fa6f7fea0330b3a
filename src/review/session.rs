//! Review session state machine.
//!
//! A session snapshots the due list once at start, then walks it card by card:
//! reveal, grade, advance. When the snapshot runs out the due list is fetched
//! again so cards that became due mid-session are picked up.

use serde::Serialize;

use super::scheduler::{schedule, Quality};
use crate::dictionary::{DictionaryEntry, DictionaryStore, SrsState, Timestamp};
use crate::error::SessionError;

/// Where the session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Presenting { index: usize, revealed: bool },
    /// Nothing was due when the session started (or was reloaded).
    Empty,
    /// Every fetched card has been graded and nothing else is due.
    Complete,
}

/// How a fetched batch is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrder {
    /// Oldest-due first, ties by word.
    DueFirst,
    /// Shuffled within each fetched batch. The batch itself is still the
    /// oldest-due slice, so large backlogs stay fair.
    ShuffledBatch { seed: u64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub reviewed: u64,
    /// Cards left in the current batch, including the one on screen.
    pub remaining: u64,
    pub again_count: u64,
    pub correct_count: u64,
}

/// The card on screen.
#[derive(Debug, Clone, Copy)]
pub struct Card<'a> {
    pub entry: &'a DictionaryEntry,
    pub revealed: bool,
}

pub struct ReviewSession {
    cards: Vec<DictionaryEntry>,
    state: SessionState,
    order: SessionOrder,
    batch_size: usize,
    progress: SessionProgress,
    rng: XorShift64,
}

impl ReviewSession {
    /// Start a session over whatever is due at `now`.
    /// `batch_size` of 0 means no limit per fetch.
    pub fn start(
        store: &DictionaryStore,
        now: Timestamp,
        order: SessionOrder,
        batch_size: usize,
    ) -> Self {
        let seed = match order {
            SessionOrder::ShuffledBatch { seed } => seed,
            SessionOrder::DueFirst => 0,
        };
        let mut session = Self {
            cards: Vec::new(),
            state: SessionState::Empty,
            order,
            batch_size,
            progress: SessionProgress::default(),
            rng: XorShift64::new(seed),
        };
        session.reload(store, now);
        session
    }

    /// Re-fetch the due list and restart at its first card.
    pub fn reload(&mut self, store: &DictionaryStore, now: Timestamp) {
        self.fetch(store, now);
        self.state = if self.cards.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Presenting {
                index: 0,
                revealed: false,
            }
        };
        self.refresh_remaining();
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn progress(&self) -> SessionProgress {
        self.progress
    }

    pub fn current(&self) -> Option<Card<'_>> {
        match self.state {
            SessionState::Presenting { index, revealed } => self
                .cards
                .get(index)
                .map(|entry| Card { entry, revealed }),
            _ => None,
        }
    }

    /// Show the answer side of the current card. No-op in any other state.
    pub fn reveal(&mut self) {
        if let SessionState::Presenting {
            index,
            revealed: false,
        } = self.state
        {
            self.state = SessionState::Presenting {
                index,
                revealed: true,
            };
        }
    }

    /// Grade the revealed card, persist its new schedule, and advance.
    pub fn grade(
        &mut self,
        store: &mut DictionaryStore,
        quality: Quality,
        now: Timestamp,
    ) -> Result<SrsState, SessionError> {
        let index = match self.state {
            SessionState::Presenting {
                index,
                revealed: true,
            } => index,
            SessionState::Presenting { revealed: false, .. } => {
                return Err(SessionError::NotRevealed)
            }
            SessionState::Empty | SessionState::Complete => return Err(SessionError::NoCard),
        };
        let word = self
            .cards
            .get(index)
            .map(|c| c.word.clone())
            .ok_or(SessionError::NoCard)?;

        // Schedule from the stored state; the snapshot may be stale.
        let current = store
            .lookup(&word)
            .map(|e| e.srs)
            .ok_or_else(|| crate::error::StoreError::UnknownWord(word.clone()))?;
        let next = schedule(&current, quality, now);
        store.apply_review_result(&word, next)?;
        store.record_review(&word, quality, &next);

        tracing::debug!(
            word = %word,
            quality = quality.value(),
            interval_days = next.interval_days,
            ease_factor = next.ease_factor,
            "card graded"
        );

        self.progress.reviewed += 1;
        if quality == Quality::Again {
            self.progress.again_count += 1;
        } else {
            self.progress.correct_count += 1;
        }

        if index + 1 < self.cards.len() {
            self.state = SessionState::Presenting {
                index: index + 1,
                revealed: false,
            };
        } else {
            self.fetch(store, now);
            self.state = if self.cards.is_empty() {
                SessionState::Complete
            } else {
                SessionState::Presenting {
                    index: 0,
                    revealed: false,
                }
            };
        }
        self.refresh_remaining();

        Ok(next)
    }

    fn fetch(&mut self, store: &DictionaryStore, now: Timestamp) {
        let mut due = store.due_entries(now);
        if self.batch_size > 0 {
            due.truncate(self.batch_size);
        }
        if let SessionOrder::ShuffledBatch { .. } = self.order {
            self.rng.shuffle(&mut due);
        }
        tracing::debug!(cards = due.len(), "review batch fetched");
        self.cards = due;
    }

    fn refresh_remaining(&mut self) {
        self.progress.remaining = match self.state {
            SessionState::Presenting { index, .. } => (self.cards.len() - index) as u64,
            _ => 0,
        };
    }
}

/// Small deterministic PRNG for batch shuffling.
#[derive(Debug, Clone)]
struct XorShift64(u64);

impl XorShift64 {
    fn new(seed: u64) -> Self {
        // xorshift has an all-zero fixed point
        Self(if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed })
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Fisher–Yates.
    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = (self.next_u64() % (i as u64 + 1)) as usize;
            items.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: Timestamp = 1_700_000_000_000;

    fn store_with(words: &[&str]) -> DictionaryStore {
        let mut store = DictionaryStore::in_memory();
        for (i, w) in words.iter().enumerate() {
            store.upsert(w, "", "meaning", T0 + i as i64).unwrap();
        }
        store
    }

    #[test]
    fn empty_store_starts_empty() {
        let store = DictionaryStore::in_memory();
        let mut session = ReviewSession::start(&store, T0, SessionOrder::DueFirst, 0);
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.current().is_none());
        session.reveal();
        assert_eq!(session.state(), SessionState::Empty);
    }

    #[test]
    fn grade_requires_reveal() {
        let mut store = store_with(&["一"]);
        let mut session = ReviewSession::start(&store, T0 + 10, SessionOrder::DueFirst, 0);

        let err = session.grade(&mut store, Quality::Good, T0 + 10).unwrap_err();
        assert!(matches!(err, SessionError::NotRevealed));
        assert_eq!(
            session.state(),
            SessionState::Presenting {
                index: 0,
                revealed: false
            }
        );
    }

    #[test]
    fn walks_cards_in_due_order_then_completes() {
        let mut store = store_with(&["一", "二", "三"]);
        let now = T0 + 10;
        let mut session = ReviewSession::start(&store, now, SessionOrder::DueFirst, 0);
        assert_eq!(session.progress().remaining, 3);

        let mut seen = Vec::new();
        while let Some(card) = session.current() {
            seen.push(card.entry.word.clone());
            session.reveal();
            session.grade(&mut store, Quality::Good, now).unwrap();
        }

        assert_eq!(seen, vec!["一", "二", "三"]);
        assert_eq!(session.state(), SessionState::Complete);
        assert_eq!(session.progress().reviewed, 3);
        assert_eq!(session.progress().correct_count, 3);
        assert_eq!(session.progress().remaining, 0);
        assert!(store.due_entries(now).is_empty());
    }

    #[test]
    fn grading_complete_session_is_an_error() {
        let mut store = store_with(&["一"]);
        let mut session = ReviewSession::start(&store, T0, SessionOrder::DueFirst, 0);
        session.reveal();
        session.grade(&mut store, Quality::Easy, T0).unwrap();

        assert_eq!(session.state(), SessionState::Complete);
        assert!(matches!(
            session.grade(&mut store, Quality::Easy, T0),
            Err(SessionError::NoCard)
        ));
    }

    #[test]
    fn end_of_batch_refetches_newly_due_cards() {
        let mut store = store_with(&["一", "二"]);
        let mut session = ReviewSession::start(&store, T0, SessionOrder::DueFirst, 1);
        assert_eq!(session.current().unwrap().entry.word, "一");

        session.reveal();
        session.grade(&mut store, Quality::Good, T0 + 5).unwrap();

        // batch of one exhausted; "二" became due at T0 + 1
        let card = session.current().unwrap();
        assert_eq!(card.entry.word, "二");
        assert!(!card.revealed);
        assert_eq!(session.progress().reviewed, 1);
    }

    #[test]
    fn again_counts_and_is_not_immediately_due() {
        let mut store = store_with(&["一"]);
        let mut session = ReviewSession::start(&store, T0, SessionOrder::DueFirst, 0);
        session.reveal();
        let next = session.grade(&mut store, Quality::Again, T0).unwrap();

        assert_eq!(next.review_count, 0);
        assert_eq!(session.progress().again_count, 1);
        assert_eq!(session.state(), SessionState::Complete);

        session.reload(&store, T0 + 11 * 60 * 1000);
        assert_eq!(session.current().unwrap().entry.word, "一");
    }

    #[test]
    fn shuffled_batch_is_deterministic_per_seed() {
        let words = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let store = store_with(&words);
        let now = T0 + 100;

        let order_of = |seed| {
            let session =
                ReviewSession::start(&store, now, SessionOrder::ShuffledBatch { seed }, 0);
            session.cards.iter().map(|c| c.word.clone()).collect::<Vec<_>>()
        };

        let first = order_of(42);
        assert_eq!(first, order_of(42));
        let mut sorted = first.clone();
        sorted.sort();
        assert_eq!(sorted, words.iter().map(|w| w.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn shuffle_stays_within_oldest_batch() {
        let store = store_with(&["a", "b", "c", "d", "e", "f"]);
        let session =
            ReviewSession::start(&store, T0 + 100, SessionOrder::ShuffledBatch { seed: 7 }, 3);
        let mut batch: Vec<String> = session.cards.iter().map(|c| c.word.clone()).collect();
        batch.sort();
        assert_eq!(batch, vec!["a", "b", "c"]);
    }
}
