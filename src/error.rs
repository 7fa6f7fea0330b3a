//! Typed errors for contract violations.
//!
//! Plumbing failures travel as `anyhow::Error`; these enums name the cases a
//! caller is expected to match on.

use thiserror::Error;

/// Errors from [`crate::dictionary::DictionaryStore`] mutations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The operation targets a word the store does not hold.
    #[error("unknown word: {0}")]
    UnknownWord(String),

    /// A meaning must be non-empty text.
    #[error("empty meaning for word: {0}")]
    EmptyMeaning(String),

    /// The persistence backend failed or refused the write; the in-memory
    /// state is unchanged.
    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

/// Errors from [`crate::review::ReviewSession`] transitions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// `grade` was called before the current card was revealed.
    #[error("card must be revealed before grading")]
    NotRevealed,

    /// The session has no card to act on (empty or complete).
    #[error("no card is being presented")]
    NoCard,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A grade outside the {1, 3, 4, 5} scale.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid review quality {0}: expected 1 (again), 3 (hard), 4 (good) or 5 (easy)")]
pub struct QualityError(pub u8);
