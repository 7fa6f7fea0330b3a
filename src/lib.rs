//! Adaptive vocabulary engine: a self-teaching dictionary, SM-2 style review
//! scheduling, and longest-match segmentation with AI fallback.
//!
//! Glossa closes a learning loop. Text the learner reads is segmented against
//! the local dictionary first; any unit containing an unknown word is handed
//! to an AI collaborator, and every word it returns is written back into the
//! dictionary. Each entry carries its own review schedule, so words met while
//! reading become flashcards automatically.
//!
//! | Grade | Value | New card | Learning step | Later |
//! |-------|-------|----------|---------------|-------|
//! | **Again** | 1 | 10 min | 10 min | 10 min, count reset |
//! | **Hard** | 3 | 0.5 d | 1 d | max(1, interval × 1.2) |
//! | **Good** | 4 | 1 d | 6 d | round(interval × ease) |
//! | **Easy** | 5 | 4 d | 10 d | round(interval × ease × 1.3) |
//!
//! # Architecture
//!
//! - **Storage**: SQLite (one JSON record per word) behind a
//!   [`dictionary::PersistenceBackend`] seam, with an in-memory backend for tests
//! - **Segmentation**: greedy longest match, window of
//!   [`segment::MAX_WORD_CHARS`] characters, all-or-nothing per unit
//! - **AI**: any OpenAI-compatible chat completions endpoint
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`dictionary`]: The dictionary store and its persisted record format
//! - [`review`]: Review scheduling and the review session state machine
//! - [`segment`]: Unit splitting, dictionary matching, and the AI collaborator

pub mod config;
pub mod db;
pub mod dictionary;
pub mod error;
pub mod review;
pub mod segment;
