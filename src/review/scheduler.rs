//! SM-2 derived review scheduling.
//!
//! [`schedule`] is a pure function of the previous [`SrsState`], a [`Quality`]
//! grade and the current time. Persisting the result is the caller's job.

use serde::Serialize;

use crate::dictionary::types::{clamp_interval_days, due_after, SrsState, Timestamp, MIN_EASE_FACTOR};
use crate::error::QualityError;

/// Interval after a failed recall: ten minutes, in days.
pub const AGAIN_INTERVAL_DAYS: f64 = 10.0 / (24.0 * 60.0);

/// Ease growth on the EASY branch never goes past this.
pub const EASY_EASE_CEILING: f64 = 2.5;

/// Recall grade. The scale skips 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Quality {
    Again = 1,
    Hard = 3,
    Good = 4,
    Easy = 5,
}

impl Quality {
    pub const ALL: [Quality; 4] = [Quality::Again, Quality::Hard, Quality::Good, Quality::Easy];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Again => "again",
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Easy => "easy",
        }
    }
}

impl TryFrom<u8> for Quality {
    type Error = QualityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Again),
            3 => Ok(Self::Hard),
            4 => Ok(Self::Good),
            5 => Ok(Self::Easy),
            other => Err(QualityError(other)),
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Compute the next scheduling state after a review graded `quality` at `now`.
///
/// Branch selection looks at `review_count` before this review: 0 is a new
/// card, 1 is a card in its first learning step. Intervals never exceed
/// [`MAX_INTERVAL_DAYS`](crate::dictionary::types::MAX_INTERVAL_DAYS) and
/// the due time saturates instead of overflowing.
pub fn schedule(state: &SrsState, quality: Quality, now: Timestamp) -> SrsState {
    let state = &state.normalized();
    let was_new = state.review_count == 0;
    let was_learning = state.review_count == 1;
    let mut next = *state;

    match quality {
        Quality::Again => {
            // Hard reset of the step count; ease is left alone.
            next.interval_days = AGAIN_INTERVAL_DAYS;
            next.review_count = 0;
        }
        Quality::Hard => {
            if was_new {
                next.interval_days = 0.5;
                next.review_count = 1;
            } else if was_learning {
                next.interval_days = 1.0;
                next.review_count = 2;
            } else {
                next.interval_days = (state.interval_days * 1.2).max(1.0);
                next.review_count = state.review_count + 1;
            }
            next.ease_factor = (state.ease_factor - 0.15).max(MIN_EASE_FACTOR);
        }
        Quality::Good => {
            next.review_count = state.review_count + 1;
            next.interval_days = match next.review_count {
                1 => 1.0,
                2 => 6.0,
                _ => (state.interval_days * state.ease_factor).round(),
            };
            next.ease_factor = (state.ease_factor + good_ease_delta()).max(MIN_EASE_FACTOR);
        }
        Quality::Easy => {
            next.review_count = state.review_count + 1;
            next.interval_days = match next.review_count {
                1 => 4.0,
                2 => 10.0,
                _ => (state.interval_days * state.ease_factor * 1.3).round(),
            };
            // Only this branch caps ease growth.
            next.ease_factor = (state.ease_factor + 0.15).min(EASY_EASE_CEILING);
        }
    }

    next.ease_factor = next.ease_factor.max(MIN_EASE_FACTOR);
    next.interval_days = clamp_interval_days(next.interval_days);
    next.last_reviewed_at = now;
    next.next_review_at = due_after(now, next.interval_days);
    next
}

/// Ease change for a GOOD grade: a flat +0.02.
fn good_ease_delta() -> f64 {
    0.02
}

/// The interval each grade would produce from `state`, for button labels.
pub fn preview_intervals(state: &SrsState) -> [(Quality, f64); 4] {
    Quality::ALL.map(|q| (q, schedule(state, q, 0).interval_days))
}

/// Short human rendering of an interval: `10m`, `12h`, `6d`, `3mo`, `1.2y`.
pub fn format_interval(days: f64) -> String {
    let minutes = days * 24.0 * 60.0;
    if minutes < 60.0 {
        format!("{}m", minutes.round().max(1.0) as u64)
    } else if days < 1.0 {
        format!("{}h", (days * 24.0).round() as u64)
    } else if days < 30.0 {
        format!("{}d", days.round() as u64)
    } else if days < 365.0 {
        format!("{}mo", (days / 30.0).round() as u64)
    } else {
        format!("{:.1}y", days / 365.0)
    }
}
