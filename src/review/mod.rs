//! Spaced-repetition review: the scheduler and the session controller.

pub mod scheduler;
pub mod session;

pub use scheduler::{format_interval, preview_intervals, schedule, Quality};
pub use session::{Card, ReviewSession, SessionOrder, SessionProgress, SessionState};
