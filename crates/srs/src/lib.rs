//! # Neura SRS
//!
//! SuperMemo-2 scheduling for flashcards.
//!
//! Quality ratings (0-5):
//!
//! | Quality | Meaning |
//! |---------|---------|
//! | 0 | Complete blackout |
//! | 1 | Incorrect; the answer seemed familiar |
//! | 2 | Incorrect; the answer seemed easy once seen |
//! | 3 | Correct, but difficult |
//! | 4 | Correct after some hesitation |
//! | 5 | Perfect recall |
//!
//! A passing grade (3+) grows the interval along 1 → 6 → previous × efactor;
//! a failing grade resets the card to a 1-day interval.

pub mod due;
pub mod interval;
pub mod sm2;

pub use due::{due_cards, due_count, is_due, next_due};
pub use interval::describe_interval;
pub use sm2::{
    MAX_INTERVAL_DAYS, MAX_QUALITY, MIN_EFACTOR, MIN_QUALITY, PASSING_QUALITY, Sm2Scheduler,
    review,
};
