//! Flashcard records and their spaced-repetition state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Easiness factor given to a newly generated card.
pub const DEFAULT_EFACTOR: f64 = 2.5;
/// Repetition count of a newly generated card.
pub const DEFAULT_REPETITIONS: i64 = 0;
/// Interval (days) of a newly generated card.
pub const DEFAULT_INTERVAL_DAYS: i64 = 1;

/// Scheduling state of a single card.
///
/// Integers are signed: persisted rows may hold out-of-range values, which
/// the scheduler rejects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardSchedule {
    pub efactor: f64,
    pub repetitions: i64,
    #[serde(alias = "interval")]
    pub interval_days: i64,
    pub next_review: DateTime<Utc>,
}

impl FlashcardSchedule {
    /// State for a card created at `now`: due immediately.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            efactor: DEFAULT_EFACTOR,
            repetitions: DEFAULT_REPETITIONS,
            interval_days: DEFAULT_INTERVAL_DAYS,
            next_review: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }
}

impl Default for FlashcardSchedule {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

/// A stored flashcard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: String,
    pub user_id: String,
    pub document_id: String,
    pub question: String,
    pub answer: String,
    #[serde(flatten)]
    pub schedule: FlashcardSchedule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Flashcard {
    /// Create a new card with default scheduling state.
    pub fn new(
        user_id: impl Into<String>,
        document_id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            document_id: document_id.into(),
            question: question.into(),
            answer: answer.into(),
            schedule: FlashcardSchedule::new(now),
            last_reviewed: None,
            created_at: now,
        }
    }
}
