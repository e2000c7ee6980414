//! The SM-2 update rule.

use chrono::{DateTime, TimeDelta, Utc};
use neura_core::{FlashcardSchedule, ScheduleError};
use tracing::debug;

/// Floor for the easiness factor.
pub const MIN_EFACTOR: f64 = 1.3;
pub const MIN_QUALITY: i64 = 0;
pub const MAX_QUALITY: i64 = 5;
/// Lowest quality that counts as a successful recall.
pub const PASSING_QUALITY: i64 = 3;
/// Default interval cap, roughly ten years.
pub const MAX_INTERVAL_DAYS: i64 = 3650;

/// Computes the next schedule of a card from a review rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sm2Scheduler {
    max_interval_days: i64,
}

impl Default for Sm2Scheduler {
    fn default() -> Self {
        Self::new(MAX_INTERVAL_DAYS)
    }
}

impl Sm2Scheduler {
    /// A scheduler capping intervals at `max_interval_days` (at least 1).
    pub fn new(max_interval_days: i64) -> Self {
        Self {
            max_interval_days: max_interval_days.max(1),
        }
    }

    pub fn max_interval_days(&self) -> i64 {
        self.max_interval_days
    }

    /// Apply a review rated `quality` at the current time.
    pub fn review(
        &self,
        quality: i64,
        schedule: &FlashcardSchedule,
    ) -> Result<FlashcardSchedule, ScheduleError> {
        self.review_at(quality, schedule, Utc::now())
    }

    /// Apply a review rated `quality` that happened at `now`.
    ///
    /// An efactor below the floor is clamped up before the update rather
    /// than rejected.
    pub fn review_at(
        &self,
        quality: i64,
        schedule: &FlashcardSchedule,
        now: DateTime<Utc>,
    ) -> Result<FlashcardSchedule, ScheduleError> {
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(ScheduleError::InvalidQuality(quality));
        }
        let efactor = schedule.efactor.max(MIN_EFACTOR);
        if schedule.repetitions < 0 {
            return Err(ScheduleError::InvalidRepetitions(schedule.repetitions));
        }
        if schedule.interval_days < 1 {
            return Err(ScheduleError::InvalidInterval(schedule.interval_days));
        }

        let q_delta = (5 - quality) as f64;
        let new_efactor = (efactor + (0.1 - q_delta * (0.08 + q_delta * 0.02))).max(MIN_EFACTOR);

        let (new_repetitions, new_interval) = if quality < PASSING_QUALITY {
            (0, 1)
        } else {
            let repetitions = schedule.repetitions.saturating_add(1);
            let interval = match repetitions {
                1 => 1,
                2 => 6,
                _ => (schedule.interval_days as f64 * new_efactor).round_ties_even() as i64,
            };
            (repetitions, interval.max(1))
        };
        let new_interval = new_interval.min(self.max_interval_days);

        let next_review = TimeDelta::try_days(new_interval)
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        debug!(
            quality,
            efactor_before = efactor,
            efactor_after = new_efactor,
            repetitions_before = schedule.repetitions,
            repetitions_after = new_repetitions,
            interval_before = schedule.interval_days,
            interval_after = new_interval,
            next_review = %next_review.to_rfc3339(),
            "SM-2 review applied"
        );

        Ok(FlashcardSchedule {
            efactor: new_efactor,
            repetitions: new_repetitions,
            interval_days: new_interval,
            next_review,
        })
    }
}

/// Apply a review with the default interval cap at the current time.
pub fn review(
    quality: i64,
    schedule: &FlashcardSchedule,
) -> Result<FlashcardSchedule, ScheduleError> {
    Sm2Scheduler::default().review(quality, schedule)
}
