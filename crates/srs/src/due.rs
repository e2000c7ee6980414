//! Due-card selection.
//!
//! A card is due once its `next_review` is at or before the reference time.
//! Due cards are served earliest first.

use chrono::{DateTime, Utc};
use neura_core::Flashcard;

pub fn is_due(card: &Flashcard, now: DateTime<Utc>) -> bool {
    card.schedule.is_due(now)
}

/// Up to `limit` due cards, earliest `next_review` first.
pub fn due_cards(cards: &[Flashcard], now: DateTime<Utc>, limit: usize) -> Vec<&Flashcard> {
    let mut due: Vec<&Flashcard> = cards.iter().filter(|c| is_due(c, now)).collect();
    due.sort_by_key(|c| c.schedule.next_review);
    due.truncate(limit);
    due
}

/// The earliest due card, skipping `exclude_id`.
pub fn next_due<'a>(
    cards: &'a [Flashcard],
    now: DateTime<Utc>,
    exclude_id: Option<&str>,
) -> Option<&'a Flashcard> {
    cards
        .iter()
        .filter(|c| Some(c.id.as_str()) != exclude_id)
        .filter(|c| is_due(c, now))
        .min_by_key(|c| c.schedule.next_review)
}

pub fn due_count(cards: &[Flashcard], now: DateTime<Utc>) -> usize {
    cards.iter().filter(|c| is_due(c, now)).count()
}
