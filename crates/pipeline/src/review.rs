//! Flashcard review: SM-2 update, persistence, and what to study next.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use neura_core::{Flashcard, FlashcardStore, Result, StoreError};
use neura_srs::{Sm2Scheduler, describe_interval, due_count, next_due};
use serde::Serialize;
use tracing::{info, warn};

/// The result of reviewing one card.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    /// The reviewed card with its new schedule.
    pub card: Flashcard,
    /// The earliest other due card in the same document.
    pub next_card: Option<Flashcard>,
    /// Cards due in the document after this review.
    pub due_count: usize,
    pub message: String,
}

pub struct ReviewService {
    scheduler: Sm2Scheduler,
    flashcards: Arc<dyn FlashcardStore>,
}

impl ReviewService {
    pub fn new(scheduler: Sm2Scheduler, flashcards: Arc<dyn FlashcardStore>) -> Self {
        Self {
            scheduler,
            flashcards,
        }
    }

    pub async fn review(&self, user_id: &str, card_id: &str, quality: i64) -> Result<ReviewOutcome> {
        self.review_at(user_id, card_id, quality, Utc::now()).await
    }

    /// Apply a review that happened at `now`.
    pub async fn review_at(
        &self,
        user_id: &str,
        card_id: &str,
        quality: i64,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome> {
        let card = self
            .flashcards
            .get_flashcard(user_id, card_id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                kind: "Flashcard",
                id: card_id.to_string(),
            })?;

        let schedule = self.scheduler.review_at(quality, &card.schedule, now)?;
        let card = self
            .flashcards
            .update_schedule(user_id, card_id, &schedule, now)
            .await?;

        let (next_card, due) = match self
            .flashcards
            .list_flashcards(user_id, &card.document_id)
            .await
        {
            Ok(cards) => (
                next_due(&cards, now, Some(card_id)).cloned(),
                due_count(&cards, now),
            ),
            Err(e) => {
                warn!(card_id, error = %e, "Failed to load next due card");
                (None, 0)
            }
        };

        let message = if next_card.is_some() {
            format!(
                "Review again in {}",
                describe_interval(card.schedule.interval_days)?
            )
        } else {
            "No more flashcards due".to_string()
        };

        info!(
            card_id,
            quality,
            interval_days = card.schedule.interval_days,
            due_count = due,
            "Flashcard reviewed"
        );

        Ok(ReviewOutcome {
            card,
            next_card,
            due_count: due,
            message,
        })
    }

    /// Up to `limit` due cards in a document, earliest first.
    pub async fn due(
        &self,
        user_id: &str,
        document_id: &str,
        limit: usize,
    ) -> Result<Vec<Flashcard>> {
        let cards = self.flashcards.list_flashcards(user_id, document_id).await?;
        Ok(neura_srs::due_cards(&cards, Utc::now(), limit)
            .into_iter()
            .cloned()
            .collect())
    }
}
