//! `neura cards` — Flashcards in the local store.

use std::path::Path;

use clap::Subcommand;
use neura_core::{Flashcard, FlashcardStore};
use neura_pipeline::{DEFAULT_FLASHCARD_COUNT, FlashcardService, ReviewService};
use neura_srs::Sm2Scheduler;

use super::runtime;

#[derive(Subcommand)]
pub enum CardsAction {
    /// Add a card to a document
    Add {
        document_id: String,

        #[arg(short, long)]
        question: String,

        #[arg(short, long)]
        answer: String,
    },

    /// Generate cards from an ingested document's text
    Generate {
        document_id: String,

        /// Number of cards to ask for (1-50)
        #[arg(short, long, default_value_t = DEFAULT_FLASHCARD_COUNT)]
        count: usize,
    },

    /// List due cards of a document, earliest first
    Due {
        document_id: String,

        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Record a review of a card
    Review {
        card_id: String,

        /// Recall quality, 0-5
        #[arg(short, long, allow_negative_numbers = true)]
        quality: i64,
    },
}

pub async fn run(
    config_path: Option<&Path>,
    action: CardsAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = runtime::load_config(config_path)?;
    let store = runtime::store(&config);
    let user_id = config.user_id.as_str();

    match action {
        CardsAction::Add {
            document_id,
            question,
            answer,
        } => {
            let card = Flashcard::new(user_id, document_id, question, answer);
            let id = card.id.clone();
            store.insert_flashcards(vec![card]).await?;
            println!("✅ Added card {id}");
        }
        CardsAction::Generate { document_id, count } => {
            let gemini = runtime::gemini(&config)?;
            let service = FlashcardService::new(gemini, store.clone(), store);

            println!("🧠 Generating {count} flashcard(s)...");
            let cards = service.generate(user_id, &document_id, count).await?;
            println!("✅ Added {} card(s) to {document_id}", cards.len());
            for card in &cards {
                println!();
                println!("   {}", card.id);
                println!("   Q: {}", card.question);
                println!("   A: {}", card.answer);
            }
        }
        CardsAction::Due { document_id, limit } => {
            let service = ReviewService::new(
                Sm2Scheduler::new(config.scheduler.max_interval_days),
                store,
            );
            let due = service.due(user_id, &document_id, limit).await?;
            if due.is_empty() {
                println!("No flashcards due");
                return Ok(());
            }
            println!("🗂  {} card(s) due", due.len());
            for card in &due {
                println!();
                println!("   {}", card.id);
                println!("   Q: {}", card.question);
                println!("   A: {}", card.answer);
            }
        }
        CardsAction::Review { card_id, quality } => {
            let service = ReviewService::new(
                Sm2Scheduler::new(config.scheduler.max_interval_days),
                store,
            );
            let outcome = service.review(user_id, &card_id, quality).await?;
            let schedule = &outcome.card.schedule;
            println!(
                "✅ Next review {} (interval {} day(s), efactor {:.2})",
                schedule.next_review.to_rfc3339(),
                schedule.interval_days,
                schedule.efactor
            );
            println!("   {} · {} card(s) due", outcome.message, outcome.due_count);
            if let Some(next) = &outcome.next_card {
                println!();
                println!("   Next: {}", next.id);
                println!("   Q: {}", next.question);
            }
        }
    }
    Ok(())
}
