//! Store traits — the relational/vector store seen from the pipeline.
//!
//! Every query is scoped by `user_id` where a row has an owner; a row owned
//! by someone else is indistinguishable from a missing one.
//!
//! Implementations: in-memory (tests, ephemeral sessions) and JSONL files.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{Document, DocumentStatus};
use crate::error::StoreError;
use crate::flashcard::{Flashcard, FlashcardSchedule};
use crate::retrieval::{EmbeddingRecord, RetrievedMatch};

/// Parameters of a similarity search within one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchQuery {
    pub document_id: String,
    pub embedding: Vec<f32>,
    /// Maximum number of rows to return.
    pub match_count: usize,
    /// Minimum similarity for a row to qualify.
    pub similarity_threshold: f32,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or replace a document.
    async fn put_document(&self, document: Document) -> Result<(), StoreError>;

    /// Fetch a document owned by `user_id`.
    async fn get_document(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Update a document's lifecycle status.
    async fn set_status(&self, document_id: &str, status: DocumentStatus)
    -> Result<(), StoreError>;
}

#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Replace every record of `document_id` with `records`.
    /// Returns how many previous records were deleted.
    async fn replace_embeddings(
        &self,
        document_id: &str,
        records: Vec<EmbeddingRecord>,
    ) -> Result<usize, StoreError>;

    /// Rows of one document ranked by descending similarity.
    async fn match_embeddings(&self, query: &MatchQuery)
    -> Result<Vec<RetrievedMatch>, StoreError>;

    /// Number of stored records for a document.
    async fn count_embeddings(&self, document_id: &str) -> Result<usize, StoreError>;
}

#[async_trait]
pub trait FlashcardStore: Send + Sync {
    /// Insert new cards. Returns the number inserted.
    async fn insert_flashcards(&self, cards: Vec<Flashcard>) -> Result<usize, StoreError>;

    /// Fetch a card owned by `user_id`.
    async fn get_flashcard(&self, user_id: &str, id: &str)
    -> Result<Option<Flashcard>, StoreError>;

    /// All of a user's cards for a document, earliest `next_review` first.
    async fn list_flashcards(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<Vec<Flashcard>, StoreError>;

    /// Persist a new schedule and review timestamp; returns the updated card.
    async fn update_schedule(
        &self,
        user_id: &str,
        id: &str,
        schedule: &FlashcardSchedule,
        reviewed_at: DateTime<Utc>,
    ) -> Result<Flashcard, StoreError>;
}
