//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use neura_core::{
    Document, DocumentStatus, DocumentStore, EmbeddingRecord, EmbeddingStore, Flashcard,
    FlashcardSchedule, FlashcardStore, MatchQuery, RetrievedMatch, StoreError,
};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::tables::Tables;

/// Documents, embeddings and flashcards held in process memory.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn put_document(&self, document: Document) -> Result<(), StoreError> {
        self.tables.write().await.put_document(document);
        Ok(())
    }

    async fn get_document(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self.tables.read().await.get_document(user_id, document_id))
    }

    async fn set_status(
        &self,
        document_id: &str,
        status: DocumentStatus,
    ) -> Result<(), StoreError> {
        self.tables.write().await.set_status(document_id, status)
    }
}

#[async_trait]
impl EmbeddingStore for InMemoryStore {
    async fn replace_embeddings(
        &self,
        document_id: &str,
        records: Vec<EmbeddingRecord>,
    ) -> Result<usize, StoreError> {
        Ok(self
            .tables
            .write()
            .await
            .replace_embeddings(document_id, records))
    }

    async fn match_embeddings(
        &self,
        query: &MatchQuery,
    ) -> Result<Vec<RetrievedMatch>, StoreError> {
        Ok(self.tables.read().await.match_embeddings(query))
    }

    async fn count_embeddings(&self, document_id: &str) -> Result<usize, StoreError> {
        Ok(self.tables.read().await.count_embeddings(document_id))
    }
}

#[async_trait]
impl FlashcardStore for InMemoryStore {
    async fn insert_flashcards(&self, cards: Vec<Flashcard>) -> Result<usize, StoreError> {
        Ok(self.tables.write().await.insert_flashcards(cards))
    }

    async fn get_flashcard(&self, user_id: &str, id: &str) -> Result<Option<Flashcard>, StoreError> {
        Ok(self.tables.read().await.get_flashcard(user_id, id))
    }

    async fn list_flashcards(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<Vec<Flashcard>, StoreError> {
        Ok(self.tables.read().await.list_flashcards(user_id, document_id))
    }

    async fn update_schedule(
        &self,
        user_id: &str,
        id: &str,
        schedule: &FlashcardSchedule,
        reviewed_at: DateTime<Utc>,
    ) -> Result<Flashcard, StoreError> {
        self.tables
            .write()
            .await
            .update_schedule(user_id, id, schedule, reviewed_at)
    }
}
