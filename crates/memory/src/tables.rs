//! Row storage shared by the in-memory and file stores.
//!
//! Plain synchronous operations over three row vectors; the stores wrap a
//! `Tables` in a lock and decide what to persist.

use chrono::{DateTime, Utc};
use neura_core::{
    Document, DocumentStatus, EmbeddingRecord, Flashcard, FlashcardSchedule, MatchQuery,
    RetrievedMatch, StoreError,
};

use crate::vector::match_records;

/// The table a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Table {
    Documents,
    Embeddings,
    Flashcards,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct Tables {
    pub documents: Vec<Document>,
    pub embeddings: Vec<EmbeddingRecord>,
    pub flashcards: Vec<Flashcard>,
}

impl Tables {
    pub fn put_document(&mut self, document: Document) {
        match self.documents.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => *existing = document,
            None => self.documents.push(document),
        }
    }

    pub fn get_document(&self, user_id: &str, document_id: &str) -> Option<Document> {
        self.documents
            .iter()
            .find(|d| d.id == document_id && d.user_id == user_id)
            .cloned()
    }

    pub fn set_status(&mut self, document_id: &str, status: DocumentStatus) -> Result<(), StoreError> {
        let document = self
            .documents
            .iter_mut()
            .find(|d| d.id == document_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "Document",
                id: document_id.to_string(),
            })?;
        document.status = status;
        Ok(())
    }

    /// Swap a document's records, assigning fresh row ids.
    pub fn replace_embeddings(&mut self, document_id: &str, records: Vec<EmbeddingRecord>) -> usize {
        let before = self.embeddings.len();
        self.embeddings.retain(|r| r.document_id != document_id);
        let deleted = before - self.embeddings.len();

        let mut next_id = self.embeddings.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        for mut record in records {
            record.id = next_id;
            record.document_id = document_id.to_string();
            next_id += 1;
            self.embeddings.push(record);
        }
        deleted
    }

    pub fn match_embeddings(&self, query: &MatchQuery) -> Vec<RetrievedMatch> {
        match_records(&self.embeddings, query)
    }

    pub fn count_embeddings(&self, document_id: &str) -> usize {
        self.embeddings
            .iter()
            .filter(|r| r.document_id == document_id)
            .count()
    }

    pub fn insert_flashcards(&mut self, cards: Vec<Flashcard>) -> usize {
        let count = cards.len();
        self.flashcards.extend(cards);
        count
    }

    pub fn get_flashcard(&self, user_id: &str, id: &str) -> Option<Flashcard> {
        self.flashcards
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
            .cloned()
    }

    pub fn list_flashcards(&self, user_id: &str, document_id: &str) -> Vec<Flashcard> {
        let mut cards: Vec<Flashcard> = self
            .flashcards
            .iter()
            .filter(|c| c.user_id == user_id && c.document_id == document_id)
            .cloned()
            .collect();
        cards.sort_by_key(|c| c.schedule.next_review);
        cards
    }

    pub fn update_schedule(
        &mut self,
        user_id: &str,
        id: &str,
        schedule: &FlashcardSchedule,
        reviewed_at: DateTime<Utc>,
    ) -> Result<Flashcard, StoreError> {
        let card = self
            .flashcards
            .iter_mut()
            .find(|c| c.id == id && c.user_id == user_id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "Flashcard",
                id: id.to_string(),
            })?;
        card.schedule = schedule.clone();
        card.last_reviewed = Some(reviewed_at);
        Ok(card.clone())
    }

    // ── Staging ─────────────────────────────────────────────────────────

    /// A copy holding only `table`'s rows; the other tables are empty.
    pub fn stage(&self, table: Table) -> Tables {
        let mut staged = Tables::default();
        match table {
            Table::Documents => staged.documents = self.documents.clone(),
            Table::Embeddings => staged.embeddings = self.embeddings.clone(),
            Table::Flashcards => staged.flashcards = self.flashcards.clone(),
        }
        staged
    }

    /// Take `table`'s rows from a staged copy.
    pub fn commit(&mut self, staged: Tables, table: Table) {
        match table {
            Table::Documents => self.documents = staged.documents,
            Table::Embeddings => self.embeddings = staged.embeddings,
            Table::Flashcards => self.flashcards = staged.flashcards,
        }
    }
}
