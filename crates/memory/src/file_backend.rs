//! File-based store — persistent JSON-lines storage.
//!
//! One JSONL file per table under a data directory:
//!
//! ```text
//! <data_dir>/documents.jsonl
//! <data_dir>/embeddings.jsonl
//! <data_dir>/flashcards.jsonl
//! ```
//!
//! Rows are loaded into memory on open and the touched table is rewritten on
//! every mutation. A mutation runs against a staged copy of its table and is
//! only applied in memory once the file write succeeds, so a failed write
//! leaves both memory and disk unchanged. Corrupted lines are skipped with a
//! warning.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use neura_core::{
    Document, DocumentStatus, DocumentStore, EmbeddingRecord, EmbeddingStore, Flashcard,
    FlashcardSchedule, FlashcardStore, MatchQuery, RetrievedMatch, StoreError,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::tables::{Table, Tables};

const DOCUMENTS_FILE: &str = "documents.jsonl";
const EMBEDDINGS_FILE: &str = "embeddings.jsonl";
const FLASHCARDS_FILE: &str = "flashcards.jsonl";

/// A JSONL-backed store for documents, embeddings and flashcards.
pub struct FileStore {
    dir: PathBuf,
    tables: Arc<RwLock<Tables>>,
}

impl FileStore {
    /// Open the store rooted at `dir`.
    ///
    /// Missing files start empty; the directory is created on first write.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let tables = Tables {
            documents: load_rows(&dir.join(DOCUMENTS_FILE)),
            embeddings: load_rows(&dir.join(EMBEDDINGS_FILE)),
            flashcards: load_rows(&dir.join(FLASHCARDS_FILE)),
        };
        debug!(
            dir = %dir.display(),
            documents = tables.documents.len(),
            embeddings = tables.embeddings.len(),
            flashcards = tables.flashcards.len(),
            "File store loaded"
        );
        Self {
            dir,
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Apply `op` to a staged copy of `table`, persist it, then swap it in.
    async fn mutate<R>(
        &self,
        table: Table,
        op: impl FnOnce(&mut Tables) -> Result<R, StoreError> + Send,
    ) -> Result<R, StoreError> {
        let mut tables = self.tables.write().await;
        let mut staged = tables.stage(table);
        let out = op(&mut staged)?;
        self.flush(&staged, table)?;
        tables.commit(staged, table);
        Ok(out)
    }

    /// Rewrite one table's file from the given rows.
    fn flush(&self, tables: &Tables, table: Table) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| StoreError::Storage(format!("Failed to create data directory: {e}")))?;

        match table {
            Table::Documents => write_rows(&self.dir.join(DOCUMENTS_FILE), &tables.documents),
            Table::Embeddings => write_rows(&self.dir.join(EMBEDDINGS_FILE), &tables.embeddings),
            Table::Flashcards => write_rows(&self.dir.join(FLASHCARDS_FILE), &tables.flashcards),
        }
    }
}

fn load_rows<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<T>(line) {
            Ok(row) => Some(row),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping corrupted row");
                None
            }
        })
        .collect()
}

/// Write rows to a sibling temp file, then rename over the target.
fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), StoreError> {
    let mut content = String::new();
    for row in rows {
        let line = serde_json::to_string(row)
            .map_err(|e| StoreError::Storage(format!("Failed to serialize row: {e}")))?;
        content.push_str(&line);
        content.push('\n');
    }

    let tmp = path.with_extension("jsonl.tmp");
    std::fs::write(&tmp, &content)
        .map_err(|e| StoreError::Storage(format!("Failed to write {}: {e}", tmp.display())))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| StoreError::Storage(format!("Failed to replace {}: {e}", path.display())))?;
    Ok(())
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn put_document(&self, document: Document) -> Result<(), StoreError> {
        self.mutate(Table::Documents, |tables| {
            tables.put_document(document);
            Ok(())
        })
        .await
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
        self.mutate(Table::Documents, |tables| tables.set_status(document_id, status))
            .await
    }
}

#[async_trait]
impl EmbeddingStore for FileStore {
    async fn replace_embeddings(
        &self,
        document_id: &str,
        records: Vec<EmbeddingRecord>,
    ) -> Result<usize, StoreError> {
        self.mutate(Table::Embeddings, |tables| {
            Ok(tables.replace_embeddings(document_id, records))
        })
        .await
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
impl FlashcardStore for FileStore {
    async fn insert_flashcards(&self, cards: Vec<Flashcard>) -> Result<usize, StoreError> {
        self.mutate(Table::Flashcards, |tables| Ok(tables.insert_flashcards(cards)))
            .await
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
        self.mutate(Table::Flashcards, |tables| {
            tables.update_schedule(user_id, id, schedule, reviewed_at)
        })
        .await
    }
}
