//! Document ingest: chunk → embed → store.
//!
//! Re-ingesting a document replaces its previous embeddings. Any failure
//! after the document is loaded marks it `failed`.

use std::sync::Arc;

use neura_chunker::Chunker;
use neura_core::{
    Document, DocumentStatus, DocumentStore, EmbeddingProvider, EmbeddingRecord, EmbeddingStore,
    Error, Result, StoreError, TaskType,
};
use serde::Serialize;
use tracing::{error, info};

/// Summary of a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub document_id: String,
    pub chunks: usize,
    pub tokens: usize,
    /// Records deleted from a previous ingest.
    pub replaced: usize,
}

pub struct IngestService {
    chunker: Chunker,
    embedder: Arc<dyn EmbeddingProvider>,
    documents: Arc<dyn DocumentStore>,
    embeddings: Arc<dyn EmbeddingStore>,
    chunk_size: usize,
    overlap: usize,
}

impl IngestService {
    pub fn new(
        chunker: Chunker,
        embedder: Arc<dyn EmbeddingProvider>,
        documents: Arc<dyn DocumentStore>,
        embeddings: Arc<dyn EmbeddingStore>,
    ) -> Self {
        Self {
            chunker,
            embedder,
            documents,
            embeddings,
            chunk_size: neura_chunker::DEFAULT_CHUNK_SIZE,
            overlap: neura_chunker::DEFAULT_OVERLAP,
        }
    }

    pub fn with_chunking(mut self, chunk_size: usize, overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.overlap = overlap;
        self
    }

    /// Store a new document and ingest it.
    pub async fn ingest_text(
        &self,
        user_id: &str,
        filename: &str,
        text: &str,
    ) -> Result<IngestReport> {
        let document = Document::new(user_id, filename, text);
        let document_id = document.id.clone();
        self.documents.put_document(document).await?;
        self.ingest(user_id, &document_id).await
    }

    /// Chunk and embed a stored document owned by `user_id`.
    pub async fn ingest(&self, user_id: &str, document_id: &str) -> Result<IngestReport> {
        let document = self
            .documents
            .get_document(user_id, document_id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                kind: "Document",
                id: document_id.to_string(),
            })?;

        let Some(text) = document.text() else {
            return Err(Error::InvalidRequest(format!(
                "Document {document_id} has no extracted text"
            )));
        };

        match self.embed_and_store(document_id, text).await {
            Ok(report) => {
                self.documents
                    .set_status(document_id, DocumentStatus::Embedded)
                    .await?;
                info!(
                    document_id,
                    chunks = report.chunks,
                    tokens = report.tokens,
                    replaced = report.replaced,
                    "Document embedded"
                );
                Ok(report)
            }
            Err(e) => {
                error!(document_id, error = %e, "Ingest failed");
                if let Err(status_err) = self
                    .documents
                    .set_status(document_id, DocumentStatus::Failed)
                    .await
                {
                    error!(document_id, error = %status_err, "Failed to mark document as failed");
                }
                Err(e)
            }
        }
    }

    async fn embed_and_store(&self, document_id: &str, text: &str) -> Result<IngestReport> {
        let chunks = self.chunker.chunk(text, self.chunk_size, self.overlap)?;
        if chunks.is_empty() {
            return Err(Error::InvalidRequest(format!(
                "Document {document_id} produced no chunks"
            )));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        info!(
            document_id,
            chunks = texts.len(),
            provider = self.embedder.name(),
            "Embedding chunks"
        );
        let vectors = self
            .embedder
            .embed_batch(&texts, TaskType::RetrievalDocument)
            .await?;
        if vectors.len() != chunks.len() {
            return Err(Error::Internal(format!(
                "Provider returned {} embeddings for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let records: Vec<EmbeddingRecord> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, embedding)| EmbeddingRecord {
                id: 0,
                document_id: document_id.to_string(),
                chunk_index: chunk.index,
                token_count: self.chunker.count_tokens(&chunk.text),
                chunk_text: chunk.text,
                embedding,
            })
            .collect();

        let chunk_count = records.len();
        let tokens = records.iter().map(|r| r.token_count).sum();
        let replaced = self
            .embeddings
            .replace_embeddings(document_id, records)
            .await?;

        Ok(IngestReport {
            document_id: document_id.to_string(),
            chunks: chunk_count,
            tokens,
            replaced,
        })
    }
}
