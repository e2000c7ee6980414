//! Retrieval-augmented chat over one embedded document.
//!
//! # Flow
//!
//! 1. Validate the request and the document (owned, `embedded`)
//! 2. Embed the query as `RETRIEVAL_QUERY`
//! 3. Similarity search within the document
//! 4. Assemble context under the context budget
//! 5. Trim history under the history budget
//! 6. Stream the generation as [`ChatEvent`]s
//!
//! Failures in steps 1-5 are returned as errors before any event is sent.
//! Once the provenance event is out, generation failures arrive as a final
//! `error` event.

use std::sync::Arc;

use neura_context::{ContextAssembler, to_history_entries, trim_history};
use neura_core::{
    ConversationTurn, DocumentStatus, DocumentStore, EmbeddingProvider, EmbeddingStore, Error,
    GenerationProvider, GenerationRequest, MatchQuery, Result, StoreError, TaskType, TokenCounter,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::event::ChatEvent;

pub const DEFAULT_MAX_CHUNKS: usize = 5;
pub const MAX_CHUNKS_LIMIT: usize = 20;
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.3;

/// A question about one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub document_id: String,
    pub query: String,
    /// Prior turns, oldest first.
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chunks: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
}

impl ChatRequest {
    pub fn new(document_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            query: query.into(),
            history: Vec::new(),
            max_chunks: None,
            similarity_threshold: None,
        }
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }

    /// Check the request fields. Roles are enforced when deserializing.
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::InvalidRequest("Query cannot be empty".into()));
        }
        if let Some(n) = self.max_chunks
            && !(1..=MAX_CHUNKS_LIMIT).contains(&n)
        {
            return Err(Error::InvalidRequest(format!(
                "max_chunks must be between 1 and {MAX_CHUNKS_LIMIT}, got {n}"
            )));
        }
        if let Some(t) = self.similarity_threshold
            && !(0.0..=1.0).contains(&t)
        {
            return Err(Error::InvalidRequest(format!(
                "similarity_threshold must be between 0 and 1, got {t}"
            )));
        }
        Ok(())
    }
}

pub struct ChatService {
    counter: Arc<dyn TokenCounter>,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    documents: Arc<dyn DocumentStore>,
    embeddings: Arc<dyn EmbeddingStore>,
    assembler: ContextAssembler,
    max_history_tokens: usize,
    max_chunks: usize,
    similarity_threshold: f32,
}

impl ChatService {
    pub fn new(
        counter: Arc<dyn TokenCounter>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        documents: Arc<dyn DocumentStore>,
        embeddings: Arc<dyn EmbeddingStore>,
    ) -> Self {
        Self {
            counter,
            embedder,
            generator,
            documents,
            embeddings,
            assembler: ContextAssembler::default(),
            max_history_tokens: neura_context::DEFAULT_MAX_HISTORY_TOKENS,
            max_chunks: DEFAULT_MAX_CHUNKS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    pub fn with_budgets(mut self, max_context_tokens: usize, max_history_tokens: usize) -> Self {
        self.assembler = ContextAssembler::new(max_context_tokens);
        self.max_history_tokens = max_history_tokens;
        self
    }

    pub fn with_retrieval(mut self, max_chunks: usize, similarity_threshold: f32) -> Self {
        self.max_chunks = max_chunks;
        self.similarity_threshold = similarity_threshold;
        self
    }

    /// Answer `request` for `user_id` as a stream of events.
    pub async fn chat(
        &self,
        user_id: &str,
        request: ChatRequest,
    ) -> Result<mpsc::Receiver<ChatEvent>> {
        request.validate()?;
        let document_id = request.document_id.as_str();

        let document = self
            .documents
            .get_document(user_id, document_id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                kind: "Document",
                id: document_id.to_string(),
            })?;
        if document.status != DocumentStatus::Embedded {
            return Err(StoreError::NotEmbedded(document_id.to_string()).into());
        }

        let query = request.query.trim();
        let query_embedding = self.embedder.embed(query, TaskType::RetrievalQuery).await?;

        let match_query = MatchQuery {
            document_id: document_id.to_string(),
            embedding: query_embedding,
            match_count: request.max_chunks.unwrap_or(self.max_chunks),
            similarity_threshold: request
                .similarity_threshold
                .unwrap_or(self.similarity_threshold),
        };
        let matches = self.embeddings.match_embeddings(&match_query).await?;
        if matches.is_empty() {
            return Err(StoreError::NoMatches(document_id.to_string()).into());
        }
        debug!(document_id, matches = matches.len(), "Retrieved chunks");

        let assembled = self.assembler.assemble(&matches, self.counter.as_ref())?;
        let history = trim_history(
            &request.history,
            self.max_history_tokens,
            self.counter.as_ref(),
        );

        info!(
            document_id,
            chunks = assembled.chunks.len(),
            context_tokens = assembled.token_count,
            history_turns = history.len(),
            "Starting chat"
        );

        let generation = GenerationRequest::new(query)
            .with_context(assembled.text)
            .with_history(to_history_entries(&history));

        let (tx, rx) = mpsc::channel(128);
        let provenance = ChatEvent::provenance(&assembled.chunks);
        let generator = Arc::clone(&self.generator);
        let document_id = document_id.to_string();

        tokio::spawn(async move {
            if tx.send(provenance).await.is_err() {
                return;
            }

            let mut fragments = match generator.generate_stream(generation).await {
                Ok(rx) => rx,
                Err(e) => {
                    warn!(document_id = %document_id, error = %e, "Generation failed to start");
                    let _ = tx.send(ChatEvent::Error { error: e.to_string() }).await;
                    return;
                }
            };

            let mut emitted = 0usize;
            while let Some(fragment) = fragments.recv().await {
                match fragment {
                    Ok(token) if token.is_empty() => {}
                    Ok(token) => {
                        emitted += 1;
                        if tx.send(ChatEvent::Token { token }).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(document_id = %document_id, error = %e, "Generation failed mid-stream");
                        let _ = tx.send(ChatEvent::Error { error: e.to_string() }).await;
                        return;
                    }
                }
            }

            info!(document_id = %document_id, tokens = emitted, "Chat completed");
            let _ = tx.send(ChatEvent::done()).await;
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rules() {
        assert!(ChatRequest::new("d", "What is ATP?").validate().is_ok());
        assert!(ChatRequest::new("d", "   ").validate().is_err());

        let mut r = ChatRequest::new("d", "q");
        r.max_chunks = Some(0);
        assert!(r.validate().is_err());
        r.max_chunks = Some(21);
        assert!(r.validate().is_err());
        r.max_chunks = Some(20);
        assert!(r.validate().is_ok());

        r.similarity_threshold = Some(1.5);
        assert!(r.validate().is_err());
        r.similarity_threshold = Some(0.0);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn request_rejects_unknown_roles() {
        let json = r#"{
            "document_id": "d",
            "query": "q",
            "history": [{"role": "system", "content": "x"}]
        }"#;
        assert!(serde_json::from_str::<ChatRequest>(json).is_err());
    }
}
