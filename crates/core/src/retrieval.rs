//! Retrieval value objects.
//!
//! Text flows through the system as:
//! document text → `Chunk`s → `EmbeddingRecord`s (stored) → `RetrievedMatch`es
//! (similarity search) → assembled context.

use serde::{Deserialize, Serialize};

/// A contiguous slice of source text sized for one embedding call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// 0-based sequential index within the producing call.
    pub index: usize,
    pub text: String,
}

impl Chunk {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// One row returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedMatch {
    /// Row id of the stored embedding.
    pub id: i64,

    /// Position of the chunk within its document.
    pub chunk_index: usize,

    /// The chunk text.
    pub chunk_text: String,

    /// Cosine similarity to the query (0.0–1.0, higher = more relevant).
    #[serde(default)]
    pub similarity: f32,
}

impl RetrievedMatch {
    pub fn new(id: i64, chunk_index: usize, chunk_text: impl Into<String>, similarity: f32) -> Self {
        Self {
            id,
            chunk_index,
            chunk_text: chunk_text.into(),
            similarity,
        }
    }

    /// Similarity with non-finite values treated as 0.0.
    pub fn score(&self) -> f32 {
        if self.similarity.is_finite() {
            self.similarity
        } else {
            0.0
        }
    }
}

/// A stored chunk embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Row id, assigned by the store.
    #[serde(default)]
    pub id: i64,

    pub document_id: String,

    pub chunk_index: usize,

    pub chunk_text: String,

    pub embedding: Vec<f32>,

    /// Token count of `chunk_text` under the ingest encoding.
    pub token_count: usize,
}
