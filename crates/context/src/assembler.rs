//! Similarity-ranked chunk selection under a token budget.
//!
//! Eviction is by relevance, presentation is by position: the lowest
//! similarity candidate is removed until the joined text fits, and the
//! survivors are returned in `chunk_index` order so the model reads the
//! document the way it was written.

use neura_core::{ContextError, RetrievedMatch, TokenCounter};
use serde::Serialize;
use tracing::debug;

// ── Constants ─────────────────────────────────────────────────────────────

/// Separator placed between chunk texts in the assembled context.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Default token budget for assembled context.
pub const DEFAULT_MAX_CONTEXT_TOKENS: usize = 8000;

// ── Types ─────────────────────────────────────────────────────────────────

/// The chunks that fit, ready to be placed in a prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledContext {
    /// Selected chunks, sorted by `chunk_index` ascending.
    pub chunks: Vec<RetrievedMatch>,
    /// Chunk texts joined with the separator.
    pub text: String,
    /// Token count of `text`.
    pub token_count: usize,
    /// Evicted chunks, in eviction order.
    pub evicted: Vec<RetrievedMatch>,
}

// ── Assembler ─────────────────────────────────────────────────────────────

/// Stateless; create one and reuse it.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    max_tokens: usize,
    separator: String,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTEXT_TOKENS)
    }
}

impl ContextAssembler {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            separator: CONTEXT_SEPARATOR.to_string(),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Select the largest similarity-preserving subset of `matches` whose
    /// joined text fits in the budget.
    ///
    /// # Algorithm
    ///
    /// 1. Sort the candidates by `chunk_index` and join their texts
    /// 2. If the joined text fits, return it
    /// 3. Otherwise evict the single lowest-similarity candidate and retry
    /// 4. An exhausted candidate set is `NoFittingContext`
    ///
    /// Ties on similarity evict the earliest candidate in document order.
    pub fn assemble(
        &self,
        matches: &[RetrievedMatch],
        counter: &dyn TokenCounter,
    ) -> Result<AssembledContext, ContextError> {
        let mut candidates = matches.to_vec();
        let mut evicted = Vec::new();

        while !candidates.is_empty() {
            candidates.sort_by_key(|m| m.chunk_index);

            let text = self.join(&candidates);
            let token_count = counter.count_tokens(&text);
            if token_count <= self.max_tokens {
                debug!(
                    kept = candidates.len(),
                    evicted = evicted.len(),
                    tokens = token_count,
                    budget = self.max_tokens,
                    "Assembled context"
                );
                return Ok(AssembledContext {
                    chunks: candidates,
                    text,
                    token_count,
                    evicted,
                });
            }

            let lowest = candidates
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.score().total_cmp(&b.score()))
                .map(|(position, _)| position)
                .unwrap_or(0);
            let removed = candidates.remove(lowest);
            debug!(
                chunk_index = removed.chunk_index,
                similarity = removed.score(),
                tokens = token_count,
                budget = self.max_tokens,
                "Context over budget, evicting lowest-similarity chunk"
            );
            evicted.push(removed);
        }

        Err(ContextError::NoFittingContext {
            candidates: matches.len(),
            max_tokens: self.max_tokens,
        })
    }

    fn join(&self, chunks: &[RetrievedMatch]) -> String {
        chunks
            .iter()
            .map(|m| m.chunk_text.as_str())
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}

/// Select matches that fit `max_tokens`, in document order.
pub fn assemble_context(
    matches: &[RetrievedMatch],
    max_tokens: usize,
    counter: &dyn TokenCounter,
) -> Result<Vec<RetrievedMatch>, ContextError> {
    ContextAssembler::new(max_tokens)
        .assemble(matches, counter)
        .map(|assembled| assembled.chunks)
}
