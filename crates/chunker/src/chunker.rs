//! Token-bounded sliding-window chunking.
//!
//! The text is encoded once and a window of `chunk_size` tokens slides over
//! the token sequence, advancing by `chunk_size - overlap` each step. Each
//! window is decoded back to text. When the encoding cannot be resolved or
//! fails to encode, the same window logic runs over character offsets at
//! `chars_per_token` characters per token.

use std::sync::Arc;

use neura_core::{Chunk, ChunkerError, TokenCounter, TokenEncoding};
use tracing::{debug, warn};

use crate::cache::EncoderCache;

// ── Defaults ──────────────────────────────────────────────────────────────

/// Target tokens per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Tokens shared by consecutive chunks.
pub const DEFAULT_OVERLAP: usize = 200;
/// Encoding used when none is configured.
pub const DEFAULT_ENCODING: &str = "cl100k_base";
/// Fallback ratio when no encoder is available.
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

// ── Chunker ───────────────────────────────────────────────────────────────

/// Splits text into overlapping token-bounded chunks.
///
/// Cheap to clone; every clone shares the same encoder cache.
#[derive(Debug, Clone)]
pub struct Chunker {
    cache: Arc<EncoderCache>,
    encoding: String,
    chars_per_token: usize,
}

impl Chunker {
    /// Create a chunker for `encoding`, resolving it through `cache`.
    pub fn new(cache: Arc<EncoderCache>, encoding: impl Into<String>) -> Self {
        Self {
            cache,
            encoding: encoding.into(),
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }

    /// Override the character-per-token ratio of the fallback path.
    pub fn with_chars_per_token(mut self, chars_per_token: usize) -> Self {
        self.chars_per_token = chars_per_token.max(1);
        self
    }

    /// The same chunker using a different encoding.
    pub fn for_encoding(&self, encoding: impl Into<String>) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            encoding: encoding.into(),
            chars_per_token: self.chars_per_token,
        }
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }

    pub fn cache(&self) -> &Arc<EncoderCache> {
        &self.cache
    }

    /// Split `text` into chunks of at most `chunk_size` tokens, each sharing
    /// `overlap` tokens with its predecessor.
    ///
    /// Empty or whitespace-only text yields no chunks. Text that fits in a
    /// single chunk is returned verbatim.
    pub fn chunk(
        &self,
        text: &str,
        chunk_size: usize,
        overlap: usize,
    ) -> Result<Vec<Chunk>, ChunkerError> {
        validate(chunk_size, overlap)?;

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let Some((encoder, tokens)) = self.encode(text) else {
            return Ok(self.chunk_chars(text, chunk_size, overlap));
        };

        if tokens.len() <= chunk_size {
            return Ok(vec![Chunk::new(0, text)]);
        }

        let step = chunk_size - overlap;
        let mut chunks = Vec::with_capacity(tokens.len().div_ceil(step));
        let mut start = 0;

        while start < tokens.len() {
            let end = start.saturating_add(chunk_size).min(tokens.len());
            match encoder.decode(&tokens[start..end]) {
                Ok(decoded) => chunks.push(Chunk::new(chunks.len(), decoded)),
                Err(e) => warn!(
                    encoding = %self.encoding,
                    position = start,
                    error = %e,
                    "Failed to decode chunk window, skipping"
                ),
            }
            start += step;
        }

        debug!(
            encoding = %self.encoding,
            tokens = tokens.len(),
            chunks = chunks.len(),
            "Chunked text"
        );
        Ok(chunks)
    }

    /// Number of tokens in `text`; 0 for empty or whitespace-only text.
    pub fn count_tokens(&self, text: &str) -> usize {
        if text.trim().is_empty() {
            return 0;
        }
        match self.encode(text) {
            Some((_, tokens)) => tokens.len(),
            None => text.chars().count() / self.chars_per_token,
        }
    }

    /// Number of chunks `chunk` would produce, without decoding any window.
    pub fn chunk_count(
        &self,
        text: &str,
        chunk_size: usize,
        overlap: usize,
    ) -> Result<usize, ChunkerError> {
        validate(chunk_size, overlap)?;

        if text.trim().is_empty() {
            return Ok(0);
        }

        let count = match self.encode(text) {
            Some((_, tokens)) if tokens.len() <= chunk_size => 1,
            Some((_, tokens)) => (tokens.len() - overlap).div_ceil(chunk_size - overlap),
            None => {
                // u128 holds any product of two usizes.
                let len = text.chars().count() as u128;
                let per_token = self.chars_per_token as u128;
                let window = chunk_size as u128 * per_token;
                let shared = overlap as u128 * per_token;
                let windows = len.saturating_sub(shared).div_ceil(window - shared);
                usize::try_from(windows).unwrap_or(usize::MAX)
            }
        };
        Ok(count.max(1))
    }

    /// Resolve the encoder and encode `text`, or `None` to fall back.
    fn encode(&self, text: &str) -> Option<(Arc<dyn TokenEncoding>, Vec<u32>)> {
        let encoder = self.cache.get(&self.encoding).ok()?;
        match encoder.encode(text) {
            Ok(tokens) => Some((encoder, tokens)),
            Err(e) => {
                warn!(
                    encoding = %self.encoding,
                    error = %e,
                    "Encoding failed, falling back to character approximation"
                );
                None
            }
        }
    }

    /// The sliding window over character offsets.
    fn chunk_chars(&self, text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
        let window = chunk_size.saturating_mul(self.chars_per_token);
        let step = (chunk_size - overlap).saturating_mul(self.chars_per_token);

        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(text.len()))
            .collect();
        let len = bounds.len() - 1;

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < len {
            let end = start.saturating_add(window).min(len);
            chunks.push(Chunk::new(chunks.len(), &text[bounds[start]..bounds[end]]));
            start = start.saturating_add(step);
        }
        chunks
    }
}

impl TokenCounter for Chunker {
    fn count_tokens(&self, text: &str) -> usize {
        Chunker::count_tokens(self, text)
    }
}

fn validate(chunk_size: usize, overlap: usize) -> Result<(), ChunkerError> {
    if chunk_size < 1 {
        return Err(ChunkerError::InvalidParameter(
            "chunk_size must be positive".into(),
        ));
    }
    if chunk_size <= overlap {
        return Err(ChunkerError::InvalidParameter(
            "chunk_size must be greater than overlap".into(),
        ));
    }
    Ok(())
}
