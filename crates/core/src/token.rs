//! Token encoding traits.
//!
//! A `TokenEncoding` maps text to integer token ids and back. It is the
//! universal sizing unit for chunking and budget checks. Implementations
//! live in `neura-chunker`; everything downstream only needs a
//! `TokenCounter`.

use crate::error::EncodingError;

/// A reversible (lossy-acceptable) text ⇄ token id mapping.
///
/// `decode(encode(x))` need not reproduce `x` byte-for-byte, but it must
/// always be valid UTF-8 for well-formed input. Instances are immutable once
/// constructed and shared between threads.
pub trait TokenEncoding: Send + Sync {
    /// The encoding name used as the cache key (e.g. "cl100k_base").
    fn name(&self) -> &str;

    /// Encode text into token ids.
    fn encode(&self, text: &str) -> Result<Vec<u32>, EncodingError>;

    /// Decode a (possibly partial) token sequence back into text.
    fn decode(&self, tokens: &[u32]) -> Result<String, EncodingError>;
}

/// Anything that can size text in tokens.
///
/// The context assembler depends only on this, so tests can plug in a
/// trivial counter without loading an encoder.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

impl<F> TokenCounter for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn count_tokens(&self, text: &str) -> usize {
        self(text)
    }
}
