//! # Neura Chunker
//!
//! Token-bounded sliding-window chunking for embedding.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`EncoderCache`] | One encoder per encoding name, memoized for the cache lifetime |
//! | [`HfEncoding`] | `tokenizers`-backed encoding; `byte_level` is builtin |
//! | [`Chunker`] | `chunk`, `count_tokens`, `chunk_count` with a character fallback |
//!
//! ```no_run
//! use std::sync::Arc;
//! use neura_chunker::{Chunker, EncoderCache};
//!
//! let chunker = Chunker::new(Arc::new(EncoderCache::new()), "byte_level");
//! let chunks = chunker.chunk("some long document text", 1000, 200).unwrap();
//! assert_eq!(chunks.len(), 1);
//! ```

pub mod cache;
pub mod chunker;
pub mod encoding;
#[cfg(feature = "hub")]
pub mod hub;

pub use cache::EncoderCache;
pub use chunker::{
    Chunker, DEFAULT_CHARS_PER_TOKEN, DEFAULT_CHUNK_SIZE, DEFAULT_ENCODING, DEFAULT_OVERLAP,
};
pub use encoding::{BYTE_LEVEL, HfEncoding};
