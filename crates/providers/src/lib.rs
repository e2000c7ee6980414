//! Provider implementations for Neura.
//!
//! The Gemini client implements both `neura_core::EmbeddingProvider` and
//! `neura_core::GenerationProvider`. Rate-limited calls are retried with
//! exponential backoff; everything else fails fast.

pub mod gemini;
pub mod retry;
pub mod sse;

pub use gemini::GeminiClient;
pub use retry::{RetryPolicy, with_retry};
pub use sse::SseLineBuffer;
