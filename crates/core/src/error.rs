//! Error types for the Neura domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; the retrieval core only
//! ever produces the small closed sets in `ChunkerError`, `EncodingError`,
//! `ContextError` and `ScheduleError`.

use thiserror::Error;

/// The top-level error type for all Neura operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Retrieval core ---
    #[error("Chunker error: {0}")]
    Chunker(#[from] ChunkerError),

    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    // --- Collaborators ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Request validation ---
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Retrieval core errors ---

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkerError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Failures of a token encoding. None of these escape the chunker: an
/// unavailable encoding falls back to the character approximation and a
/// decode artifact skips a single window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("Encoding '{name}' unavailable: {reason}")]
    Unavailable { name: String, reason: String },

    #[error("Failed to encode text: {0}")]
    Encode(String),

    #[error("Decode artifact: {0}")]
    DecodeArtifact(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("No fitting context: {candidates} candidate chunk(s) cannot fit within {max_tokens} tokens")]
    NoFittingContext { candidates: usize, max_tokens: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Quality must be between 0 and 5 (inclusive), got {0}")]
    InvalidQuality(i64),

    #[error("Repetitions must be non-negative, got {0}")]
    InvalidRepetitions(i64),

    #[error("Interval must be a positive integer (>= 1 day), got {0}")]
    InvalidInterval(i64),
}

// --- Collaborator errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider after {attempts} attempt(s)")]
    RateLimited { attempts: u32 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Response blocked by safety filters: {0}")]
    Blocked(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found or access denied: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Document {0} must be embedded first")]
    NotEmbedded(String),

    #[error("No relevant chunks found for document {0}")]
    NoMatches(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
