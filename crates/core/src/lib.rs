//! # Neura Core
//!
//! Domain types, traits, and error definitions for the Neura document
//! intelligence backend. This crate has **no framework dependencies**. It
//! defines the records and seams that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The retrieval core (chunker, context assembler, SM-2 scheduler) consumes
//! only the plain records defined here. Collaborators that do I/O (the
//! embedding/generation provider and the stores) are traits, so the
//! pipeline can be driven by a hosted API in production and by scripted
//! mocks in tests.

pub mod document;
pub mod error;
pub mod flashcard;
pub mod message;
pub mod provider;
pub mod retrieval;
pub mod store;
pub mod token;

// Re-export key types at crate root for ergonomics
pub use document::{Document, DocumentStatus};
pub use error::{
    ChunkerError, ContextError, EncodingError, Error, ProviderError, Result, ScheduleError,
    StoreError,
};
pub use flashcard::{Flashcard, FlashcardSchedule};
pub use message::{ConversationTurn, HistoryEntry, Role};
pub use provider::{
    EmbeddingProvider, FragmentStream, GenerationProvider, GenerationRequest, TaskType,
};
pub use retrieval::{Chunk, EmbeddingRecord, RetrievedMatch};
pub use store::{DocumentStore, EmbeddingStore, FlashcardStore, MatchQuery};
pub use token::{TokenCounter, TokenEncoding};
