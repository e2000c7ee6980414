//! # Neura Pipeline
//!
//! Orchestration over the retrieval core and its collaborators:
//!
//! - [`IngestService`] — chunk a document, embed the chunks, store them
//! - [`ChatService`] — retrieve, assemble, trim, and stream a grounded answer
//! - [`ReviewService`] — SM-2 review with next-card lookup
//! - [`FlashcardService`] — generate cards from a document's text
//!
//! Services hold their collaborators as trait objects, so the same code runs
//! against Gemini and the file store in the CLI and against scripted mocks
//! in tests.

pub mod chat;
pub mod event;
pub mod flashcards;
pub mod ingest;
pub mod review;

pub use chat::{ChatRequest, ChatService};
pub use event::{ChatEvent, ProvenanceChunk};
pub use flashcards::{DEFAULT_FLASHCARD_COUNT, FlashcardService, MAX_FLASHCARD_COUNT};
pub use ingest::{IngestReport, IngestService};
pub use review::{ReviewOutcome, ReviewService};
