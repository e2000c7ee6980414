//! Store implementations for Neura.
//!
//! Both stores implement `DocumentStore`, `EmbeddingStore` and
//! `FlashcardStore` over the same row tables.

pub mod file_backend;
pub mod in_memory;
mod tables;
pub mod vector;

pub use file_backend::FileStore;
pub use in_memory::InMemoryStore;
pub use vector::{cosine_similarity, match_records};
