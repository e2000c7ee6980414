//! Context window assembly for retrieval-augmented chat.
//!
//! | Piece | Budget | Trim strategy |
//! |-------|--------|---------------|
//! | Retrieved chunks | 8000 tokens | Lowest similarity evicted first, document order restored |
//! | Conversation history | 4000 tokens | Oldest turns dropped, stops at first overflow |
//!
//! Both depend only on a [`TokenCounter`](neura_core::TokenCounter), so the
//! same encoding that sized the chunks sizes the prompt.

pub mod assembler;
pub mod history;
pub mod prompt;

pub use assembler::{
    AssembledContext, CONTEXT_SEPARATOR, ContextAssembler, DEFAULT_MAX_CONTEXT_TOKENS,
    assemble_context,
};
pub use history::{DEFAULT_MAX_HISTORY_TOKENS, to_history_entries, trim_history};
pub use prompt::build_prompt;
