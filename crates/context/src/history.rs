//! Conversation history trimming.
//!
//! Keeps the most recent turns that fit a token budget. Scanning stops at
//! the first turn that would overflow; older turns are never packed in
//! around it, so the kept set is always a contiguous suffix.

use neura_core::{ConversationTurn, HistoryEntry, TokenCounter};
use tracing::debug;

/// Default token budget for conversation history.
pub const DEFAULT_MAX_HISTORY_TOKENS: usize = 4000;

/// The newest turns whose combined content fits `max_tokens`, oldest first.
pub fn trim_history(
    turns: &[ConversationTurn],
    max_tokens: usize,
    counter: &dyn TokenCounter,
) -> Vec<ConversationTurn> {
    let mut running_total = 0;
    let mut start = turns.len();

    for (position, turn) in turns.iter().enumerate().rev() {
        let tokens = counter.count_tokens(&turn.content);
        if running_total + tokens > max_tokens {
            debug!(
                dropped = position + 1,
                kept = turns.len() - start,
                budget = max_tokens,
                "History truncated"
            );
            break;
        }
        running_total += tokens;
        start = position;
    }

    turns[start..].to_vec()
}

/// Convert turns into the `{role, parts}` shape of the generation call.
pub fn to_history_entries(turns: &[ConversationTurn]) -> Vec<HistoryEntry> {
    turns.iter().map(HistoryEntry::from).collect()
}
