//! Prompt framing for grounded answers.

/// Frame a user question with assembled document context.
///
/// Blank context yields the bare question.
pub fn build_prompt(query: &str, context: &str) -> String {
    let query = query.trim();
    let context = context.trim();
    if context.is_empty() {
        query.to_string()
    } else {
        format!("Context from document:\n\n{context}\n\nUser question: {query}")
    }
}
