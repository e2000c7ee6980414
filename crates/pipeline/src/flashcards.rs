//! Flashcard generation from a document's text.
//!
//! One non-streaming JSON completion, validated before any card is stored.
//! New cards start with the default SM-2 schedule and are due immediately.

use std::sync::Arc;

use neura_core::{
    DocumentStatus, DocumentStore, Error, Flashcard, FlashcardStore, GenerationProvider,
    GenerationRequest, ProviderError, Result, StoreError,
};
use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_FLASHCARD_COUNT: usize = 10;
pub const MAX_FLASHCARD_COUNT: usize = 50;

const GENERATION_TEMPERATURE: f32 = 0.4;
const GENERATION_MAX_OUTPUT_TOKENS: u32 = 4096;

#[derive(Deserialize)]
struct GeneratedDeck {
    flashcards: Vec<GeneratedCard>,
}

#[derive(Deserialize)]
struct GeneratedCard {
    question: String,
    answer: String,
}

pub struct FlashcardService {
    generator: Arc<dyn GenerationProvider>,
    documents: Arc<dyn DocumentStore>,
    flashcards: Arc<dyn FlashcardStore>,
}

impl FlashcardService {
    pub fn new(
        generator: Arc<dyn GenerationProvider>,
        documents: Arc<dyn DocumentStore>,
        flashcards: Arc<dyn FlashcardStore>,
    ) -> Self {
        Self {
            generator,
            documents,
            flashcards,
        }
    }

    /// Ask the generator for about `count` question/answer pairs covering
    /// the document and store them as new cards.
    ///
    /// The document must belong to `user_id` and be embedded. Nothing is
    /// stored unless the whole response parses.
    pub async fn generate(
        &self,
        user_id: &str,
        document_id: &str,
        count: usize,
    ) -> Result<Vec<Flashcard>> {
        if !(1..=MAX_FLASHCARD_COUNT).contains(&count) {
            return Err(Error::InvalidRequest(format!(
                "count must be between 1 and {MAX_FLASHCARD_COUNT}, got {count}"
            )));
        }

        let document = self
            .documents
            .get_document(user_id, document_id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                kind: "Document",
                id: document_id.to_string(),
            })?;
        if document.status != DocumentStatus::Embedded {
            return Err(StoreError::NotEmbedded(document_id.to_string()).into());
        }

        let Some(text) = document.text() else {
            return Err(Error::InvalidRequest(format!(
                "Document {document_id} has no extracted text"
            )));
        };

        let mut request = GenerationRequest::new(flashcard_prompt(text, count)).with_json_output();
        request.temperature = Some(GENERATION_TEMPERATURE);
        request.max_output_tokens = Some(GENERATION_MAX_OUTPUT_TOKENS);

        info!(
            document_id,
            count,
            text_chars = text.len(),
            generator = self.generator.name(),
            "Generating flashcards"
        );
        let raw = self.generator.complete(request).await?;
        let pairs = parse_flashcards(&raw)?;
        if pairs.len() != count {
            debug!(
                requested = count,
                generated = pairs.len(),
                "Generator returned a different card count"
            );
        }

        let cards: Vec<Flashcard> = pairs
            .into_iter()
            .map(|(question, answer)| Flashcard::new(user_id, document_id, question, answer))
            .collect();
        let inserted = self.flashcards.insert_flashcards(cards.clone()).await?;

        info!(document_id, inserted, "Flashcards stored");
        Ok(cards)
    }
}

/// Instructions for a JSON deck of `count` cards over `text`.
pub fn flashcard_prompt(text: &str, count: usize) -> String {
    format!(
        "Generate {count} flashcard Q&A pairs from the following document in JSON format. \
         Create diverse questions covering key concepts, facts, definitions, and relationships. \
         Questions should be concise and specific. Answers should be comprehensive but not overly long. \
         Output ONLY valid JSON with structure: \
         {{\"flashcards\": [{{\"question\": \"...\", \"answer\": \"...\"}}]}}. \
         Do not include markdown code blocks, explanations, or any text outside the JSON structure.\
         \n\nDocument text:\n{}",
        text.trim()
    )
}

/// Parse a `{"flashcards": [{question, answer}]}` deck into trimmed pairs.
///
/// A surrounding Markdown code fence is tolerated. An empty deck or a blank
/// question or answer is rejected.
pub fn parse_flashcards(raw: &str) -> std::result::Result<Vec<(String, String)>, ProviderError> {
    let deck: GeneratedDeck = serde_json::from_str(strip_code_fence(raw)).map_err(|e| {
        ProviderError::InvalidResponse(format!("Invalid JSON from flashcard generation: {e}"))
    })?;

    if deck.flashcards.is_empty() {
        return Err(ProviderError::InvalidResponse("No flashcards generated".into()));
    }

    deck.flashcards
        .into_iter()
        .enumerate()
        .map(|(i, card)| {
            let question = card.question.trim();
            let answer = card.answer.trim();
            if question.is_empty() || answer.is_empty() {
                return Err(ProviderError::InvalidResponse(format!(
                    "Invalid flashcard {}: question and answer must be non-empty",
                    i + 1
                )));
            }
            Ok((question.to_string(), answer.to_string()))
        })
        .collect()
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_deck() {
        let raw = r#"{"flashcards": [
            {"question": " What divides? ", "answer": "Cells"},
            {"question": "What makes ATP?", "answer": "Mitochondria"}
        ]}"#;
        let pairs = parse_flashcards(raw).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("What divides?".to_string(), "Cells".to_string()));
    }

    #[test]
    fn tolerates_code_fence() {
        let raw = "```json\n{\"flashcards\": [{\"question\": \"Q\", \"answer\": \"A\"}]}\n```";
        assert_eq!(parse_flashcards(raw).unwrap().len(), 1);
    }

    #[test]
    fn rejects_malformed_decks() {
        for raw in [
            "not valid json",
            r#"{"data": []}"#,
            r#"{"flashcards": []}"#,
            r#"{"flashcards": [{"answer": "A1"}]}"#,
            r#"{"flashcards": [{"question": "  ", "answer": "A1"}]}"#,
        ] {
            let err = parse_flashcards(raw).unwrap_err();
            assert!(matches!(err, ProviderError::InvalidResponse(_)), "{raw}");
        }
    }

    #[test]
    fn empty_deck_message() {
        let err = parse_flashcards(r#"{"flashcards": []}"#).unwrap_err();
        assert!(err.to_string().contains("No flashcards"));
    }

    #[test]
    fn prompt_names_count_and_shape() {
        let prompt = flashcard_prompt("  Cells divide.  ", 7);
        assert!(prompt.starts_with("Generate 7 flashcard Q&A pairs"));
        assert!(prompt.contains(r#"{"flashcards": [{"question": "...", "answer": "..."}]}"#));
        assert!(prompt.ends_with("Document text:\nCells divide."));
    }
}
