//! Provider traits — the abstraction over the hosted embedding and
//! generation API.
//!
//! The retrieval core never calls these; the pipeline does, feeding them
//! chunk texts, assembled context and trimmed history.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::HistoryEntry;

/// What an embedding will be used for. Providers optimize the vector
/// differently for stored documents and for search queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::RetrievalDocument => "RETRIEVAL_DOCUMENT",
            TaskType::RetrievalQuery => "RETRIEVAL_QUERY",
        }
    }
}

/// A streamed generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The user's question.
    pub prompt: String,

    /// Assembled retrieval context (may be empty).
    #[serde(default)]
    pub context: String,

    /// Trimmed prior turns, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,

    /// Override for the provider's output token cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// Override for the provider's temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Ask the provider for a JSON document instead of prose.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub json_output: bool,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context: String::new(),
            history: Vec::new(),
            max_output_tokens: None,
            temperature: None,
            json_output: false,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.history = history;
        self
    }

    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// Receiving end of a streamed generation: text fragments in order.
pub type FragmentStream = tokio::sync::mpsc::Receiver<Result<String, ProviderError>>;

/// Produces embedding vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// A human-readable name for this provider (e.g. "gemini").
    fn name(&self) -> &str;

    /// Dimensionality of the vectors this provider returns.
    fn dimensions(&self) -> usize;

    /// Embed a single non-empty text.
    async fn embed(&self, text: &str, task: TaskType) -> Result<Vec<f32>, ProviderError>;

    /// Embed several texts, one vector per input, in input order.
    ///
    /// Default implementation embeds sequentially.
    async fn embed_batch(
        &self,
        texts: &[String],
        task: TaskType,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        validate_batch(texts)?;
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text, task).await?);
        }
        Ok(out)
    }
}

/// Produces streamed text completions.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Start a streamed generation. Fragments arrive on the returned
    /// channel; a failure mid-stream arrives as an `Err` item.
    async fn generate_stream(
        &self,
        request: GenerationRequest,
    ) -> Result<FragmentStream, ProviderError>;

    /// Generate a complete response in one call.
    ///
    /// Default implementation drains `generate_stream`.
    async fn complete(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        let mut stream = self.generate_stream(request).await?;
        let mut text = String::new();
        while let Some(fragment) = stream.recv().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

/// Reject empty batches and batches containing blank texts.
pub fn validate_batch(texts: &[String]) -> Result<(), ProviderError> {
    if texts.is_empty() {
        return Err(ProviderError::InvalidInput("texts list cannot be empty".into()));
    }
    if let Some(i) = texts.iter().position(|t| t.trim().is_empty()) {
        return Err(ProviderError::InvalidInput(format!(
            "text {} of {} is empty",
            i + 1,
            texts.len()
        )));
    }
    Ok(())
}
