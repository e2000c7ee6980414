//! Google Gemini provider.
//!
//! Supports:
//! - `embedContent` with task type and output dimensionality
//! - Sequential batch embedding with free-tier pacing
//! - `streamGenerateContent` over SSE with `{role, parts}` history
//! - `generateContent` for one-shot completions, optionally as JSON
//!
//! The API key travels in the `x-goog-api-key` header, never in the URL.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use neura_config::GeminiConfig;
use neura_core::provider::validate_batch;
use neura_core::{
    EmbeddingProvider, FragmentStream, GenerationProvider, GenerationRequest, HistoryEntry,
    ProviderError, TaskType,
};
use serde_json::{Value, json};
use tracing::{debug, info, trace, warn};

use crate::retry::{RetryPolicy, with_retry};
use crate::sse::SseLineBuffer;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";
pub const DEFAULT_DIMENSIONS: usize = 1536;
/// Largest output dimensionality the embedding endpoint accepts.
pub const MAX_DIMENSIONS: usize = 3072;

const TOP_P: f32 = 0.95;
const TOP_K: u32 = 40;

/// Finish reasons that mean the response was withheld.
const BLOCKED_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "RECITATION",
];

/// A Gemini API client.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
    dimensions: usize,
    max_output_tokens: u32,
    temperature: f32,
    batch_delay: Duration,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl GeminiClient {
    /// Create a client with default models and pacing.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
            max_output_tokens: 8192,
            temperature: 0.7,
            batch_delay: Duration::from_millis(4500),
            retry: RetryPolicy::default(),
            client,
        }
    }

    /// Build a client from the `[gemini]` config section.
    pub fn from_config(
        config: &GeminiConfig,
        api_key: Option<&str>,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::NotConfigured(
                    "Gemini API key missing; set NEURA_API_KEY or GEMINI_API_KEY".into(),
                )
            })?;

        let batch_delay = if config.paid {
            Duration::ZERO
        } else {
            Duration::from_millis(config.batch_delay_ms)
        };

        let client = Self::new(api_key)
            .with_base_url(&config.base_url)
            .with_models(&config.chat_model, &config.embedding_model)
            .with_dimensions(config.embedding_dimensions)?
            .with_batch_delay(batch_delay)
            .with_retry_policy(RetryPolicy::from_config(config));

        Ok(Self {
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            ..client
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_models(mut self, chat_model: &str, embedding_model: &str) -> Self {
        self.chat_model = chat_model.to_string();
        self.embedding_model = embedding_model.to_string();
        self
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Result<Self, ProviderError> {
        if dimensions == 0 || dimensions > MAX_DIMENSIONS {
            return Err(ProviderError::InvalidInput(format!(
                "Invalid dimensions: {dimensions}. Must be between 1 and {MAX_DIMENSIONS}"
            )));
        }
        self.dimensions = dimensions;
        Ok(self)
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, model: &str, method: &str) -> String {
        format!("{}/{}:{method}", self.base_url, model_path(model))
    }

    fn embed_body(&self, text: &str, task: TaskType) -> Value {
        json!({
            "model": model_path(&self.embedding_model),
            "content": { "parts": [{ "text": text }] },
            "taskType": task.as_str(),
            "outputDimensionality": self.dimensions,
        })
    }

    fn generate_body(&self, request: &GenerationRequest) -> Value {
        let prompt = neura_context::build_prompt(&request.prompt, &request.context);

        let mut contents: Vec<Value> = request.history.iter().map(history_content).collect();
        contents.push(json!({
            "role": "user",
            "parts": [{ "text": prompt }],
        }));

        let mut generation_config = json!({
            "temperature": request.temperature.unwrap_or(self.temperature),
            "maxOutputTokens": request.max_output_tokens.unwrap_or(self.max_output_tokens),
            "topP": TOP_P,
            "topK": TOP_K,
        });
        if request.json_output {
            generation_config["responseMimeType"] = json!("application/json");
        }

        json!({
            "contents": contents,
            "generationConfig": generation_config,
        })
    }

    async fn post(&self, url: &str, body: &Value, stream: bool) -> Result<reqwest::Response, ProviderError> {
        let mut builder = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body);
        if stream {
            builder = builder.header("Accept", "text/event-stream");
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 200 {
            return Ok(response);
        }
        let error_body = response.text().await.unwrap_or_default();
        Err(status_error(status, error_body))
    }

    async fn embed_once(&self, text: &str, task: TaskType) -> Result<Vec<f32>, ProviderError> {
        let url = self.url(&self.embedding_model, "embedContent");
        let body = self.embed_body(text, task);
        let response = self.post(&url, &body, false).await?;
        let value: Value = response.json().await.map_err(|e| ProviderError::ApiError {
            status_code: 200,
            message: format!("Failed to parse embedding response: {e}"),
        })?;
        parse_embedding(&value, self.dimensions)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str, task: TaskType) -> Result<Vec<f32>, ProviderError> {
        if text.trim().is_empty() {
            return Err(ProviderError::InvalidInput("Text cannot be empty".into()));
        }

        debug!(
            model = %self.embedding_model,
            task = task.as_str(),
            chars = text.len(),
            "Sending embedding request"
        );
        with_retry(&self.retry, "embed", || self.embed_once(text, task)).await
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        task: TaskType,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        validate_batch(texts)?;

        let mut embeddings = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            let embedding = self.embed(text, task).await.inspect_err(|e| {
                warn!(
                    index = i + 1,
                    total = texts.len(),
                    error = %e,
                    "Failed to embed batch item"
                );
            })?;
            embeddings.push(embedding);

            if i + 1 < texts.len() && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_stream(
        &self,
        request: GenerationRequest,
    ) -> Result<FragmentStream, ProviderError> {
        if request.prompt.trim().is_empty() {
            return Err(ProviderError::InvalidInput("Prompt cannot be empty".into()));
        }

        let url = format!(
            "{}?alt=sse",
            self.url(&self.chat_model, "streamGenerateContent")
        );
        let body = self.generate_body(&request);

        info!(
            model = %self.chat_model,
            history_length = request.history.len(),
            prompt_chars = request.prompt.len(),
            context_chars = request.context.len(),
            "Starting Gemini chat stream"
        );

        let response = with_retry(&self.retry, "generate_stream", || {
            self.post(&url, &body, true)
        })
        .await?;

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let model = self.chat_model.clone();

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut lines = SseLineBuffer::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                for data in lines.push(&bytes) {
                    if !forward_event(&tx, &data).await {
                        return;
                    }
                }
            }

            if let Some(data) = lines.finish() {
                if !forward_event(&tx, &data).await {
                    return;
                }
            }
            info!(model = %model, "Completed Gemini chat stream");
        });

        Ok(rx)
    }

    async fn complete(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        if request.prompt.trim().is_empty() {
            return Err(ProviderError::InvalidInput("Prompt cannot be empty".into()));
        }

        let url = self.url(&self.chat_model, "generateContent");
        let body = self.generate_body(&request);

        info!(
            model = %self.chat_model,
            prompt_chars = request.prompt.len(),
            json_output = request.json_output,
            "Sending Gemini generation request"
        );

        let response = with_retry(&self.retry, "complete", || self.post(&url, &body, false)).await?;
        let value: Value = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse generation response: {e}"))
        })?;

        let text = parse_stream_event(&value)?
            .ok_or_else(|| ProviderError::InvalidResponse("Gemini returned no text".into()))?;
        debug!(chars = text.len(), "Gemini generation completed");
        Ok(text)
    }
}

/// Send the fragment carried by one SSE payload. Returns `false` once the
/// stream should stop (error sent or receiver dropped).
async fn forward_event(
    tx: &tokio::sync::mpsc::Sender<Result<String, ProviderError>>,
    data: &str,
) -> bool {
    let value: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            trace!(data = %data, error = %e, "Ignoring unparseable SSE chunk");
            return true;
        }
    };

    match parse_stream_event(&value) {
        Ok(Some(fragment)) => tx.send(Ok(fragment)).await.is_ok(),
        Ok(None) => true,
        Err(e) => {
            warn!(error = %e, "Gemini stream ended with an error");
            let _ = tx.send(Err(e)).await;
            false
        }
    }
}

// ── Wire helpers ──────────────────────────────────────────────────────────

/// Prefix bare model ids with `models/`.
fn model_path(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

fn history_content(entry: &HistoryEntry) -> Value {
    let parts: Vec<Value> = entry.parts.iter().map(|p| json!({ "text": p })).collect();
    json!({ "role": entry.role.as_str(), "parts": parts })
}

/// Map a non-200 status to a provider error.
fn status_error(status: u16, body: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited { attempts: 1 },
        401 | 403 => {
            ProviderError::AuthenticationFailed("Invalid Gemini API key or insufficient permissions".into())
        }
        400 => ProviderError::InvalidInput(api_error_message(&body)),
        _ => {
            warn!(status, body = %body, "Gemini returned error");
            ProviderError::ApiError {
                status_code: status,
                message: api_error_message(&body),
            }
        }
    }
}

/// The `error.message` of a Gemini error body, or the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

/// Extract `embedding.values` and check its length.
fn parse_embedding(value: &Value, expected: usize) -> Result<Vec<f32>, ProviderError> {
    let values = value["embedding"]["values"]
        .as_array()
        .or_else(|| value["embedding"].as_array())
        .ok_or_else(|| ProviderError::ApiError {
            status_code: 200,
            message: "Unexpected embedding response shape".into(),
        })?;

    let embedding: Vec<f32> = values
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect::<Option<_>>()
        .ok_or_else(|| ProviderError::ApiError {
            status_code: 200,
            message: "Embedding contains non-numeric values".into(),
        })?;

    if embedding.len() != expected {
        return Err(ProviderError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        });
    }
    Ok(embedding)
}

/// Text carried by one `GenerateContentResponse`, streamed or not.
///
/// `Ok(None)` for events with no text (e.g. a bare `STOP`).
fn parse_stream_event(value: &Value) -> Result<Option<String>, ProviderError> {
    if let Some(error) = value.get("error") {
        return Err(ProviderError::ApiError {
            status_code: error["code"].as_u64().unwrap_or(500) as u16,
            message: error["message"].as_str().unwrap_or("unknown error").to_string(),
        });
    }

    if let Some(reason) = value["promptFeedback"]["blockReason"].as_str() {
        return Err(ProviderError::Blocked(format!("prompt blocked: {reason}")));
    }

    let Some(candidate) = value["candidates"].as_array().and_then(|c| c.first()) else {
        return Ok(None);
    };

    let text: String = candidate["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter(|p| !p["thought"].as_bool().unwrap_or(false))
                .filter_map(|p| p["text"].as_str())
                .collect()
        })
        .unwrap_or_default();

    if let Some(reason) = candidate["finishReason"].as_str() {
        if BLOCKED_FINISH_REASONS.contains(&reason) && text.is_empty() {
            return Err(ProviderError::Blocked(format!(
                "response blocked by safety filters: {reason}"
            )));
        }
    }

    Ok(if text.is_empty() { None } else { Some(text) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use neura_core::{ConversationTurn, Role};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client() -> GeminiClient {
        GeminiClient::new("test-key")
            .with_batch_delay(Duration::ZERO)
            .with_retry_policy(RetryPolicy {
                max_retries: 2,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
            })
    }

    /// Serve one canned HTTP response per accepted connection.
    async fn serve(responses: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                read_request(&mut socket).await;
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });
        format!("http://{addr}")
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        l.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + length {
                    return;
                }
            }
        }
    }

    fn http(status: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    // ── Request bodies ──────────────────────────────────────────────────

    #[test]
    fn embed_body_shape() {
        let body = client().embed_body("chunk text", TaskType::RetrievalQuery);
        assert_eq!(body["model"], "models/embedding-001");
        assert_eq!(body["content"]["parts"][0]["text"], "chunk text");
        assert_eq!(body["taskType"], "RETRIEVAL_QUERY");
        assert_eq!(body["outputDimensionality"], 1536);
    }

    #[test]
    fn generate_body_frames_context_and_history() {
        let history = vec![
            HistoryEntry::from(ConversationTurn::user("What is ATP?")),
            HistoryEntry::from(ConversationTurn::model("Energy currency.")),
        ];
        let request = GenerationRequest::new("And ADP?")
            .with_context("ATP loses a phosphate to become ADP.")
            .with_history(history);
        let body = client().generate_body(&request);

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["text"], "Energy currency.");
        assert_eq!(
            contents[2]["parts"][0]["text"],
            "Context from document:\n\nATP loses a phosphate to become ADP.\n\nUser question: And ADP?"
        );
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(body["generationConfig"]["topK"], 40);
    }

    #[test]
    fn generate_body_honors_overrides() {
        let mut request = GenerationRequest::new("q");
        request.max_output_tokens = Some(100);
        request.temperature = Some(0.0);
        let body = client().generate_body(&request);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 100);
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "q");
    }

    #[test]
    fn generate_body_requests_json() {
        let body = client().generate_body(&GenerationRequest::new("q").with_json_output());
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");

        let body = client().generate_body(&GenerationRequest::new("q"));
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn model_paths() {
        assert_eq!(model_path("gemini-2.5-pro"), "models/gemini-2.5-pro");
        assert_eq!(model_path("models/embedding-001"), "models/embedding-001");
        let c = client();
        assert!(c.url("gemini-2.5-pro", "streamGenerateContent")
            .ends_with("/models/gemini-2.5-pro:streamGenerateContent"));
    }

    // ── Configuration ───────────────────────────────────────────────────

    #[test]
    fn from_config_requires_key() {
        let err = GeminiClient::from_config(&GeminiConfig::default(), None).unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
        assert!(GeminiClient::from_config(&GeminiConfig::default(), Some("  ")).is_err());
    }

    #[test]
    fn from_config_applies_settings() {
        let config = GeminiConfig {
            paid: true,
            embedding_dimensions: 768,
            ..GeminiConfig::default()
        };
        let client = GeminiClient::from_config(&config, Some("k")).unwrap();
        assert_eq!(client.dimensions, 768);
        assert!(client.batch_delay.is_zero());
        assert!(!format!("{client:?}").contains("\"k\""));
    }

    #[test]
    fn rejects_out_of_range_dimensions() {
        assert!(GeminiClient::new("k").with_dimensions(0).is_err());
        assert!(GeminiClient::new("k").with_dimensions(4096).is_err());
    }

    // ── Response parsing ────────────────────────────────────────────────

    #[test]
    fn parses_embedding_values() {
        let v = json!({ "embedding": { "values": [0.1, 0.2, 0.3] } });
        assert_eq!(parse_embedding(&v, 3).unwrap(), vec![0.1f32, 0.2, 0.3]);
    }

    #[test]
    fn embedding_dimension_mismatch() {
        let v = json!({ "embedding": { "values": [0.1, 0.2] } });
        assert!(matches!(
            parse_embedding(&v, 3),
            Err(ProviderError::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn stream_event_text_and_stop() {
        let v = json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": "Hel" }, { "text": "lo" }] } }]
        });
        assert_eq!(parse_stream_event(&v).unwrap().as_deref(), Some("Hello"));

        let v = json!({ "candidates": [{ "content": { "parts": [] }, "finishReason": "STOP" }] });
        assert_eq!(parse_stream_event(&v).unwrap(), None);
    }

    #[test]
    fn stream_event_safety_block() {
        let v = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        assert!(matches!(parse_stream_event(&v), Err(ProviderError::Blocked(_))));

        let v = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert!(matches!(parse_stream_event(&v), Err(ProviderError::Blocked(_))));
    }

    #[test]
    fn stream_event_error_payload() {
        let v = json!({ "error": { "code": 503, "message": "overloaded" } });
        assert!(matches!(
            parse_stream_event(&v),
            Err(ProviderError::ApiError { status_code: 503, .. })
        ));
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(status_error(429, String::new()), ProviderError::RateLimited { .. }));
        assert!(matches!(status_error(403, String::new()), ProviderError::AuthenticationFailed(_)));
        let err = status_error(400, r#"{"error":{"message":"bad field"}}"#.into());
        assert!(matches!(err, ProviderError::InvalidInput(ref m) if m == "bad field"));
        assert!(matches!(
            status_error(500, "boom".into()),
            ProviderError::ApiError { status_code: 500, .. }
        ));
    }

    // ── Over the wire ───────────────────────────────────────────────────

    #[tokio::test]
    async fn embed_retries_rate_limit_then_succeeds() {
        let ok_body = json!({ "embedding": { "values": vec![0.5; 4] } }).to_string();
        let base = serve(vec![
            http("429 Too Many Requests", "application/json", "{}"),
            http("200 OK", "application/json", &ok_body),
        ])
        .await;

        let client = client().with_base_url(&base).with_dimensions(4).unwrap();
        let embedding = client.embed("hello", TaskType::RetrievalDocument).await.unwrap();
        assert_eq!(embedding, vec![0.5; 4]);
    }

    #[tokio::test]
    async fn embed_auth_failure_is_not_retried() {
        let base = serve(vec![http("401 Unauthorized", "application/json", "{}")]).await;
        let client = client().with_base_url(&base);
        let err = client.embed("hello", TaskType::RetrievalQuery).await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn embed_batch_validates_before_calling() {
        let err = client()
            .embed_batch(&["ok".into(), "  ".into()], TaskType::RetrievalDocument)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn streams_fragments_in_order() {
        let events = [
            json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": "Cells " }] } }] }),
            json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": "divide." }] } }] }),
            json!({ "candidates": [{ "content": { "role": "model", "parts": [] }, "finishReason": "STOP" }] }),
        ];
        let body: String = events.iter().map(|e| format!("data: {e}\r\n\r\n")).collect();
        let base = serve(vec![http("200 OK", "text/event-stream", &body)]).await;

        let client = client().with_base_url(&base);
        let mut rx = client
            .generate_stream(GenerationRequest::new("How do cells grow?"))
            .await
            .unwrap();

        let mut fragments = Vec::new();
        while let Some(item) = rx.recv().await {
            fragments.push(item.unwrap());
        }
        assert_eq!(fragments, vec!["Cells ", "divide."]);
    }

    #[tokio::test]
    async fn stream_reports_safety_block() {
        let first = json!({ "candidates": [{ "content": { "parts": [{ "text": "Partial" }] } }] });
        let blocked = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        let body = format!("data: {first}\n\ndata: {blocked}\n\n");
        let base = serve(vec![http("200 OK", "text/event-stream", &body)]).await;

        let mut rx = client()
            .with_base_url(&base)
            .generate_stream(GenerationRequest::new("q"))
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().unwrap(), "Partial");
        assert!(matches!(rx.recv().await.unwrap(), Err(ProviderError::Blocked(_))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn complete_returns_whole_text() {
        let body = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "{\"flashcards\":" }, { "text": "[]}" }] },
                "finishReason": "STOP"
            }]
        })
        .to_string();
        let base = serve(vec![
            http("429 Too Many Requests", "application/json", "{}"),
            http("200 OK", "application/json", &body),
        ])
        .await;

        let text = client()
            .with_base_url(&base)
            .complete(GenerationRequest::new("Make cards").with_json_output())
            .await
            .unwrap();
        assert_eq!(text, r#"{"flashcards":[]}"#);
    }

    #[tokio::test]
    async fn complete_reports_safety_block() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } }).to_string();
        let base = serve(vec![http("200 OK", "application/json", &body)]).await;

        let err = client()
            .with_base_url(&base)
            .complete(GenerationRequest::new("q"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Blocked(_)));
    }

    #[tokio::test]
    async fn complete_without_text_is_invalid() {
        let body = json!({ "candidates": [{ "finishReason": "STOP" }] }).to_string();
        let base = serve(vec![http("200 OK", "application/json", &body)]).await;

        let err = client()
            .with_base_url(&base)
            .complete(GenerationRequest::new("q"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn complete_auth_failure() {
        let base = serve(vec![http("403 Forbidden", "application/json", "{}")]).await;
        let err = client()
            .with_base_url(&base)
            .complete(GenerationRequest::new("q"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn empty_prompt_rejected() {
        let err = client()
            .generate_stream(GenerationRequest::new("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput(_)));
    }

    #[test]
    fn history_roles_serialize_lowercase() {
        let entry = HistoryEntry {
            role: Role::Model,
            parts: vec!["a".into(), "b".into()],
        };
        let v = history_content(&entry);
        assert_eq!(v["role"], "model");
        assert_eq!(v["parts"][1]["text"], "b");
    }
}
