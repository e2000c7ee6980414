//! Configuration loading, validation, and management for Neura.
//!
//! Loads configuration from `~/.neura/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.neura/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gemini API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// User id that owns documents created from the CLI
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Retrieval / context window configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Spaced-repetition configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Gemini provider configuration
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Local storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_user_id() -> String {
    "local".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("user_id", &self.user_id)
            .field("chunking", &self.chunking)
            .field("retrieval", &self.retrieval)
            .field("scheduler", &self.scheduler)
            .field("gemini", &self.gemini)
            .field("storage", &self.storage)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target tokens per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Tokens shared between consecutive chunks
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Token encoding name
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Characters per token when no encoder is available
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,

    /// Directory holding `<encoding>.json` tokenizer files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer_dir: Option<PathBuf>,
}

fn default_chunk_size() -> usize {
    1000
}
fn default_overlap() -> usize {
    200
}
fn default_encoding() -> String {
    "cl100k_base".into()
}
fn default_chars_per_token() -> usize {
    4
}

impl ChunkingConfig {
    /// The configured tokenizer directory, or `~/.neura/tokenizers`.
    pub fn tokenizer_dir(&self) -> PathBuf {
        self.tokenizer_dir
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("tokenizers"))
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            encoding: default_encoding(),
            chars_per_token: default_chars_per_token(),
            tokenizer_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Token budget for assembled document context
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,

    /// Token budget for conversation history
    #[serde(default = "default_max_history_tokens")]
    pub max_history_tokens: usize,

    /// Chunks requested from similarity search
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,

    /// Minimum similarity for a chunk to be retrieved
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
}

fn default_max_context_tokens() -> usize {
    8000
}
fn default_max_history_tokens() -> usize {
    4000
}
fn default_max_chunks() -> usize {
    5
}
fn default_similarity_threshold() -> f32 {
    0.3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: default_max_context_tokens(),
            max_history_tokens: default_max_history_tokens(),
            max_chunks: default_max_chunks(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Hard cap on review intervals, in days
    #[serde(default = "default_max_interval_days")]
    pub max_interval_days: i64,
}

fn default_max_interval_days() -> i64 {
    3650
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_interval_days: default_max_interval_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Paid keys skip the free-tier pacing between embedding requests
    #[serde(default)]
    pub paid: bool,

    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,

    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_chat_model() -> String {
    "gemini-2.5-pro".into()
}
fn default_embedding_model() -> String {
    "models/embedding-001".into()
}
fn default_embedding_dimensions() -> usize {
    1536
}
fn default_max_output_tokens() -> u32 {
    8192
}
fn default_temperature() -> f32 {
    0.7
}
fn default_batch_delay_ms() -> u64 {
    4500
}
fn default_max_retries() -> u32 {
    5
}
fn default_initial_retry_delay_ms() -> u64 {
    2000
}
fn default_max_retry_delay_ms() -> u64 {
    120_000
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            paid: false,
            batch_delay_ms: default_batch_delay_ms(),
            max_retries: default_max_retries(),
            initial_retry_delay_ms: default_initial_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for JSONL document/embedding/flashcard files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// The configured data directory, or `~/.neura/data`.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("data"))
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.neura/config.toml).
    ///
    /// Also checks environment variables:
    /// - `NEURA_API_KEY` (highest priority), then `GEMINI_API_KEY`
    /// - `NEURA_CHAT_MODEL`
    /// - `NEURA_PAID` (`1`/`true`)
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `NEURA_*` / `GEMINI_API_KEY` overrides on top of file values.
    /// A key set in the file wins over the environment.
    pub fn apply_env_overrides(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("NEURA_API_KEY")
                .ok()
                .or_else(|| std::env::var("GEMINI_API_KEY").ok())
                .filter(|k| !k.trim().is_empty());
        }

        if let Ok(model) = std::env::var("NEURA_CHAT_MODEL") {
            self.gemini.chat_model = model;
        }

        if let Ok(paid) = std::env::var("NEURA_PAID") {
            self.gemini.paid = matches!(paid.trim(), "1" | "true" | "yes");
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::ParseError { reason, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".neura")
    }

    /// Default config file path (`~/.neura/config.toml`).
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.chunking;
        if c.chunk_size < 1 {
            return Err(ConfigError::ValidationError(
                "chunking.chunk_size must be positive".into(),
            ));
        }
        if c.chunk_size <= c.overlap {
            return Err(ConfigError::ValidationError(
                "chunking.chunk_size must be greater than chunking.overlap".into(),
            ));
        }
        if c.chars_per_token < 1 {
            return Err(ConfigError::ValidationError(
                "chunking.chars_per_token must be positive".into(),
            ));
        }

        let r = &self.retrieval;
        if r.max_context_tokens < 1 || r.max_history_tokens < 1 {
            return Err(ConfigError::ValidationError(
                "retrieval token budgets must be positive".into(),
            ));
        }
        if !(1..=20).contains(&r.max_chunks) {
            return Err(ConfigError::ValidationError(
                "retrieval.max_chunks must be between 1 and 20".into(),
            ));
        }
        if !(0.0..=1.0).contains(&r.similarity_threshold) {
            return Err(ConfigError::ValidationError(
                "retrieval.similarity_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if self.scheduler.max_interval_days < 1 {
            return Err(ConfigError::ValidationError(
                "scheduler.max_interval_days must be at least 1".into(),
            ));
        }

        let g = &self.gemini;
        if g.embedding_dimensions == 0 || g.embedding_dimensions > 3072 {
            return Err(ConfigError::ValidationError(
                "gemini.embedding_dimensions must be between 1 and 3072".into(),
            ));
        }
        if g.temperature < 0.0 || g.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "gemini.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            user_id: default_user_id(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            scheduler: SchedulerConfig::default(),
            gemini: GeminiConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.overlap, 200);
        assert_eq!(config.retrieval.max_context_tokens, 8000);
        assert_eq!(config.retrieval.max_history_tokens, 4000);
        assert_eq!(config.scheduler.max_interval_days, 3650);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = AppConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.chunking.encoding, config.chunking.encoding);
        assert_eq!(parsed.gemini.chat_model, config.gemini.chat_model);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config = AppConfig::from_toml(
            r#"
[chunking]
chunk_size = 512
overlap = 64
encoding = "byte_level"

[scheduler]
max_interval_days = 365
"#,
        )
        .unwrap();
        assert_eq!(config.chunking.chunk_size, 512);
        assert_eq!(config.chunking.chars_per_token, 4);
        assert_eq!(config.scheduler.max_interval_days, 365);
        assert_eq!(config.retrieval.max_chunks, 5);
    }

    #[test]
    fn overlap_not_below_chunk_size_rejected() {
        let mut config = AppConfig::default();
        config.chunking.overlap = config.chunking.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_retrieval_rejected() {
        let mut config = AppConfig::default();
        config.retrieval.max_chunks = 21;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.retrieval.similarity_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.gemini.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        let config = result.unwrap();
        assert_eq!(config.gemini.embedding_dimensions, 1536);
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("secret-key".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("cl100k_base"));
        assert!(toml_str.contains("gemini-2.5-pro"));
    }
}
