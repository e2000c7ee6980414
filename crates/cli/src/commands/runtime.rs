//! Shared wiring for commands: config, chunker, stores, provider.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use neura_chunker::{Chunker, EncoderCache};
use neura_config::AppConfig;
use neura_memory::FileStore;
use neura_providers::GeminiClient;

/// Load the config from `path`, or the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let path = path.map_or_else(AppConfig::config_path, Path::to_path_buf);
    let mut config = AppConfig::load_from(&path)?;
    config.apply_env_overrides();
    Ok(config)
}

/// A chunker over the configured tokenizer directory.
pub fn chunker(config: &AppConfig, encoding: Option<String>) -> Chunker {
    let cache = Arc::new(EncoderCache::with_tokenizer_dir(config.chunking.tokenizer_dir()));
    let encoding = encoding.unwrap_or_else(|| config.chunking.encoding.clone());
    Chunker::new(cache, encoding).with_chars_per_token(config.chunking.chars_per_token)
}

pub fn store(config: &AppConfig) -> Arc<FileStore> {
    Arc::new(FileStore::open(config.storage.data_dir()))
}

/// The Gemini client, or a setup hint when no key is configured.
pub fn gemini(config: &AppConfig) -> Result<Arc<GeminiClient>, Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    NEURA_API_KEY=...    (highest priority)");
        eprintln!("    GEMINI_API_KEY=...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }
    let client = GeminiClient::from_config(&config.gemini, config.api_key.as_deref())?;
    Ok(Arc::new(client))
}

/// Read a file, or stdin for `-`.
pub fn read_input(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Mitochondria.").unwrap();
        assert_eq!(read_input(&path).unwrap(), "Mitochondria.");
        assert!(read_input(&dir.path().join("missing.txt")).is_err());
    }

    #[test]
    fn chunker_uses_override_encoding() {
        let config = AppConfig::default();
        assert_eq!(chunker(&config, None).encoding(), "cl100k_base");
        assert_eq!(chunker(&config, Some("byte_level".into())).encoding(), "byte_level");
    }

    #[test]
    fn explicit_config_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "user_id = \"tester\"\n[chunking]\nchunk_size = 64\noverlap = 8\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.user_id, "tester");
        assert_eq!(config.chunking.chunk_size, 64);
    }
}
