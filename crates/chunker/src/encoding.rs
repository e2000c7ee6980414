//! `tokenizers`-backed token encodings.
//!
//! Any Hugging Face `tokenizer.json` can be loaded as an encoding. The
//! `byte_level` encoding is assembled in-process from the byte-level BPE
//! alphabet with no merges, so it is always available and needs no files:
//! one token per UTF-8 byte, lossy decode.

use std::path::Path;

use neura_core::{EncodingError, TokenEncoding};
use serde_json::{Map, Value, json};
use tokenizers::Tokenizer;
use tokenizers::pre_tokenizers::byte_level::ByteLevel;

/// Name of the builtin encoding that needs no tokenizer file.
pub const BYTE_LEVEL: &str = "byte_level";

/// A named encoding backed by a `tokenizers::Tokenizer`.
pub struct HfEncoding {
    name: String,
    tokenizer: Tokenizer,
}

impl HfEncoding {
    /// Wrap an already constructed tokenizer.
    pub fn new(name: impl Into<String>, tokenizer: Tokenizer) -> Self {
        Self {
            name: name.into(),
            tokenizer,
        }
    }

    /// Load a `tokenizer.json` file.
    pub fn from_file(name: impl Into<String>, path: &Path) -> Result<Self, EncodingError> {
        let name = name.into();
        let tokenizer = Tokenizer::from_file(path).map_err(|e| EncodingError::Unavailable {
            name: name.clone(),
            reason: format!("failed to load {}: {e}", path.display()),
        })?;
        Ok(Self::new(name, tokenizer))
    }

    /// The builtin byte-level encoding.
    pub fn byte_level() -> Result<Self, EncodingError> {
        let mut alphabet: Vec<char> = ByteLevel::alphabet().into_iter().collect();
        alphabet.sort_unstable();

        let vocab: Map<String, Value> = alphabet
            .iter()
            .enumerate()
            .map(|(id, c)| (c.to_string(), json!(id)))
            .collect();

        let byte_level = json!({
            "type": "ByteLevel",
            "add_prefix_space": false,
            "trim_offsets": true,
            "use_regex": true
        });

        let definition = json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": byte_level,
            "post_processor": null,
            "decoder": byte_level,
            "model": {
                "type": "BPE",
                "dropout": null,
                "unk_token": null,
                "continuing_subword_prefix": null,
                "end_of_word_suffix": null,
                "fuse_unk": false,
                "byte_fallback": false,
                "vocab": vocab,
                "merges": []
            }
        });

        let tokenizer = Tokenizer::from_bytes(definition.to_string().as_bytes()).map_err(|e| {
            EncodingError::Unavailable {
                name: BYTE_LEVEL.into(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self::new(BYTE_LEVEL, tokenizer))
    }

    /// Write the tokenizer definition as `tokenizer.json`-format file.
    pub fn save(&self, path: &Path) -> Result<(), EncodingError> {
        self.tokenizer
            .save(path, false)
            .map_err(|e| EncodingError::Unavailable {
                name: self.name.clone(),
                reason: format!("failed to save {}: {e}", path.display()),
            })
    }
}

impl TokenEncoding for HfEncoding {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, text: &str) -> Result<Vec<u32>, EncodingError> {
        self.tokenizer
            .encode(text, false)
            .map(|encoding| encoding.get_ids().to_vec())
            .map_err(|e| EncodingError::Encode(e.to_string()))
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, EncodingError> {
        self.tokenizer
            .decode(tokens, false)
            .map_err(|e| EncodingError::DecodeArtifact(e.to_string()))
    }
}

impl std::fmt::Debug for HfEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfEncoding")
            .field("name", &self.name)
            .field("vocab_size", &self.tokenizer.get_vocab_size(false))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_level_is_one_token_per_byte() {
        let enc = HfEncoding::byte_level().unwrap();
        assert_eq!(enc.name(), BYTE_LEVEL);
        assert_eq!(enc.encode("hello world").unwrap().len(), 11);
        assert_eq!(enc.encode("héllo").unwrap().len(), 6);
        assert_eq!(enc.encode(&"A".repeat(5000)).unwrap().len(), 5000);
    }

    #[test]
    fn byte_level_roundtrips_text() {
        let enc = HfEncoding::byte_level().unwrap();
        let text = "Mitochondria are the powerhouse of the cell.\nÜber café — 日本語";
        let ids = enc.encode(text).unwrap();
        assert_eq!(enc.decode(&ids).unwrap(), text);
    }

    #[test]
    fn partial_multibyte_window_decodes_lossily() {
        let enc = HfEncoding::byte_level().unwrap();
        let ids = enc.encode("é").unwrap();
        assert_eq!(ids.len(), 2);
        let partial = enc.decode(&ids[..1]).unwrap();
        assert_eq!(partial, "\u{FFFD}");
    }

    #[test]
    fn missing_file_is_unavailable() {
        let err = HfEncoding::from_file("nope", Path::new("/nonexistent/nope.json")).unwrap_err();
        assert!(matches!(err, EncodingError::Unavailable { ref name, .. } if name == "nope"));
    }

    #[test]
    fn loads_tokenizer_json_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        let enc = HfEncoding::byte_level().unwrap();
        enc.save(&path).unwrap();

        let loaded = HfEncoding::from_file("custom", &path).unwrap();
        assert_eq!(loaded.name(), "custom");
        assert_eq!(loaded.encode("abc").unwrap(), enc.encode("abc").unwrap());
    }
}
