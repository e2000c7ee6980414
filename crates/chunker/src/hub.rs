//! Tokenizer download from the Hugging Face Hub.
//!
//! Fetches a repository's `tokenizer.json` and installs it as
//! `<dir>/<encoding>.json`, where `EncoderCache` looks for it.

use std::path::{Path, PathBuf};

use hf_hub::api::sync::Api;
use neura_core::EncodingError;
use tracing::info;

use crate::encoding::HfEncoding;

/// Hub repositories carrying a `tokenizer.json` for well-known encodings.
pub fn default_repo(encoding: &str) -> Option<&'static str> {
    match encoding {
        "cl100k_base" => Some("Xenova/gpt-4"),
        "o200k_base" => Some("Xenova/gpt-4o"),
        "p50k_base" => Some("Xenova/text-davinci-003"),
        "r50k_base" | "gpt2" => Some("Xenova/gpt2"),
        _ => None,
    }
}

/// Download `tokenizer.json` from `repo` (or the default repository for
/// `encoding`), check that it loads, and copy it into `dir`.
pub fn fetch_tokenizer(
    encoding: &str,
    repo: Option<&str>,
    dir: &Path,
) -> Result<PathBuf, EncodingError> {
    let unavailable = |reason: String| EncodingError::Unavailable {
        name: encoding.to_string(),
        reason,
    };

    let repo = repo
        .or_else(|| default_repo(encoding))
        .ok_or_else(|| unavailable("no known Hub repository; pass one explicitly".into()))?;

    info!(encoding, repo, "Downloading tokenizer from HuggingFace Hub");

    let api = Api::new().map_err(|e| unavailable(format!("HuggingFace Hub API error: {e}")))?;
    let downloaded = api
        .model(repo.to_string())
        .get("tokenizer.json")
        .map_err(|e| unavailable(format!("failed to download tokenizer.json from {repo}: {e}")))?;

    // Refuse to install a file the cache could not load.
    HfEncoding::from_file(encoding, &downloaded)?;

    std::fs::create_dir_all(dir)
        .map_err(|e| unavailable(format!("failed to create {}: {e}", dir.display())))?;
    let target = dir.join(format!("{encoding}.json"));
    std::fs::copy(&downloaded, &target)
        .map_err(|e| unavailable(format!("failed to write {}: {e}", target.display())))?;

    info!(encoding, path = %target.display(), "Tokenizer installed");
    Ok(target)
}
