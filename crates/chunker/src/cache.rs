//! Process-wide encoder cache.
//!
//! One encoder per encoding name, resolved on first use and shared for the
//! lifetime of the cache. Entries are write-once per key, failures included,
//! so an unavailable encoding is reported once and then served from memory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use neura_core::{EncodingError, TokenEncoding};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::encoding::{BYTE_LEVEL, HfEncoding};

type Entry = Result<Arc<dyn TokenEncoding>, EncodingError>;

/// Memoizes encodings by name.
///
/// Names other than `byte_level` resolve to `<tokenizer_dir>/<name>.json`.
#[derive(Default)]
pub struct EncoderCache {
    tokenizer_dir: Option<PathBuf>,
    entries: RwLock<HashMap<String, Entry>>,
}

impl EncoderCache {
    /// A cache that only knows the builtin and registered encodings.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache that loads `<name>.json` tokenizer files from `dir`.
    pub fn with_tokenizer_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            tokenizer_dir: Some(dir.into()),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn tokenizer_dir(&self) -> Option<&Path> {
        self.tokenizer_dir.as_deref()
    }

    /// Install an encoding under its own name, replacing any cached entry.
    pub fn register(&self, encoding: Arc<dyn TokenEncoding>) {
        let name = encoding.name().to_string();
        debug!(encoding = %name, "Registered token encoding");
        self.entries.write().insert(name, Ok(encoding));
    }

    /// Resolve an encoding, loading it on first use.
    pub fn get(&self, name: &str) -> Result<Arc<dyn TokenEncoding>, EncodingError> {
        if let Some(entry) = self.entries.read().get(name) {
            return entry.clone();
        }

        let mut entries = self.entries.write();
        // Another caller may have resolved it between the two locks.
        if let Some(entry) = entries.get(name) {
            return entry.clone();
        }

        let resolved = self.resolve(name);
        match &resolved {
            Ok(_) => debug!(encoding = name, "Loaded token encoding"),
            Err(e) => warn!(
                encoding = name,
                error = %e,
                "Token encoding unavailable, falling back to character approximation"
            ),
        }
        entries.insert(name.to_string(), resolved.clone());
        resolved
    }

    /// Names with a cached entry (successful or not), sorted.
    pub fn cached_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn resolve(&self, name: &str) -> Entry {
        if name == BYTE_LEVEL {
            return Ok(Arc::new(HfEncoding::byte_level()?));
        }

        let unavailable = |reason: String| EncodingError::Unavailable {
            name: name.to_string(),
            reason,
        };

        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(unavailable("invalid encoding name".into()));
        }

        let Some(dir) = &self.tokenizer_dir else {
            return Err(unavailable("no tokenizer directory configured".into()));
        };

        let path = dir.join(format!("{name}.json"));
        if !path.is_file() {
            return Err(unavailable(format!("{} not found", path.display())));
        }

        Ok(Arc::new(HfEncoding::from_file(name, &path)?))
    }
}

impl std::fmt::Debug for EncoderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderCache")
            .field("tokenizer_dir", &self.tokenizer_dir)
            .field("cached", &self.cached_names())
            .finish()
    }
}
