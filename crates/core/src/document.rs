//! Uploaded documents as seen by the retrieval pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a document is in the ingest lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Text extracted, no embeddings yet
    #[default]
    Uploaded,
    /// Chunks embedded and searchable
    Embedded,
    /// Last ingest attempt failed
    Failed,
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DocumentStatus::Uploaded => "uploaded",
            DocumentStatus::Embedded => "embedded",
            DocumentStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A user's document with its extracted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub filename: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        user_id: impl Into<String>,
        filename: impl Into<String>,
        extracted_text: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            filename: filename.into(),
            status: DocumentStatus::Uploaded,
            extracted_text: Some(extracted_text.into()),
            created_at: Utc::now(),
        }
    }

    /// The extracted text, if any non-whitespace text exists.
    pub fn text(&self) -> Option<&str> {
        self.extracted_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}
