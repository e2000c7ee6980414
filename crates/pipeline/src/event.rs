//! Chat streaming events.
//!
//! A chat stream is `provenance`, then zero or more `token`s, then exactly
//! one of `done` or `error`.

use neura_core::RetrievedMatch;
use serde::{Deserialize, Serialize};

/// One chunk that grounded the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceChunk {
    pub chunk_id: i64,
    pub chunk_index: usize,
    pub chunk_text: String,
    pub similarity: f32,
}

impl From<&RetrievedMatch> for ProvenanceChunk {
    fn from(m: &RetrievedMatch) -> Self {
        Self {
            chunk_id: m.id,
            chunk_index: m.chunk_index,
            chunk_text: m.chunk_text.clone(),
            similarity: m.similarity,
        }
    }
}

/// Events emitted while answering a chat question.
///
/// Serializes to the bare data payload; the event name comes from
/// [`ChatEvent::event_type`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatEvent {
    /// The chunks placed in the prompt, in document order.
    Provenance { chunks: Vec<ProvenanceChunk> },

    /// A non-empty fragment of the answer.
    Token { token: String },

    /// The answer completed.
    Done { finish_reason: String },

    /// Generation failed after streaming started.
    Error { error: String },
}

impl ChatEvent {
    pub fn provenance(matches: &[RetrievedMatch]) -> Self {
        Self::Provenance {
            chunks: matches.iter().map(ProvenanceChunk::from).collect(),
        }
    }

    pub fn done() -> Self {
        Self::Done {
            finish_reason: "stop".into(),
        }
    }

    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Provenance { .. } => "provenance",
            Self::Token { .. } => "token",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    /// Render as one SSE frame: `event: <type>\ndata: <json>\n\n`.
    pub fn to_sse(&self) -> Result<String, serde_json::Error> {
        let data = serde_json::to_string(self)?;
        Ok(format!("event: {}\ndata: {data}\n\n", self.event_type()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_frame() {
        let frame = ChatEvent::Token {
            token: "Hello".into(),
        }
        .to_sse()
        .unwrap();
        assert_eq!(frame, "event: token\ndata: {\"token\":\"Hello\"}\n\n");
    }

    #[test]
    fn done_frame() {
        let frame = ChatEvent::done().to_sse().unwrap();
        assert_eq!(frame, "event: done\ndata: {\"finish_reason\":\"stop\"}\n\n");
    }

    #[test]
    fn provenance_payload_fields() {
        let event = ChatEvent::provenance(&[RetrievedMatch::new(42, 3, "Cells divide.", 0.5)]);
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["chunks"][0]["chunk_id"], 42);
        assert_eq!(json["chunks"][0]["chunk_index"], 3);
        assert_eq!(json["chunks"][0]["chunk_text"], "Cells divide.");
        assert_eq!(json["chunks"][0]["similarity"], 0.5);
        assert!(event.to_sse().unwrap().starts_with("event: provenance\n"));
    }

    #[test]
    fn error_frame_and_terminal_flags() {
        let event = ChatEvent::Error {
            error: "boom".into(),
        };
        assert_eq!(event.event_type(), "error");
        assert!(event.is_terminal());
        assert!(ChatEvent::done().is_terminal());
        assert!(!ChatEvent::Token { token: "x".into() }.is_terminal());
        assert!(event.to_sse().unwrap().contains("{\"error\":\"boom\"}"));
    }
}
