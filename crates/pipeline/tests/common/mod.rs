//! Scripted collaborators for pipeline tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use neura_chunker::{BYTE_LEVEL, Chunker, EncoderCache};
use neura_core::{
    EmbeddingProvider, Flashcard, FlashcardSchedule, FlashcardStore, FragmentStream,
    GenerationProvider, GenerationRequest, ProviderError, StoreError, TaskType,
};
use neura_memory::InMemoryStore;

/// One token per byte, so budgets in tests are byte counts.
pub fn byte_chunker() -> Chunker {
    Chunker::new(Arc::new(EncoderCache::new()), BYTE_LEVEL)
}

/// Embeds text as letter counts of `a`, `b` and `c`.
#[derive(Default)]
pub struct LetterEmbedder {
    pub calls: Mutex<Vec<(String, TaskType)>>,
    pub fail: bool,
}

impl LetterEmbedder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, TaskType)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for LetterEmbedder {
    fn name(&self) -> &str {
        "letters"
    }

    fn dimensions(&self) -> usize {
        3
    }

    async fn embed(&self, text: &str, task: TaskType) -> Result<Vec<f32>, ProviderError> {
        self.calls.lock().unwrap().push((text.to_string(), task));
        if self.fail {
            return Err(ProviderError::RateLimited { attempts: 6 });
        }
        Ok(['a', 'b', 'c']
            .iter()
            .map(|l| text.chars().filter(|c| c == l).count() as f32)
            .collect())
    }
}

/// Streams a fixed script of fragments and records the request.
pub struct ScriptedGenerator {
    script: Mutex<Vec<Result<String, ProviderError>>>,
    pub requests: Mutex<Vec<GenerationRequest>>,
    refuse: bool,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
            refuse: false,
        }
    }

    pub fn text(fragments: &[&str]) -> Self {
        Self::new(fragments.iter().map(|f| Ok(f.to_string())).collect())
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_stream(
        &self,
        request: GenerationRequest,
    ) -> Result<FragmentStream, ProviderError> {
        self.requests.lock().unwrap().push(request);
        if self.refuse {
            return Err(ProviderError::AuthenticationFailed("bad key".into()));
        }

        let script: Vec<_> = self.script.lock().unwrap().drain(..).collect();
        let (tx, rx) = tokio::sync::mpsc::channel(script.len().max(1));
        for item in script {
            tx.try_send(item).unwrap();
        }
        Ok(rx)
    }
}

/// A flashcard store whose listing always fails.
pub struct FlakyListing(pub InMemoryStore);

#[async_trait]
impl FlashcardStore for FlakyListing {
    async fn insert_flashcards(&self, cards: Vec<Flashcard>) -> Result<usize, StoreError> {
        self.0.insert_flashcards(cards).await
    }

    async fn get_flashcard(&self, user_id: &str, id: &str) -> Result<Option<Flashcard>, StoreError> {
        self.0.get_flashcard(user_id, id).await
    }

    async fn list_flashcards(
        &self,
        _user_id: &str,
        _document_id: &str,
    ) -> Result<Vec<Flashcard>, StoreError> {
        Err(StoreError::Storage("connection reset".into()))
    }

    async fn update_schedule(
        &self,
        user_id: &str,
        id: &str,
        schedule: &FlashcardSchedule,
        reviewed_at: DateTime<Utc>,
    ) -> Result<Flashcard, StoreError> {
        self.0
            .update_schedule(user_id, id, schedule, reviewed_at)
            .await
    }
}
