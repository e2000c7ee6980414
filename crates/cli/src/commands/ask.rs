//! `neura ask` — Stream a grounded answer about an ingested document.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use neura_pipeline::{ChatEvent, ChatRequest, ChatService};

use super::runtime;

pub async fn run(
    config_path: Option<&Path>,
    document_id: String,
    query: String,
    max_chunks: Option<usize>,
    threshold: Option<f32>,
    sse: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = runtime::load_config(config_path)?;
    let gemini = runtime::gemini(&config)?;
    let store = runtime::store(&config);
    let retrieval = &config.retrieval;

    let service = ChatService::new(
        Arc::new(runtime::chunker(&config, None)),
        gemini.clone(),
        gemini,
        store.clone(),
        store,
    )
    .with_budgets(retrieval.max_context_tokens, retrieval.max_history_tokens)
    .with_retrieval(retrieval.max_chunks, retrieval.similarity_threshold);

    let mut request = ChatRequest::new(document_id, query);
    request.max_chunks = max_chunks;
    request.similarity_threshold = threshold;

    let mut events = service.chat(&config.user_id, request).await?;
    let mut stdout = std::io::stdout();

    while let Some(event) = events.recv().await {
        if sse {
            write!(stdout, "{}", event.to_sse()?)?;
            stdout.flush()?;
            continue;
        }

        match event {
            ChatEvent::Provenance { chunks } => {
                let indices: Vec<String> =
                    chunks.iter().map(|c| c.chunk_index.to_string()).collect();
                eprintln!("📚 Using chunk(s) {}", indices.join(", "));
                eprintln!();
            }
            ChatEvent::Token { token } => {
                write!(stdout, "{token}")?;
                stdout.flush()?;
            }
            ChatEvent::Done { .. } => println!(),
            ChatEvent::Error { error } => {
                println!();
                return Err(format!("Generation failed: {error}").into());
            }
        }
    }
    Ok(())
}
