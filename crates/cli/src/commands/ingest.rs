//! `neura ingest` — Chunk, embed and store a text file.

use std::path::Path;

use neura_pipeline::IngestService;

use super::runtime;

pub async fn run(
    config_path: Option<&Path>,
    file: &Path,
    name: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = runtime::load_config(config_path)?;
    let text = runtime::read_input(file)?;
    let gemini = runtime::gemini(&config)?;
    let store = runtime::store(&config);

    let filename = name.unwrap_or_else(|| {
        file.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stdin.txt".to_string())
    });

    let service = IngestService::new(
        runtime::chunker(&config, None),
        gemini,
        store.clone(),
        store.clone(),
    )
    .with_chunking(config.chunking.chunk_size, config.chunking.overlap);

    println!("📥 Ingesting {filename}...");
    let report = service.ingest_text(&config.user_id, &filename, &text).await?;

    println!("   ✅ Embedded {} chunk(s), {} tokens", report.chunks, report.tokens);
    println!("   Document:  {}", report.document_id);
    println!("   Store:     {}", store.dir().display());
    println!();
    println!("   Ask about it: neura ask {} \"<question>\"", report.document_id);
    Ok(())
}
