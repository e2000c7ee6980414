//! `neura tokens` / `neura chunk` — Token counting and chunking.

use std::path::Path;

use super::runtime;

pub async fn tokens(
    config_path: Option<&Path>,
    file: &Path,
    encoding: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = runtime::load_config(config_path)?;
    let text = runtime::read_input(file)?;
    let chunker = runtime::chunker(&config, encoding);

    println!("{}", chunker.count_tokens(&text));
    Ok(())
}

pub async fn chunk(
    config_path: Option<&Path>,
    file: &Path,
    size: Option<usize>,
    overlap: Option<usize>,
    encoding: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = runtime::load_config(config_path)?;
    let text = runtime::read_input(file)?;
    let chunker = runtime::chunker(&config, encoding);

    let size = size.unwrap_or(config.chunking.chunk_size);
    let overlap = overlap.unwrap_or(config.chunking.overlap);
    let chunks = chunker.chunk(&text, size, overlap)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }

    println!(
        "📄 {} chunk(s) · size {size} · overlap {overlap} · encoding {}",
        chunks.len(),
        chunker.encoding()
    );
    for chunk in &chunks {
        println!();
        println!(
            "── chunk {} ({} tokens) ──",
            chunk.index,
            chunker.count_tokens(&chunk.text)
        );
        println!("{}", chunk.text);
    }
    Ok(())
}
