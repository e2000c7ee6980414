//! `neura tokenizer` — Download `tokenizer.json` files from the Hugging Face Hub.

use std::path::Path;

use clap::Subcommand;
use neura_chunker::hub;

use super::runtime;

#[derive(Subcommand)]
pub enum TokenizerAction {
    /// Fetch the tokenizer for an encoding into the tokenizer directory
    Fetch {
        /// Encoding name, e.g. cl100k_base
        encoding: String,

        /// Hub repository to fetch from (defaults per encoding)
        #[arg(long)]
        repo: Option<String>,
    },
}

pub async fn run(
    config_path: Option<&Path>,
    action: TokenizerAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = runtime::load_config(config_path)?;
    let dir = config.chunking.tokenizer_dir();

    match action {
        TokenizerAction::Fetch { encoding, repo } => {
            println!("⬇️  Fetching tokenizer for {encoding}...");
            let path = tokio::task::spawn_blocking(move || {
                hub::fetch_tokenizer(&encoding, repo.as_deref(), &dir)
            })
            .await??;
            println!("   ✅ Saved {}", path.display());
        }
    }
    Ok(())
}
