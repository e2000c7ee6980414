//! Neura CLI — the main entry point.
//!
//! Commands:
//! - `tokens`    — Count tokens in a file
//! - `chunk`     — Split a file into token-bounded chunks
//! - `review`    — Apply one SM-2 review to a schedule
//! - `interval`  — Render an interval in days as a label
//! - `ingest`    — Chunk, embed and store a text file
//! - `ask`       — Ask a question about an ingested document
//! - `cards`     — Add, generate, list and review flashcards
//! - `config`    — Create or show the configuration
//! - `tokenizer` — Download tokenizer files (`hub` feature)

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "neura",
    about = "Neura — document chunking, retrieval-augmented chat and spaced repetition",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.neura/config.toml
    #[arg(long, global = true, env = "NEURA_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Count tokens in a file ("-" for stdin)
    Tokens {
        file: PathBuf,

        /// Token encoding (defaults to the configured one)
        #[arg(short, long)]
        encoding: Option<String>,
    },

    /// Split a file ("-" for stdin) into overlapping chunks
    Chunk {
        file: PathBuf,

        /// Maximum tokens per chunk
        #[arg(short, long)]
        size: Option<usize>,

        /// Tokens shared between consecutive chunks
        #[arg(short, long)]
        overlap: Option<usize>,

        /// Token encoding (defaults to the configured one)
        #[arg(short, long)]
        encoding: Option<String>,

        /// Print chunks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply one SM-2 review and print the next schedule
    Review {
        /// Recall quality, 0-5
        #[arg(short, long, allow_negative_numbers = true)]
        quality: i64,

        #[arg(long, default_value_t = 2.5)]
        efactor: f64,

        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        repetitions: i64,

        /// Current interval in days
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        interval: i64,

        /// Print the schedule as JSON
        #[arg(long)]
        json: bool,
    },

    /// Describe an interval in days ("6 days", "2 weeks", ...)
    Interval {
        #[arg(allow_negative_numbers = true)]
        days: i64,
    },

    /// Chunk, embed and store a text file
    Ingest {
        file: PathBuf,

        /// Stored filename (defaults to the file's name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Ask a question about an ingested document
    Ask {
        document_id: String,
        query: String,

        /// Number of chunks to retrieve (1-20)
        #[arg(long)]
        max_chunks: Option<usize>,

        /// Minimum similarity (0-1)
        #[arg(long)]
        threshold: Option<f32>,

        /// Print raw SSE frames instead of text
        #[arg(long)]
        sse: bool,
    },

    /// Manage flashcards
    Cards {
        #[command(subcommand)]
        action: commands::cards::CardsAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: commands::config_cmd::ConfigAction,
    },

    /// Manage tokenizer files
    #[cfg(feature = "hub")]
    Tokenizer {
        #[command(subcommand)]
        action: commands::tokenizer::TokenizerAction,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Tokens { file, encoding } => {
            commands::text::tokens(config, &file, encoding).await?
        }
        Commands::Chunk {
            file,
            size,
            overlap,
            encoding,
            json,
        } => commands::text::chunk(config, &file, size, overlap, encoding, json).await?,
        Commands::Review {
            quality,
            efactor,
            repetitions,
            interval,
            json,
        } => commands::srs::review(config, quality, efactor, repetitions, interval, json).await?,
        Commands::Interval { days } => commands::srs::interval(days).await?,
        Commands::Ingest { file, name } => commands::ingest::run(config, &file, name).await?,
        Commands::Ask {
            document_id,
            query,
            max_chunks,
            threshold,
            sse,
        } => commands::ask::run(config, document_id, query, max_chunks, threshold, sse).await?,
        Commands::Cards { action } => commands::cards::run(config, action).await?,
        Commands::Config { action } => commands::config_cmd::run(config, action).await?,
        #[cfg(feature = "hub")]
        Commands::Tokenizer { action } => commands::tokenizer::run(config, action).await?,
    }

    Ok(())
}
