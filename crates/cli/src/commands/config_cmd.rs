//! `neura config` — Configuration management commands.

use std::path::Path;

use clap::Subcommand;
use neura_config::AppConfig;

use super::runtime;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration (API key omitted)
    Show,

    /// Print the config file path
    Path,
}

pub async fn run(
    config_path: Option<&Path>,
    action: ConfigAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path.map_or_else(AppConfig::config_path, Path::to_path_buf);
    match action {
        ConfigAction::Init { force } => init(&path, force),
        ConfigAction::Show => show(config_path),
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn init(path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        println!("⚠️  Config already exists at: {}", path.display());
        println!("   Edit it manually or re-run with --force.");
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", path.display());
    println!();
    println!("📝 Next steps:");
    println!("   1. export GEMINI_API_KEY=...");
    println!("   2. Run: neura ingest notes.txt");
    println!("   3. Run: neura ask <document-id> \"<question>\"");
    Ok(())
}

fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = runtime::load_config(config_path)
        .map_err(|e| format!("Failed to load config: {e}"))?;
    let has_key = config.has_api_key();
    config.api_key = None;

    println!("{}", toml::to_string_pretty(&config)?);
    println!("# api_key: {}", if has_key { "set" } else { "not set" });
    Ok(())
}
