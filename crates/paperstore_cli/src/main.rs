//! `paperstore` command-line entry point.
//!
//! # Responsibility
//! - Expose document lookup and import for local operation and smoke checks.
//! - Resolve store configuration from the environment (and `.env`) once.

use clap::{Parser, Subcommand};
use paperstore_core::{
    core_version, default_log_level, init_logging, ping, with_collection, DocumentService,
    StoreConfig, UpsertOutcome,
};
use std::error::Error;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "paperstore")]
#[command(about = "Paper document store CLI")]
struct Cli {
    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute directory for rolling log files; logging is off without it
    #[arg(long, global = true)]
    log_dir: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print core ping and version
    Ping,
    /// Print one document as JSON
    Get {
        /// Document id
        id: String,
    },
    /// Insert or update one document from a JSON file (`-` reads stdin)
    Put {
        /// Path to the JSON document
        path: PathBuf,
    },
    /// Print the number of stored documents
    Count,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    match cli.command {
        Commands::Ping => {
            println!("paperstore_core ping={}", ping());
            println!("paperstore_core version={}", core_version());
        }
        Commands::Get { id } => {
            let config = load_config()?;
            let document = with_collection(&config, |collection| {
                DocumentService::new(collection).get_document(&id)
            })?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        Commands::Put { path } => {
            let config = load_config()?;
            let text = read_input(&path)?;
            let outcome = with_collection(&config, |collection| {
                DocumentService::new(collection).import_json(&text)
            })?;
            match outcome {
                UpsertOutcome::Inserted(id) => println!("inserted {id}"),
                UpsertOutcome::Updated => println!("updated"),
            }
        }
        Commands::Count => {
            let config = load_config()?;
            let count = with_collection(&config, |collection| collection.count_documents())?;
            println!("{count}");
        }
    }

    Ok(())
}

fn load_config() -> Result<StoreConfig, Box<dyn Error>> {
    allow_missing_env_file(dotenvy::dotenv())?;
    Ok(StoreConfig::from_env()?)
}

/// A missing `.env` file is fine; the process environment may already be set.
/// Unreadable or malformed files are reported.
fn allow_missing_env_file<T>(result: dotenvy::Result<T>) -> dotenvy::Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

fn read_input(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
}
