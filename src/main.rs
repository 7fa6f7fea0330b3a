mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use glossa::config::GlossaConfig;

#[derive(Parser)]
#[command(
    name = "glossa",
    version,
    about = "Adaptive vocabulary engine: learn words from what you read"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the dictionary entry for a word
    Lookup { word: String },
    /// Segment text, asking the AI about unknown words and learning them
    Segment {
        /// Text to segment (reads stdin when omitted)
        text: Option<String>,
        /// Use only the local dictionary; never calls the AI
        #[arg(long)]
        offline: bool,
        /// Print segments as JSON
        #[arg(long)]
        json: bool,
    },
    /// Annotate text from the local dictionary alone
    Annotate {
        /// Text to annotate (reads stdin when omitted)
        text: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List words due for review
    Due {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show dictionary statistics
    Stats,
    /// Review due words interactively
    Review {
        /// Cards per batch (overrides review.batch_size)
        #[arg(long)]
        limit: Option<usize>,
        /// Shuffle cards within each batch
        #[arg(long)]
        shuffle: bool,
    },
    /// Import words from a JSON export
    Import { file: PathBuf },
    /// Export the dictionary as JSON to stdout
    Export,
    /// Delete every word (asks for confirmation)
    Reset,
    /// Check database health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = GlossaConfig::load()?;

    // Log to stderr so stdout stays clean for command output.
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Lookup { word } => cli::lookup::lookup(&config, &word)?,
        Command::Segment {
            text,
            offline,
            json,
        } => {
            let text = cli::read_text(text)?;
            cli::segment::segment(&config, &text, offline, json).await?;
        }
        Command::Annotate { text, json } => {
            let text = cli::read_text(text)?;
            cli::segment::annotate(&config, &text, json)?;
        }
        Command::Due { limit } => cli::due::due(&config, limit)?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Review { limit, shuffle } => cli::review::review(&config, limit, shuffle)?,
        Command::Import { file } => cli::import::import(&config, &file)?,
        Command::Export => cli::export::export(&config)?,
        Command::Reset => cli::reset::reset(&config)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
