//! # threadlog-cli
//!
//! Command-line interface for Threadlog.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use threadlog_core::Config;

mod commands;
mod output;

/// Application context containing shared state.
pub struct AppContext {
    pub config: Config,
}

/// Threadlog - read a conversation's full action log
#[derive(Parser)]
#[command(name = "threadlog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a single page of actions
    Page {
        /// Thread ID
        thread: String,
        /// Only actions at or before this timestamp (ms since epoch)
        #[arg(short, long, value_name = "MS")]
        before: Option<i64>,
        /// Maximum actions to fetch (defaults to history.page_size)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Print one JSON object per line
        #[arg(long)]
        json: bool,
    },
    /// Stream a thread's full history, newest first
    History {
        /// Thread ID
        thread: String,
        /// Stop after this many actions
        #[arg(short, long)]
        max: Option<usize>,
        /// Print one JSON object per line
        #[arg(long)]
        json: bool,
    },
    /// Stream an exported action list through the pager
    Replay {
        /// JSON file holding an array of actions or raw server nodes
        file: PathBuf,
        /// Actions per page (defaults to history.page_size)
        #[arg(short, long)]
        page_size: Option<usize>,
        /// Print one JSON object per line
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Check the configuration for errors
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for actions
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    let ctx = Arc::new(AppContext { config });

    match cli.command {
        Commands::Page {
            thread,
            before,
            limit,
            json,
        } => {
            commands::page::run(&thread, before, limit, json, &ctx).await?;
        }
        Commands::History { thread, max, json } => {
            commands::history::run(&thread, max, json, &ctx).await?;
        }
        Commands::Replay { file, page_size, json } => {
            commands::replay::run(&file, page_size, json, &ctx).await?;
        }
        Commands::Config { action } => {
            commands::config::handle(action, &ctx)?;
        }
        Commands::Version => {
            println!("threadlog {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
