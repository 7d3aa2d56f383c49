//! lexrag CLI entry point

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use lexrag::{
    commands::{
        cmd_ask, cmd_embed, cmd_ingest, cmd_init, cmd_query, cmd_status, print_answer,
        print_embedding, print_ingest_report, print_init, print_query_results, print_status,
        InitOptions, QueryOptions,
    },
    config::Config,
    progress::LogWriterFactory,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "lexrag")]
#[command(version, about = "Retrieval core for a legal assistant", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and create the data directory
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Chunk, embed and snapshot every supported file in a directory
    Ingest {
        /// Directory of legal texts (not searched recursively)
        dir: PathBuf,

        /// Disable the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Retrieve the most relevant chunks for a query
    Query {
        /// Query text
        query: String,

        /// Number of results
        #[arg(short, long)]
        k: Option<usize>,

        /// Search with the query as typed
        #[arg(long)]
        no_expand: bool,
    },

    /// Embed a single text with the configured provider
    Embed {
        /// Text to embed
        text: String,
    },

    /// Answer a question using retrieved legal context
    Ask {
        /// Question text
        question: String,

        /// Number of context chunks
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Show configuration, vector store and service status
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    // Neither init nor completions needs an existing config
    match cli.command {
        Commands::Init { force } => {
            let options = InitOptions::from_config_arg(cli.config.as_deref(), force);
            let info = cmd_init(options)
                .await
                .context("Failed to initialize lexrag")?;
            return emit(cli.json, &info, print_init);
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "lexrag", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Ingest { dir, no_progress } => {
            let show_progress = !no_progress && !cli.json;
            let report = cmd_ingest(&config, &dir, show_progress)
                .await
                .with_context(|| format!("Failed to ingest {}", dir.display()))?;
            emit(cli.json, &report, print_ingest_report)?;
        }

        Commands::Query { query, k, no_expand } => {
            let result = cmd_query(&config, &query, QueryOptions { k, no_expand })
                .await
                .context("Query failed")?;
            emit(cli.json, &result, print_query_results)?;
        }

        Commands::Embed { text } => {
            let result = cmd_embed(&config, &text)
                .await
                .context("Embedding failed")?;
            emit(cli.json, &result, print_embedding)?;
        }

        Commands::Ask { question, k } => {
            let result = cmd_ask(&config, &question, k)
                .await
                .context("Failed to answer question")?;
            emit(cli.json, &result, print_answer)?;
        }

        Commands::Status => {
            let status = cmd_status(&config).await.context("Failed to get status")?;
            emit(cli.json, &status, print_status)?;
        }

        Commands::Init { .. } | Commands::Completions { .. } => {}
    }

    Ok(())
}

fn emit<T: Serialize>(json: bool, value: &T, print: fn(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print(value);
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) if path.is_dir() => Config::load_from(Some(path.to_path_buf()))
            .with_context(|| format!("Failed to load config from {}", path.display())),
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Config::load_from(None).context("Failed to load config"),
    }
}
