//! fkg - Federated Knowledge Graph command line
//!
//! Operators use it to:
//! - export an authority's graph as a PKG and import PKGs from others
//! - validate, sign and verify PKGs
//! - pull PKGs from configured remote authorities
//! - compute content-addressed identifiers and hashes

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod commands;
mod config;
mod output;

use app::App;
use commands::{federation, graph, ids, ingest, pkg};
use output::OutputFormat;

/// fkg CLI application
#[derive(Parser)]
#[command(name = "fkg")]
#[command(about = "Federated Knowledge Graph - exchange graph packages between authorities", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FKG_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (overrides the configured level)
    #[arg(long, env = "FKG_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    log_json: bool,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Export an authority's records as a PKG directory
    Export(pkg::ExportArgs),

    /// Import a PKG directory or zip into the local graph
    Import(pkg::ImportArgs),

    /// Check a PKG without importing it
    Validate(pkg::PathArgs),

    /// Write the placeholder signature for a PKG
    Sign(pkg::SignArgs),

    /// Check a PKG's signature
    Verify(pkg::VerifyArgs),

    /// Pull PKGs from remote authorities
    Pull(federation::PullArgs),

    /// List configured remote authorities
    Remotes,

    /// Compute the content-addressed id of a record
    MakeId(ids::MakeIdArgs),

    /// Compute the content hash of a record
    Hash(ids::HashArgs),

    /// Load entities and edges from a JSONL file as the local authority
    Ingest(ingest::IngestArgs),

    /// Summarize the local graph
    Stats,

    /// Print the instance identity and configuration
    Whoami,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = config::load(cli.config.as_deref())?;

    // Initialize tracing
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| settings.logging.level.clone());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    if cli.log_json || settings.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match cli.command {
        Commands::MakeId(args) => ids::make_id(args, cli.output),
        Commands::Hash(args) => ids::hash(args, cli.output),
        Commands::Remotes => federation::remotes(&settings, cli.output),
        Commands::Export(args) => pkg::export(&App::open(settings)?, args, cli.output).await,
        Commands::Import(args) => pkg::import(&App::open(settings)?, args, cli.output).await,
        Commands::Validate(args) => pkg::validate(&App::open(settings)?, args, cli.output),
        Commands::Sign(args) => pkg::sign(&App::open(settings)?, args, cli.output),
        Commands::Verify(args) => pkg::verify(&App::open(settings)?, args, cli.output),
        Commands::Pull(args) => federation::pull(&App::open(settings)?, args, cli.output).await,
        Commands::Ingest(args) => ingest::ingest(&App::open(settings)?, args, cli.output).await,
        Commands::Stats => graph::stats(&App::open(settings)?, cli.output).await,
        Commands::Whoami => graph::whoami(&App::open(settings)?, cli.output),
    }
}
