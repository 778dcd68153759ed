//! qasystem CLI
//!
//! Streaming question answering over a topic-partitioned news corpus.

use anyhow::Result;
use clap::Parser;
use qasystem_core::error::exit_codes;
use qasystem_core::{Config, QaError};

mod app;
mod commands;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<QaError>()
            .map(QaError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Serve(args) => commands::serve::run(args, config).await,
        Commands::Ask(args) => commands::ask::run(args, &config).await,
        Commands::Index(args) => commands::index::run(args, &config).await,
        Commands::Config(args) => commands::config::run(args, &config, cli.config.as_deref()),
    }
}
