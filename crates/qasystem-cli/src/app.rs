//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use qasystem_core::Topic;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "qasystem")]
#[command(
    author,
    version,
    about = "Streaming question answering over a topic-partitioned news corpus"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, env = "QASYSTEM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Answer a request and print the frame stream
    Ask(AskArgs),

    /// Build an in-memory corpus from a news CSV
    Index(IndexArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind (host:port), overrides server.bind
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args)]
pub struct AskArgs {
    /// Request JSON file (`{"questions": [...]}`); `-` or omitted reads stdin
    pub input: Option<PathBuf>,

    /// Ask a single question instead of reading a request
    #[arg(short, long, conflicts_with = "input", requires = "topic")]
    pub question: Option<String>,

    /// Topic of --question
    #[arg(short, long)]
    pub topic: Option<Topic>,
}

#[derive(Args)]
pub struct IndexArgs {
    /// News CSV with `Article` and `NewsType` columns
    pub csv: PathBuf,

    /// Where to write the corpus JSON
    #[arg(short, long)]
    pub output: PathBuf,

    /// Articles per embedding request
    #[arg(long, default_value_t = qasystem_core::index::DEFAULT_EMBED_BATCH)]
    pub batch_size: usize,

    /// Characters kept per article
    #[arg(long, default_value_t = qasystem_core::index::DEFAULT_MAX_ARTICLE_CHARS)]
    pub max_chars: usize,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Write the effective configuration to the config path
    #[arg(long)]
    pub save: bool,
}
