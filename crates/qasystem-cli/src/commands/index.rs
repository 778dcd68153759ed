//! Index command

use crate::app::IndexArgs;
use anyhow::Result;
use qasystem_core::index::{build_corpus, read_articles, IndexOptions};
use qasystem_core::{Config, HttpEmbedder, InMemoryVectorStore};

pub async fn run(args: IndexArgs, config: &Config) -> Result<()> {
    let options = IndexOptions {
        max_article_chars: args.max_chars,
        batch_size: args.batch_size,
        ..IndexOptions::default()
    };

    let articles = read_articles(&args.csv, &options)?;
    println!("Read {} articles from {}", articles.len(), args.csv.display());

    let embedder = HttpEmbedder::new(&config.embedding)?;
    let records = build_corpus(
        articles,
        &embedder,
        &options,
        Some(|done: usize, total: usize| eprint!("\rEmbedding: {}/{}   ", done, total)),
    )
    .await?;
    eprintln!();

    InMemoryVectorStore::save_corpus(&args.output, &records)?;
    println!("Wrote {} records to {}", records.len(), args.output.display());
    Ok(())
}
