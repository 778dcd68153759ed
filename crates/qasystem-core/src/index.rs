//! Corpus building
//!
//! Reads a news CSV (`Article`, `NewsType` columns), embeds the articles in
//! batches and produces records for the in-memory vector store.

use crate::embedding::Embedder;
use crate::error::{QaError, Result};
use crate::models::Topic;
use crate::retrieval::CorpusRecord;
use csv::ReaderBuilder;
use std::path::Path;

/// Longest article text kept, in characters
pub const DEFAULT_MAX_ARTICLE_CHARS: usize = 20480;

/// Articles embedded per request
pub const DEFAULT_EMBED_BATCH: usize = 64;

/// Indexing options
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub max_article_chars: usize,
    pub batch_size: usize,
    pub text_column: String,
    pub topic_column: String,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_article_chars: DEFAULT_MAX_ARTICLE_CHARS,
            batch_size: DEFAULT_EMBED_BATCH,
            text_column: "Article".to_string(),
            topic_column: "NewsType".to_string(),
        }
    }
}

/// An article ready to embed
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub topic: Topic,
    pub text: String,
}

/// Read articles from CSV, truncating and trimming text.
///
/// Bytes are decoded lossily since news dumps are often not UTF-8. Rows
/// with an unknown topic or empty text are skipped.
pub fn read_articles(path: &Path, options: &IndexOptions) -> Result<Vec<Article>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.byte_headers()?.clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| String::from_utf8_lossy(h).trim() == name)
            .ok_or_else(|| QaError::InvalidInput(format!("CSV has no `{}` column", name)))
    };
    let text_idx = column(&options.text_column)?;
    let topic_idx = column(&options.topic_column)?;

    let mut articles = Vec::new();
    let mut skipped = 0usize;
    for (row, record) in reader.byte_records().enumerate() {
        let record = record?;
        let topic = record
            .get(topic_idx)
            .map(|t| String::from_utf8_lossy(t).parse::<Topic>());
        let text = record
            .get(text_idx)
            .map(|t| String::from_utf8_lossy(t).into_owned())
            .unwrap_or_default();

        let truncated: String = text.chars().take(options.max_article_chars).collect();
        let truncated = truncated.trim();

        match topic {
            Some(Ok(topic)) if !truncated.is_empty() => articles.push(Article {
                topic,
                text: truncated.to_string(),
            }),
            _ => {
                tracing::debug!("Skipping CSV row {}", row + 1);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} rows without a known topic or text", skipped);
    }
    Ok(articles)
}

/// Scale a vector to unit length; zero vectors are left alone
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Embed articles in batches and assign sequential ids starting at 1
pub async fn build_corpus<F>(
    articles: Vec<Article>,
    embedder: &dyn Embedder,
    options: &IndexOptions,
    progress: Option<F>,
) -> Result<Vec<CorpusRecord>>
where
    F: Fn(usize, usize),
{
    let total = articles.len();
    let batch_size = options.batch_size.max(1);
    let mut records = Vec::with_capacity(total);

    for batch in articles.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|a| a.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        if embeddings.len() != batch.len() {
            return Err(QaError::EmbeddingUnavailable(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                embeddings.len()
            )));
        }

        for (article, mut embedding) in batch.iter().zip(embeddings) {
            normalize(&mut embedding);
            records.push(CorpusRecord {
                id: records.len() as i64 + 1,
                topic: article.topic,
                text: article.text.clone(),
                embedding,
            });
        }

        if let Some(ref callback) = progress {
            callback(records.len(), total);
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct LengthEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.len() as f32, 0.0]).collect())
        }

        fn name(&self) -> &str {
            "length"
        }
    }

    #[test]
    fn test_read_articles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Articles.csv");
        std::fs::write(
            &path,
            "Article,Date,Heading,NewsType\n\
             \"  Rates rose, again.  \",1/1/2015,Rates,business\n\
             \"Team wins\",1/2/2015,Win,sports\n\
             \"Rain\",1/3/2015,Weather,weather\n\
             \"   \",1/4/2015,Blank,sports\n",
        )
        .unwrap();

        let options = IndexOptions {
            max_article_chars: 5,
            ..IndexOptions::default()
        };
        let articles = read_articles(&path, &options).unwrap();
        assert_eq!(
            articles,
            vec![
                Article {
                    topic: Topic::Business,
                    text: "Rat".to_string()
                },
                Article {
                    topic: Topic::Sports,
                    text: "Team".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "Text,Kind\nx,sports\n").unwrap();
        assert!(read_articles(&path, &IndexOptions::default()).is_err());
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_build_corpus_batches() {
        let embedder = LengthEmbedder {
            calls: AtomicUsize::new(0),
        };
        let articles: Vec<Article> = (0..5)
            .map(|i| Article {
                topic: Topic::Sports,
                text: format!("article {}", i),
            })
            .collect();
        let options = IndexOptions {
            batch_size: 2,
            ..IndexOptions::default()
        };

        let seen = std::cell::Cell::new(0);
        let records = build_corpus(
            articles,
            &embedder,
            &options,
            Some(|done: usize, _total: usize| seen.set(done)),
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
        assert_eq!(seen.get(), 5);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[4].id, 5);
        assert!((records[0].embedding[0] - 1.0).abs() < 1e-6);
    }
}
