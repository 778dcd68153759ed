//! In-process vector store over a corpus file
//!
//! Scores by inner product, which equals cosine similarity for the
//! normalized vectors the indexer stores.

use super::VectorStore;
use crate::error::{QaError, Result};
use crate::models::{PassageEntity, RetrievalResult, RetrievedPassage, Topic};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// One indexed article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub id: i64,
    pub topic: Topic,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Brute-force store holding the whole corpus in memory
pub struct InMemoryVectorStore {
    records: Arc<Vec<CorpusRecord>>,
    dimensions: Option<usize>,
    limit: usize,
    name: String,
}

impl InMemoryVectorStore {
    pub fn new(records: Vec<CorpusRecord>, limit: usize) -> Self {
        Self {
            name: format!("memory({} records)", records.len()),
            dimensions: records.first().map(|r| r.embedding.len()),
            records: Arc::new(records),
            limit,
        }
    }

    /// Embedding length shared by every record; `None` for an empty corpus
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Load a corpus written by [`InMemoryVectorStore::save_corpus`]
    pub fn load(path: &Path, limit: usize) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            QaError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read corpus {:?}: {}", path, e),
            ))
        })?;
        let records: Vec<CorpusRecord> = serde_json::from_str(&content)?;
        if let Some(first) = records.first() {
            let expected = first.embedding.len();
            if let Some(bad) = records.iter().find(|r| r.embedding.len() != expected) {
                return Err(QaError::RetrievalUnavailable(format!(
                    "corpus record {} has {} dimensions, expected {}",
                    bad.id,
                    bad.embedding.len(),
                    expected
                )));
            }
        }
        tracing::info!("Loaded {} corpus records from {:?}", records.len(), path);
        Ok(Self::new(records, limit))
    }

    /// Write records as a JSON corpus file
    pub fn save_corpus(path: &Path, records: &[CorpusRecord]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string(records)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Inner product of two vectors; 0.0 on dimension mismatch
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn top_hits(
    records: &[CorpusRecord],
    topic: Topic,
    query: &[f32],
    limit: usize,
) -> RetrievalResult {
    let mut scored: Vec<(f32, &CorpusRecord)> = records
        .iter()
        .filter(|r| r.topic == topic)
        .map(|r| (inner_product(query, &r.embedding), r))
        .collect();

    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.id.cmp(&b.1.id))
    });

    let items = scored
        .into_iter()
        .take(limit)
        .map(|(score, record)| RetrievedPassage {
            id: record.id,
            distance: score,
            entity: PassageEntity {
                topic: record.topic,
                text: record.text.clone(),
            },
        })
        .collect();

    RetrievalResult { items }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn search(&self, topic: Topic, embeddings: &[Vec<f32>]) -> Result<Vec<RetrievalResult>> {
        if let Some(expected) = self.dimensions {
            if let Some(query) = embeddings.iter().find(|q| q.len() != expected) {
                return Err(QaError::RetrievalUnavailable(format!(
                    "query has {} dimensions but the corpus has {}",
                    query.len(),
                    expected
                )));
            }
        }

        let records = Arc::clone(&self.records);
        let queries = embeddings.to_vec();
        let limit = self.limit;

        tokio::task::spawn_blocking(move || {
            queries
                .iter()
                .map(|query| top_hits(&records, topic, query, limit))
                .collect()
        })
        .await
        .map_err(|e| QaError::RetrievalUnavailable(format!("search task join error: {}", e)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
