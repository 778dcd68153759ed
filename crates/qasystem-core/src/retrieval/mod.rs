//! Passage retrieval
//!
//! Provides:
//! - Topic partitioning and scatter-back of a question batch
//! - The `VectorStore` capability with HTTP and in-memory implementations
//! - Batched retrieval: one search per distinct topic, issued concurrently

mod http;
mod memory;
mod partition;

pub use http::HttpVectorStore;
pub use memory::{inner_product, CorpusRecord, InMemoryVectorStore};
pub use partition::{partition, scatter, TopicGroup};

use crate::context::IoPool;
use crate::error::{QaError, Result};
use crate::models::{Question, RetrievalResult, Topic};
use async_trait::async_trait;

/// Nearest-neighbour search over a topic-filtered vector store
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Search with every embedding, restricted to `topic`.
    ///
    /// Returns one result per embedding, in the same order.
    async fn search(&self, topic: Topic, embeddings: &[Vec<f32>]) -> Result<Vec<RetrievalResult>>;

    /// Identifier used in logs
    fn name(&self) -> &str;
}

/// Retrieve passages for every question with one store call per topic.
///
/// Calls for different topics run concurrently, each holding an I/O permit.
/// The first failing call aborts the rest.
pub async fn retrieve(
    store: &dyn VectorStore,
    pool: &IoPool,
    questions: &[Question],
    embeddings: Vec<Vec<f32>>,
) -> Result<Vec<RetrievalResult>> {
    let groups = partition(questions, embeddings)?;

    tracing::debug!(
        "Retrieving {} questions across {} topics from {}",
        questions.len(),
        groups.len(),
        store.name()
    );

    let calls = groups.into_values().map(|group| async move {
        let TopicGroup {
            topic,
            member_indices,
            member_embeddings,
        } = group;
        let results = pool.run(store.search(topic, &member_embeddings)).await?;
        if results.len() != member_indices.len() {
            return Err(QaError::RetrievalUnavailable(format!(
                "topic {}: requested {} results, store returned {}",
                topic,
                member_indices.len(),
                results.len()
            )));
        }
        tracing::debug!("Topic {} returned {} results", topic, results.len());
        Ok((member_indices, results))
    });

    let batches = futures::future::try_join_all(calls).await?;
    scatter(questions.len(), batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PassageEntity, RetrievedPassage};
    use std::sync::Mutex;

    /// Records calls and answers each embedding with a passage echoing its first component
    struct RecordingStore {
        calls: Mutex<Vec<(Topic, usize)>>,
        short: Option<Topic>,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                short: None,
            }
        }
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        async fn search(
            &self,
            topic: Topic,
            embeddings: &[Vec<f32>],
        ) -> Result<Vec<RetrievalResult>> {
            self.calls.lock().unwrap().push((topic, embeddings.len()));
            let mut results: Vec<RetrievalResult> = embeddings
                .iter()
                .map(|e| RetrievalResult {
                    items: vec![RetrievedPassage {
                        id: e[0] as i64,
                        distance: 1.0,
                        entity: PassageEntity {
                            topic,
                            text: format!("{} passage {}", topic, e[0]),
                        },
                    }],
                })
                .collect();
            if self.short == Some(topic) {
                results.pop();
            }
            Ok(results)
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn batch() -> (Vec<Question>, Vec<Vec<f32>>) {
        let questions = vec![
            Question::new("q0", Topic::Sports),
            Question::new("q1", Topic::Business),
            Question::new("q2", Topic::Sports),
        ];
        let embeddings = vec![vec![0.0], vec![1.0], vec![2.0]];
        (questions, embeddings)
    }

    #[tokio::test]
    async fn test_one_call_per_topic_and_scatter() {
        let store = RecordingStore::new();
        let pool = IoPool::new(2);
        let (questions, embeddings) = batch();

        let results = retrieve(&store, &pool, &questions, embeddings).await.unwrap();

        let mut calls = store.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec![(Topic::Business, 1), (Topic::Sports, 2)]);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].items[0].text(), "sports passage 0");
        assert_eq!(results[1].items[0].text(), "business passage 1");
        assert_eq!(results[2].items[0].text(), "sports passage 2");
    }

    #[tokio::test]
    async fn test_short_result_fails_whole_batch() {
        let mut store = RecordingStore::new();
        store.short = Some(Topic::Sports);
        let pool = IoPool::new(1);
        let (questions, embeddings) = batch();

        let err = retrieve(&store, &pool, &questions, embeddings)
            .await
            .unwrap_err();
        assert!(matches!(err, QaError::RetrievalUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_calls() {
        let store = RecordingStore::new();
        let pool = IoPool::new(1);

        let results = retrieve(&store, &pool, &[], Vec::new()).await.unwrap();
        assert!(results.is_empty());
        assert!(store.calls.lock().unwrap().is_empty());
    }
}
