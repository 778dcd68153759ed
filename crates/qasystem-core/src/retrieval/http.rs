//! HTTP client for the retrieval service

use super::VectorStore;
use crate::config::RetrievalConfig;
use crate::error::{QaError, Result};
use crate::models::{RetrievalResult, Topic};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct SearchRequest<'a> {
    topic: &'a str,
    embeddings: &'a [Vec<f32>],
    limit: usize,
}

/// Vector store reached through `POST {url}/search`
pub struct HttpVectorStore {
    http_client: reqwest::Client,
    url: String,
    limit: usize,
}

impl HttpVectorStore {
    /// Create from configuration
    pub fn new(config: &RetrievalConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            url: format!("{}/search", config.url.trim_end_matches('/')),
            limit: config.limit,
        })
    }
}

#[async_trait]
impl VectorStore for HttpVectorStore {
    async fn search(&self, topic: Topic, embeddings: &[Vec<f32>]) -> Result<Vec<RetrievalResult>> {
        let request = SearchRequest {
            topic: topic.as_str(),
            embeddings,
            limit: self.limit,
        };

        let response = self
            .http_client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| QaError::RetrievalUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(QaError::RetrievalUnavailable(format!(
                "retrieval service error (HTTP {}): {}",
                status, body
            )));
        }

        response
            .json::<Vec<RetrievalResult>>()
            .await
            .map_err(|e| QaError::RetrievalUnavailable(format!("malformed response: {}", e)))
    }

    fn name(&self) -> &str {
        &self.url
    }
}
