//! HTTP client for the embedding service

use super::Embedder;
use crate::config::EmbeddingConfig;
use crate::error::{QaError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct EncodeRequest<'a> {
    items: &'a [String],
}

/// Embedder backed by `POST {url}/encode`
pub struct HttpEmbedder {
    http_client: reqwest::Client,
    url: String,
}

impl HttpEmbedder {
    /// Create from configuration
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            url: format!("{}/encode", config.url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!("Encoding {} texts via {}", texts.len(), self.url);

        let response = self
            .http_client
            .post(&self.url)
            .json(&EncodeRequest { items: texts })
            .send()
            .await
            .map_err(|e| QaError::EmbeddingUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(QaError::EmbeddingUnavailable(format!(
                "embedding service error (HTTP {}): {}",
                status, body
            )));
        }

        let vectors: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(|e| QaError::EmbeddingUnavailable(format!("malformed response: {}", e)))?;

        if vectors.len() != texts.len() {
            return Err(QaError::EmbeddingUnavailable(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        Ok(vectors)
    }

    fn name(&self) -> &str {
        &self.url
    }
}
