//! Text embedding
//!
//! The embedding model is an external collaborator; this module only defines
//! the capability and its HTTP transport.

mod http;

pub use http::HttpEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Embedding generation trait
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate one vector per input text, in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Identifier used in logs
    fn name(&self) -> &str;
}
