//! Process-wide collaborators shared by all requests

use crate::config::{Config, GenerationBackend, RetrievalBackend};
use crate::embedding::{Embedder, HttpEmbedder};
use crate::error::{QaError, Result};
use crate::generation::{Generator, HttpGenerator, LocalGenerator};
use crate::retrieval::{HttpVectorStore, InMemoryVectorStore, VectorStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Bounded pool of permits for blocking-I/O calls
#[derive(Clone)]
pub struct IoPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl IoPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Run `task` while holding one permit
    pub async fn run<T, F>(&self, task: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| QaError::Other(anyhow::anyhow!("io pool closed: {}", e)))?;
        task.await
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Permits not currently held
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Collaborators and limits injected into the pipeline
#[derive(Clone)]
pub struct Context {
    pub embedder: Arc<dyn Embedder>,
    pub store: Arc<dyn VectorStore>,
    pub generator: Arc<dyn Generator>,
    pub io_pool: IoPool,
    pub request_timeout: Duration,
    pub max_batch_size: usize,
}

impl Context {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
        io_pool: IoPool,
    ) -> Self {
        Self {
            embedder,
            store,
            generator,
            io_pool,
            request_timeout: Duration::from_secs(60),
            max_batch_size: 64,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Build every collaborator from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(&config.embedding)?);

        let store: Arc<dyn VectorStore> = match config.retrieval.backend {
            RetrievalBackend::Http => Arc::new(HttpVectorStore::new(&config.retrieval)?),
            RetrievalBackend::Memory => {
                let path = config.retrieval.corpus.as_ref().ok_or_else(|| {
                    QaError::Config("retrieval.corpus is required for the memory backend".into())
                })?;
                Arc::new(InMemoryVectorStore::load(path, config.retrieval.limit)?)
            }
        };

        let generator: Arc<dyn Generator> = match config.generation.backend {
            GenerationBackend::Local => {
                Arc::new(LocalGenerator::new(config.generation.excerpt_chars))
            }
            GenerationBackend::Http => Arc::new(HttpGenerator::new(&config.generation)?),
        };

        tracing::info!(
            "Context ready: embedder={}, store={}, generator={}, io_workers={}",
            embedder.name(),
            store.name(),
            generator.name(),
            config.server.io_workers
        );

        Ok(Self::new(
            embedder,
            store,
            generator,
            IoPool::new(config.server.io_workers),
        )
        .with_request_timeout(Duration::from_secs(config.server.request_timeout_secs))
        .with_max_batch_size(config.server.max_batch_size))
    }
}
