//! Configuration management

use crate::error::{QaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector store configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Generation backend configuration
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind (host:port)
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Deadline for a whole request, streaming included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum concurrent embedding/retrieval calls across all requests
    #[serde(default = "default_io_workers")]
    pub io_workers: usize,

    /// Maximum questions accepted in one request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_secs: default_request_timeout(),
            io_workers: default_io_workers(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

fn default_bind() -> String {
    std::env::var("QASYSTEM_BIND").unwrap_or_else(|_| "127.0.0.1:8000".to_string())
}

fn default_request_timeout() -> u64 {
    60
}

fn default_io_workers() -> usize {
    std::env::var("QASYSTEM_IO_WORKERS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(4)
}

fn default_max_batch_size() -> usize {
    64
}

/// Embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of the embedding service (`POST {url}/encode`)
    #[serde(default = "default_embedding_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_service_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            timeout_secs: default_service_timeout(),
        }
    }
}

fn default_embedding_url() -> String {
    std::env::var("QASYSTEM_EMBEDDING_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// Which vector store implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalBackend {
    /// Remote retrieval service over HTTP
    Http,
    /// In-process store loaded from a corpus file
    Memory,
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_retrieval_backend")]
    pub backend: RetrievalBackend,

    /// Base URL of the retrieval service (`POST {url}/search`)
    #[serde(default = "default_retrieval_url")]
    pub url: String,

    /// Corpus file for the in-memory backend
    #[serde(default)]
    pub corpus: Option<PathBuf>,

    /// Passages retrieved per question
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Request timeout in seconds
    #[serde(default = "default_service_timeout")]
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            backend: default_retrieval_backend(),
            url: default_retrieval_url(),
            corpus: std::env::var("QASYSTEM_CORPUS").ok().map(PathBuf::from),
            limit: default_limit(),
            timeout_secs: default_service_timeout(),
        }
    }
}

fn default_retrieval_backend() -> RetrievalBackend {
    if std::env::var("QASYSTEM_CORPUS").is_ok() {
        RetrievalBackend::Memory
    } else {
        RetrievalBackend::Http
    }
}

fn default_retrieval_url() -> String {
    std::env::var("QASYSTEM_RETRIEVAL_URL").unwrap_or_else(|_| "http://localhost:19530".to_string())
}

fn default_limit() -> usize {
    3
}

/// Which generation backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationBackend {
    /// In-process excerpt generator
    Local,
    /// Remote generation service streaming frames over HTTP
    Http,
}

/// Generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_backend")]
    pub backend: GenerationBackend,

    /// Base URL of the generation service (`POST {url}/llm_ask`)
    #[serde(default = "default_generation_url")]
    pub url: String,

    /// Maximum characters of a passage echoed per slice by the local generator
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,

    /// Connect/response-start timeout in seconds
    #[serde(default = "default_service_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: default_generation_backend(),
            url: default_generation_url(),
            excerpt_chars: default_excerpt_chars(),
            timeout_secs: default_service_timeout(),
        }
    }
}

fn default_generation_backend() -> GenerationBackend {
    if std::env::var("QASYSTEM_LLM_URL").is_ok() {
        GenerationBackend::Http
    } else {
        GenerationBackend::Local
    }
}

fn default_generation_url() -> String {
    std::env::var("QASYSTEM_LLM_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

fn default_excerpt_chars() -> usize {
    128
}

fn default_service_timeout() -> u64 {
    10
}

impl Config {
    /// Load config from default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load config from an explicit path, falling back to defaults when missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to the given path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.server.io_workers == 0 {
            return Err(QaError::Config("server.io_workers must be at least 1".into()));
        }
        if self.retrieval.limit == 0 {
            return Err(QaError::Config("retrieval.limit must be at least 1".into()));
        }
        if self.retrieval.backend == RetrievalBackend::Memory && self.retrieval.corpus.is_none() {
            return Err(QaError::Config(
                "retrieval.corpus is required for the memory backend".into(),
            ));
        }
        Ok(())
    }
}
