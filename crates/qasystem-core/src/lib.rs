//! qasystem Core Library
//!
//! Answers batches of questions from a topic-partitioned vector store and
//! streams the answers back round by round.
//!
//! # Features
//! - One batched retrieval call per topic, scattered back to question order
//! - Deterministic prompt assembly
//! - Pull-based token sources, local or behind an HTTP generation service
//! - Lockstep multiplexing of all answers into `event:`/`id:`/`data:` frames

pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;
pub mod stream;

pub use config::{Config, GenerationBackend, RetrievalBackend};
pub use context::{Context, IoPool};
pub use embedding::{Embedder, HttpEmbedder};
pub use error::{Error, QaError, Result};
pub use generation::{Generator, HttpGenerator, LocalGenerator, Slice, TokenSource};
pub use models::{AskRequest, Question, RetrievalResult, RetrievedPassage, Topic};
pub use pipeline::{ask, ask_rounds, FrameStream, RoundStream};
pub use prompt::Prompt;
pub use retrieval::{HttpVectorStore, InMemoryVectorStore, VectorStore};
pub use stream::{Multiplexer, Round};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "qasystem";
