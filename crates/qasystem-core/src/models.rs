//! Request and retrieval data types

use crate::error::{QaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse category used to partition retrieval and filter the vector store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Topic {
    #[serde(rename = "business")]
    Business,
    #[serde(rename = "sports")]
    Sports,
}

impl Topic {
    /// Wire and filter value for this topic
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Business => "business",
            Topic::Sports => "sports",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = QaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "business" => Ok(Topic::Business),
            "sports" | "sport" => Ok(Topic::Sports),
            other => Err(QaError::InvalidInput(format!("unknown topic: {}", other))),
        }
    }
}

/// A single question in a batch. Its position in the batch is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub topic: Topic,
}

impl Question {
    pub fn new(question: impl Into<String>, topic: Topic) -> Self {
        Self {
            question: question.into(),
            topic,
        }
    }
}

/// Top-level request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskRequest {
    pub questions: Vec<Question>,
}

impl AskRequest {
    /// Reject malformed batches before any retrieval or generation work starts
    pub fn validate(&self, max_batch_size: usize) -> Result<()> {
        if self.questions.len() > max_batch_size {
            return Err(QaError::InvalidInput(format!(
                "batch of {} questions exceeds limit of {}",
                self.questions.len(),
                max_batch_size
            )));
        }
        if let Some(pos) = self
            .questions
            .iter()
            .position(|q| q.question.trim().is_empty())
        {
            return Err(QaError::InvalidInput(format!(
                "question {} has empty text",
                pos
            )));
        }
        Ok(())
    }
}

/// Stored fields of a vector-store hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassageEntity {
    pub topic: Topic,
    pub text: String,
}

/// One vector-store hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub id: i64,
    /// Relevance score as reported by the store (inner product, higher is closer)
    pub distance: f32,
    pub entity: PassageEntity,
}

impl RetrievedPassage {
    pub fn text(&self) -> &str {
        &self.entity.text
    }

    pub fn topic(&self) -> Topic {
        self.entity.topic
    }
}

/// Ordered passages retrieved for one question
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub items: Vec<RetrievedPassage>,
}

impl RetrievalResult {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
