//! Answer generation
//!
//! A generator turns prompts into token sources, one per prompt. Each
//! source is pulled one slice at a time by the stream multiplexer.

mod local;
mod remote;

pub use local::{header_line, parse_prompt, LocalGenerator, ParsedPrompt, UNKNOWN_QUESTION_ANSWER};
pub use remote::HttpGenerator;

use crate::error::Result;
use crate::prompt::Prompt;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One incremental fragment of an answer.
///
/// On the wire a text fragment is a JSON string and a fragment list is a
/// JSON array. The empty array doubles as the placeholder for a finished
/// question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Slice {
    Text(String),
    Parts(Vec<String>),
}

impl Slice {
    /// Placeholder recorded for a source that has ended
    pub fn empty() -> Self {
        Slice::Parts(Vec::new())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Slice::Text(text.into())
    }

    /// True for `""` and `[]`
    pub fn is_empty(&self) -> bool {
        match self {
            Slice::Text(text) => text.is_empty(),
            Slice::Parts(parts) => parts.is_empty(),
        }
    }

    /// True only for the `[]` placeholder
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Slice::Parts(parts) if parts.is_empty())
    }
}

/// Lazy, finite sequence of slices for one prompt
#[async_trait]
pub trait TokenSource: Send {
    /// Next slice, or `None` once the sequence has ended.
    ///
    /// After returning `None` a source is never pulled again.
    async fn next_slice(&mut self) -> Result<Option<Slice>>;
}

/// Generation backend
#[async_trait]
pub trait Generator: Send + Sync {
    /// Open one token source per prompt, in prompt order
    async fn open(&self, prompts: Vec<Prompt>) -> Result<Vec<Box<dyn TokenSource>>>;

    /// Identifier used in logs
    fn name(&self) -> &str;
}
