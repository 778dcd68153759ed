//! Generation service client
//!
//! The service answers all prompts of a request in one framed event
//! stream. Frames are read once into a shared buffer and every per-prompt
//! source reads its own column from it.

use super::{Generator, Slice, TokenSource};
use crate::config::GenerationConfig;
use crate::error::{QaError, Result};
use crate::prompt::Prompt;
use crate::stream::FrameDecoder;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Serialize)]
struct AskRequest<'a> {
    items: Vec<&'a str>,
}

/// Slices read from one response body and not yet taken by their source.
///
/// Each prompt owns one queue. Sources pull in lockstep, so a queue holds
/// at most the rounds its source lags behind the fastest one.
struct RoundReader {
    body: BoxStream<'static, std::result::Result<Vec<u8>, reqwest::Error>>,
    decoder: FrameDecoder,
    columns: Vec<VecDeque<Slice>>,
    closed: Vec<bool>,
    frames_read: u64,
    finished: bool,
}

impl RoundReader {
    fn new(
        body: BoxStream<'static, std::result::Result<Vec<u8>, reqwest::Error>>,
        arity: usize,
    ) -> Self {
        Self {
            body,
            decoder: FrameDecoder::new(),
            columns: vec![VecDeque::new(); arity],
            closed: vec![false; arity],
            frames_read: 0,
            finished: false,
        }
    }

    /// Next slice of prompt `index`, reading further frames as needed.
    ///
    /// `None` once the body has ended or the prompt got its `[]` entry;
    /// later frames are not buffered for a closed prompt.
    async fn next(&mut self, index: usize) -> Result<Option<Slice>> {
        if self.closed[index] {
            return Ok(None);
        }
        while self.columns[index].is_empty() && !self.finished {
            self.read_frame().await?;
        }
        match self.columns[index].pop_front() {
            Some(slice) if !slice.is_placeholder() => Ok(Some(slice)),
            _ => {
                self.closed[index] = true;
                self.columns[index].clear();
                Ok(None)
            }
        }
    }

    /// Slices decoded but not yet taken
    fn buffered(&self) -> usize {
        self.columns.iter().map(VecDeque::len).sum()
    }

    async fn read_frame(&mut self) -> Result<()> {
        loop {
            let frame = self
                .decoder
                .next_frame()
                .map_err(|e| QaError::GenerationFailure(e.to_string()))?;

            if let Some(round) = frame {
                if round.sequence_id != self.frames_read {
                    return Err(QaError::GenerationFailure(format!(
                        "expected frame {}, got {}",
                        self.frames_read, round.sequence_id
                    )));
                }
                if round.arity() != self.columns.len() {
                    return Err(QaError::GenerationFailure(format!(
                        "frame {} has {} slices for {} prompts",
                        round.sequence_id,
                        round.arity(),
                        self.columns.len()
                    )));
                }
                self.frames_read += 1;
                for ((column, closed), slice) in self
                    .columns
                    .iter_mut()
                    .zip(&self.closed)
                    .zip(round.slices)
                {
                    if !closed {
                        column.push_back(slice);
                    }
                }
                return Ok(());
            }

            match self.body.next().await {
                Some(Ok(chunk)) => self.decoder.push(&chunk),
                Some(Err(e)) => {
                    return Err(QaError::GenerationFailure(format!(
                        "generation stream broke: {}",
                        e
                    )))
                }
                None => {
                    self.decoder
                        .finish()
                        .map_err(|e| QaError::GenerationFailure(e.to_string()))?;
                    self.finished = true;
                    return Ok(());
                }
            }
        }
    }
}

/// One prompt's column of the shared frame stream.
///
/// A `[]` entry from the service marks the prompt as finished.
struct RemoteSource {
    reader: Arc<Mutex<RoundReader>>,
    index: usize,
}

#[async_trait]
impl TokenSource for RemoteSource {
    async fn next_slice(&mut self) -> Result<Option<Slice>> {
        self.reader.lock().await.next(self.index).await
    }
}

/// Generator backed by `POST {url}/llm_ask`
pub struct HttpGenerator {
    http_client: reqwest::Client,
    url: String,
}

impl HttpGenerator {
    /// Create from configuration.
    ///
    /// Only connecting is time-limited; the body streams for as long as the
    /// request deadline allows.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            url: format!("{}/llm_ask", config.url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn open(&self, prompts: Vec<Prompt>) -> Result<Vec<Box<dyn TokenSource>>> {
        if prompts.is_empty() {
            return Ok(Vec::new());
        }

        let request = AskRequest {
            items: prompts.iter().map(|p| p.as_str()).collect(),
        };

        let response = self
            .http_client
            .post(&self.url)
            .header("accept", "text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(|e| QaError::GenerationFailure(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(QaError::GenerationFailure(format!(
                "generation service error (HTTP {}): {}",
                status, body
            )));
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();

        let reader = Arc::new(Mutex::new(RoundReader::new(body, prompts.len())));

        Ok((0..prompts.len())
            .map(|index| {
                Box::new(RemoteSource {
                    reader: Arc::clone(&reader),
                    index,
                }) as Box<dyn TokenSource>
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.url
    }
}
