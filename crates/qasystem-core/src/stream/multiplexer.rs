//! Lockstep multiplexer over per-question token sources

use super::Round;
use crate::error::{QaError, Result};
use crate::generation::{Slice, TokenSource};
use futures::Stream;
use tokio::time::Instant;

/// Interleaves N token sources into one ordered sequence of rounds.
///
/// Each round pulls every live source once, in question order. A source
/// that ends is marked exhausted and shows up as `[]` from then on. The
/// sequence stops, without emitting, on the first round in which no source
/// produced anything. With zero sources exactly one empty round is emitted.
pub struct Multiplexer {
    sources: Vec<Box<dyn TokenSource>>,
    exhausted: Vec<bool>,
    sequence_id: u64,
    done: bool,
    deadline: Option<(Instant, u64)>,
}

impl Multiplexer {
    pub fn new(sources: Vec<Box<dyn TokenSource>>) -> Self {
        let exhausted = vec![false; sources.len()];
        Self {
            sources,
            exhausted,
            sequence_id: 0,
            done: false,
            deadline: None,
        }
    }

    /// Stop with `DeadlineExceeded` once `deadline` passes
    pub fn with_deadline(mut self, deadline: Instant, timeout_secs: u64) -> Self {
        self.deadline = Some((deadline, timeout_secs));
        self
    }

    /// Number of slices in every round
    pub fn arity(&self) -> usize {
        self.sources.len()
    }

    /// Sources that have not ended yet
    pub fn active(&self) -> usize {
        self.exhausted.iter().filter(|e| !**e).count()
    }

    /// Advance one round. `Ok(None)` once the sequence is over.
    ///
    /// An error ends the sequence; later calls return `Ok(None)`.
    pub async fn next_round(&mut self) -> Result<Option<Round>> {
        if self.done {
            return Ok(None);
        }

        let result = match self.deadline {
            Some((deadline, secs)) => tokio::time::timeout_at(deadline, self.pull_round())
                .await
                .unwrap_or(Err(QaError::DeadlineExceeded(secs))),
            None => self.pull_round().await,
        };

        match result {
            Ok(Some(slices)) => {
                let round = Round::new(self.sequence_id, slices);
                self.sequence_id += 1;
                Ok(Some(round))
            }
            Ok(None) => {
                self.done = true;
                Ok(None)
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }

    async fn pull_round(&mut self) -> Result<Option<Vec<Slice>>> {
        if self.sources.is_empty() {
            return Ok(if self.sequence_id == 0 {
                Some(Vec::new())
            } else {
                None
            });
        }

        let header = self.sequence_id == 0;
        let mut slices = Vec::with_capacity(self.sources.len());
        let mut produced = false;

        for (index, (source, exhausted)) in self
            .sources
            .iter_mut()
            .zip(self.exhausted.iter_mut())
            .enumerate()
        {
            if *exhausted {
                slices.push(Slice::empty());
                continue;
            }

            let pulled = source.next_slice().await.map_err(|e| match e {
                QaError::GenerationFailure(_) | QaError::DeadlineExceeded(_) => e,
                other => QaError::GenerationFailure(format!("question {}: {}", index, other)),
            })?;

            match pulled {
                Some(slice) if header && slice.is_empty() => {
                    return Err(QaError::GenerationFailure(format!(
                        "question {}: empty opening slice",
                        index
                    )));
                }
                Some(slice) => {
                    produced = true;
                    slices.push(slice);
                }
                None if header => {
                    return Err(QaError::GenerationFailure(format!(
                        "question {}: ended before its opening slice",
                        index
                    )));
                }
                None => {
                    *exhausted = true;
                    slices.push(Slice::empty());
                }
            }
        }

        Ok(produced.then_some(slices))
    }

    /// Drive the multiplexer as a stream of rounds
    pub fn into_stream(self) -> impl Stream<Item = Result<Round>> + Send {
        futures::stream::unfold(self, |mut mux| async move {
            match mux.next_round().await {
                Ok(Some(round)) => Some((Ok(round), mux)),
                Ok(None) => None,
                Err(e) => Some((Err(e), mux)),
            }
        })
    }
}
