//! Round multiplexing and wire framing
//!
//! Provides:
//! - `Multiplexer`: pulls every token source in lockstep rounds
//! - `framing`: the `event:`/`id:`/`data:` frame grammar, both directions

pub mod framing;
mod multiplexer;

pub use framing::{decode, decode_all, encode, FrameDecoder, EVENT_NAME};
pub use multiplexer::Multiplexer;

use crate::generation::Slice;
use serde::{Deserialize, Serialize};

/// One synchronized step across all questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub sequence_id: u64,
    /// One slice per question, in original question order
    pub slices: Vec<Slice>,
}

impl Round {
    pub fn new(sequence_id: u64, slices: Vec<Slice>) -> Self {
        Self {
            sequence_id,
            slices,
        }
    }

    pub fn arity(&self) -> usize {
        self.slices.len()
    }
}
