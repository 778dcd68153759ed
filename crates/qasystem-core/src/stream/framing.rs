//! Frame grammar
//!
//! ```text
//! event: qasystem
//! id: <sequence_id>
//! data: <JSON array, one entry per question>
//!
//! ```

use super::Round;
use crate::error::{QaError, Result};
use crate::generation::Slice;

pub const EVENT_NAME: &str = "qasystem";

const FRAME_END: &[u8] = b"\n\n";

/// Serialize a round into one frame, trailing blank line included
pub fn encode(round: &Round) -> Result<String> {
    let data = serde_json::to_string(&round.slices)?;
    Ok(format!(
        "event: {}\nid: {}\ndata: {}\n\n",
        EVENT_NAME, round.sequence_id, data
    ))
}

fn field<'a>(line: Option<&'a str>, name: &str) -> Result<&'a str> {
    let line = line.ok_or_else(|| QaError::Frame(format!("missing `{}` line", name)))?;
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| QaError::Frame(format!("expected `{}:` in {:?}", name, line)))?;
    if key.trim() != name {
        return Err(QaError::Frame(format!("expected `{}`, found `{}`", name, key)));
    }
    Ok(value.trim())
}

/// Parse one frame (with or without its trailing blank line)
pub fn decode(frame: &str) -> Result<Round> {
    let mut lines = frame.trim_matches('\n').lines();

    let event = field(lines.next(), "event")?;
    if event != EVENT_NAME {
        return Err(QaError::Frame(format!("unexpected event `{}`", event)));
    }

    let id = field(lines.next(), "id")?;
    let sequence_id = id
        .parse::<u64>()
        .map_err(|e| QaError::Frame(format!("bad id `{}`: {}", id, e)))?;

    let data = field(lines.next(), "data")?;
    let slices: Vec<Slice> = serde_json::from_str(data)
        .map_err(|e| QaError::Frame(format!("bad data: {}", e)))?;

    if let Some(extra) = lines.next() {
        return Err(QaError::Frame(format!("unexpected line {:?}", extra)));
    }

    Ok(Round::new(sequence_id, slices))
}

/// Parse a complete response body into its rounds
pub fn decode_all(text: &str) -> Result<Vec<Round>> {
    text.split("\n\n")
        .filter(|chunk| !chunk.trim().is_empty())
        .map(decode)
        .collect()
}

/// Incremental decoder for frames arriving in arbitrary byte chunks
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Next complete frame, if the buffer holds one
    pub fn next_frame(&mut self) -> Result<Option<Round>> {
        loop {
            let Some(end) = self
                .buffer
                .windows(FRAME_END.len())
                .position(|w| w == FRAME_END)
            else {
                return Ok(None);
            };

            let frame: Vec<u8> = self.buffer.drain(..end + FRAME_END.len()).collect();
            let text = std::str::from_utf8(&frame)
                .map_err(|e| QaError::Frame(format!("invalid UTF-8: {}", e)))?;
            if text.trim().is_empty() {
                continue;
            }
            return decode(text).map(Some);
        }
    }

    /// Check that nothing but whitespace is left once the input has ended
    pub fn finish(&self) -> Result<()> {
        if self.buffer.iter().all(|b| b.is_ascii_whitespace()) {
            Ok(())
        } else {
            Err(QaError::Frame(format!(
                "stream ended inside a frame ({} bytes pending)",
                self.buffer.len()
            )))
        }
    }
}
