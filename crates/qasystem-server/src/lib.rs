//! qasystem HTTP server
//!
//! Serves `POST /ask` (answers a batch of questions as a frame stream),
//! `POST /llm_ask` (the local generator behind the generation boundary) and
//! `GET /healthz`.

mod error;
mod routes;
mod server;

pub use error::{status_for, ApiError, ErrorBody};
pub use server::{router, serve, start_server, AppState};

/// Content type of every answer stream
pub const EVENT_STREAM: &str = "text/event-stream";
