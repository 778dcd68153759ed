//! Request handlers

use crate::error::ApiError;
use crate::server::AppState;
use crate::EVENT_STREAM;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use qasystem_core::pipeline::{self, FrameStream};
use qasystem_core::{AskRequest, QaError};
use serde::Deserialize;
use tokio::time::Instant;

/// Body of `POST /llm_ask`
#[derive(Debug, Deserialize)]
pub struct LlmAskRequest {
    #[serde(default)]
    pub items: Vec<String>,
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    tracing::info!("POST /ask with {} questions", request.questions.len());

    let frames = pipeline::ask(&state.ctx, request).await?;
    event_stream(frames).await
}

pub async fn llm_ask(
    State(state): State<AppState>,
    payload: Result<Json<LlmAskRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    tracing::info!("POST /llm_ask with {} prompts", request.items.len());

    let ctx = &state.ctx;
    if request.items.len() > ctx.max_batch_size {
        return Err(QaError::InvalidInput(format!(
            "batch of {} prompts exceeds the limit of {}",
            request.items.len(),
            ctx.max_batch_size
        ))
        .into());
    }

    let sources = state.local.open_raw(&request.items);
    let rounds = pipeline::multiplex(
        sources,
        Instant::now() + ctx.request_timeout,
        ctx.request_timeout.as_secs(),
    );
    event_stream(pipeline::frames(rounds)).await
}

/// Wait for the first frame so an early failure still gets an error
/// status, then stream the rest. A later error aborts the body, leaving the
/// client with only complete frames.
async fn event_stream(mut frames: FrameStream) -> Result<Response, ApiError> {
    let first = match frames.next().await {
        Some(frame) => frame?,
        None => {
            return Err(QaError::GenerationFailure("answer stream produced no frames".into()).into())
        }
    };

    let body = futures::stream::once(async move { Ok::<_, QaError>(first) }).chain(frames);

    Ok((
        [
            (header::CONTENT_TYPE, EVENT_STREAM),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body),
    )
        .into_response())
}
