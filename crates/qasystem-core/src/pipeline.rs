//! Request pipeline
//!
//! questions → embeddings → per-topic retrieval → prompts → token sources
//! → multiplexer → frames.

use crate::context::Context;
use crate::error::{QaError, Result};
use crate::generation::TokenSource;
use crate::models::{AskRequest, Question};
use crate::prompt::Prompt;
use crate::retrieval::retrieve;
use crate::stream::{encode, Multiplexer, Round};
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::time::Instant;

/// Stream of rounds for one request
pub type RoundStream = BoxStream<'static, Result<Round>>;

/// Stream of encoded frames for one request
pub type FrameStream = BoxStream<'static, Result<String>>;

/// Answer a batch of questions as a stream of rounds.
///
/// Validation, embedding, retrieval and opening the generator all happen
/// before this returns, so their failures surface as a plain `Err`. Errors
/// after that end the stream.
pub async fn ask_rounds(ctx: &Context, request: AskRequest) -> Result<RoundStream> {
    request.validate(ctx.max_batch_size)?;

    let timeout_secs = ctx.request_timeout.as_secs();
    let deadline = Instant::now() + ctx.request_timeout;
    let count = request.questions.len();

    tracing::info!("Answering batch of {} questions", count);

    let sources = tokio::time::timeout_at(deadline, open_sources(ctx, &request.questions))
        .await
        .map_err(|_| QaError::DeadlineExceeded(timeout_secs))??;

    Ok(multiplex(sources, deadline, timeout_secs))
}

/// Answer a batch of questions as a stream of wire frames
pub async fn ask(ctx: &Context, request: AskRequest) -> Result<FrameStream> {
    let rounds = ask_rounds(ctx, request).await?;
    Ok(frames(rounds))
}

/// Multiplex already-opened sources under a deadline
pub fn multiplex(
    sources: Vec<Box<dyn TokenSource>>,
    deadline: Instant,
    timeout_secs: u64,
) -> RoundStream {
    let arity = sources.len();
    Multiplexer::new(sources)
        .with_deadline(deadline, timeout_secs)
        .into_stream()
        .inspect(move |result| match result {
            Ok(round) => tracing::debug!("Round {} ({} questions)", round.sequence_id, arity),
            Err(e) => tracing::warn!("Answer stream truncated: {}", e),
        })
        .boxed()
}

/// Encode every round as a frame
pub fn frames(rounds: RoundStream) -> FrameStream {
    rounds
        .map(|result| result.and_then(|round| encode(&round)))
        .boxed()
}

async fn open_sources(
    ctx: &Context,
    questions: &[Question],
) -> Result<Vec<Box<dyn TokenSource>>> {
    if questions.is_empty() {
        return Ok(Vec::new());
    }

    let texts: Vec<String> = questions.iter().map(|q| q.question.clone()).collect();
    let embeddings = ctx.io_pool.run(ctx.embedder.embed_batch(&texts)).await?;
    if embeddings.len() != texts.len() {
        return Err(QaError::EmbeddingUnavailable(format!(
            "expected {} embeddings, got {}",
            texts.len(),
            embeddings.len()
        )));
    }

    let articles = retrieve(ctx.store.as_ref(), &ctx.io_pool, questions, embeddings).await?;

    let prompts: Vec<Prompt> = questions
        .iter()
        .zip(&articles)
        .map(|(question, result)| Prompt::build(&question.question, &result.items))
        .collect();

    let sources = ctx.generator.open(prompts).await?;
    if sources.len() != questions.len() {
        return Err(QaError::GenerationFailure(format!(
            "generator opened {} sources for {} prompts",
            sources.len(),
            questions.len()
        )));
    }

    Ok(sources)
}
