//! Integration tests for the ask pipeline
//!
//! Embedding and retrieval are replaced by in-process fakes; generation uses
//! the local generator unless a test needs a failing one.

use async_trait::async_trait;
use futures::StreamExt;
use qasystem_core::generation::TokenSource;
use qasystem_core::models::PassageEntity;
use qasystem_core::stream::decode_all;
use qasystem_core::{
    ask, ask_rounds, AskRequest, Context, Embedder, Generator, IoPool, LocalGenerator, Prompt,
    QaError, Question, Result, RetrievalResult, RetrievedPassage, Round, Slice, Topic,
    VectorStore,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Embeds the i-th text as `[i]`
struct IndexEmbedder {
    calls: AtomicUsize,
}

#[async_trait]
impl Embedder for IndexEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((0..texts.len()).map(|i| vec![i as f32]).collect())
    }

    fn name(&self) -> &str {
        "index"
    }
}

/// Returns `passages_per_hit` passages per embedding, each naming the
/// question index it was retrieved for
struct TaggingStore {
    calls: Mutex<HashMap<Topic, usize>>,
    passages_per_hit: usize,
    fail: bool,
}

#[async_trait]
impl VectorStore for TaggingStore {
    async fn search(&self, topic: Topic, embeddings: &[Vec<f32>]) -> Result<Vec<RetrievalResult>> {
        *self.calls.lock().unwrap().entry(topic).or_insert(0) += 1;
        if self.fail {
            return Err(QaError::RetrievalUnavailable("store offline".into()));
        }
        Ok(embeddings
            .iter()
            .map(|e| RetrievalResult {
                items: (0..self.passages_per_hit)
                    .map(|p| RetrievedPassage {
                        id: p as i64,
                        distance: 1.0,
                        entity: PassageEntity {
                            topic,
                            text: format!("q{} {} passage {}", e[0], topic, p),
                        },
                    })
                    .collect(),
            })
            .collect())
    }

    fn name(&self) -> &str {
        "tagging"
    }
}

/// Header, one good slice, then an error
struct FailingGenerator;

struct FailingSource {
    pulls: usize,
}

#[async_trait]
impl TokenSource for FailingSource {
    async fn next_slice(&mut self) -> Result<Option<Slice>> {
        self.pulls += 1;
        match self.pulls {
            1 => Ok(Some(Slice::text("header"))),
            2 => Ok(Some(Slice::text("body"))),
            _ => Err(QaError::GenerationFailure("model crashed".into())),
        }
    }
}

#[async_trait]
impl Generator for FailingGenerator {
    async fn open(&self, prompts: Vec<Prompt>) -> Result<Vec<Box<dyn TokenSource>>> {
        Ok(prompts
            .iter()
            .map(|_| Box::new(FailingSource { pulls: 0 }) as Box<dyn TokenSource>)
            .collect())
    }

    fn name(&self) -> &str {
        "failing"
    }
}

struct Harness {
    embedder: Arc<IndexEmbedder>,
    store: Arc<TaggingStore>,
    ctx: Context,
}

fn harness(passages_per_hit: usize) -> Harness {
    harness_with(passages_per_hit, false, Arc::new(LocalGenerator::default()))
}

fn harness_with(passages_per_hit: usize, fail: bool, generator: Arc<dyn Generator>) -> Harness {
    let embedder = Arc::new(IndexEmbedder {
        calls: AtomicUsize::new(0),
    });
    let store = Arc::new(TaggingStore {
        calls: Mutex::new(HashMap::new()),
        passages_per_hit,
        fail,
    });
    let ctx = Context::new(embedder.clone(), store.clone(), generator, IoPool::new(2));
    Harness {
        embedder,
        store,
        ctx,
    }
}

fn request(questions: &[(&str, Topic)]) -> AskRequest {
    AskRequest {
        questions: questions
            .iter()
            .map(|(text, topic)| Question::new(*text, *topic))
            .collect(),
    }
}

async fn body(ctx: &Context, req: AskRequest) -> String {
    let frames: Vec<String> = ask(ctx, req)
        .await
        .unwrap()
        .map(|f| f.unwrap())
        .collect()
        .await;
    frames.concat()
}

fn text(slice: &Slice) -> &str {
    match slice {
        Slice::Text(text) => text,
        Slice::Parts(_) => panic!("expected text slice, got {:?}", slice),
    }
}

#[tokio::test]
async fn test_empty_batch_is_one_frame_and_no_calls() {
    let h = harness(2);
    let out = body(&h.ctx, AskRequest::default()).await;

    assert_eq!(out, "event: qasystem\nid: 0\ndata: []\n\n");
    assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 0);
    assert!(h.store.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_single_sports_question() {
    let h = harness(2);
    let out = body(
        &h.ctx,
        request(&[("Who is the best hockey player?", Topic::Sports)]),
    )
    .await;

    let rounds = decode_all(&out).unwrap();
    assert!(rounds.len() > 1 && rounds.len() < 5);
    assert_eq!(rounds.len(), 3); // header plus one round per passage
    assert_eq!(
        text(&rounds[0].slices[0]),
        "Answer for question \"Who is the best hockey player?\" is:"
    );
    for (i, round) in rounds.iter().enumerate() {
        assert_eq!(round.sequence_id, i as u64);
        assert_eq!(round.arity(), 1);
        assert!(!round.slices[0].is_empty());
    }
}

#[tokio::test]
async fn test_batch_scatters_results_to_their_questions() {
    let h = harness(2);
    let out = body(
        &h.ctx,
        request(&[
            ("Who is the best hockey player?", Topic::Sports),
            ("What moved the markets?", Topic::Business),
            ("Who won the cup?", Topic::Sports),
        ]),
    )
    .await;

    let calls = h.store.calls.lock().unwrap().clone();
    assert_eq!(calls.get(&Topic::Sports), Some(&1));
    assert_eq!(calls.get(&Topic::Business), Some(&1));
    assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 1);

    let rounds = decode_all(&out).unwrap();
    assert_eq!(rounds.len(), 3);
    assert!(text(&rounds[0].slices[1]).contains("What moved the markets?"));
    for round in &rounds[1..] {
        assert_eq!(round.arity(), 3);
        assert!(text(&round.slices[0]).starts_with("q0 sports"));
        assert!(text(&round.slices[1]).starts_with("q1 business"));
        assert!(text(&round.slices[2]).starts_with("q2 sports"));
    }
}

#[tokio::test]
async fn test_question_without_passages_gets_header_only() {
    let h = harness(0);
    let rounds: Vec<Round> = ask_rounds(&h.ctx, request(&[("Anyone?", Topic::Business)]))
        .await
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
        .await;

    assert_eq!(rounds.len(), 1);
    assert_eq!(rounds[0].sequence_id, 0);
}

#[tokio::test]
async fn test_invalid_input_rejected_before_any_work() {
    let h = harness(2);
    let err = ask(&h.ctx, request(&[("ok", Topic::Sports), ("  ", Topic::Business)]))
        .await
        .err()
        .unwrap();

    assert!(matches!(err, QaError::InvalidInput(_)));
    assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_retrieval_failure_before_streaming() {
    let h = harness_with(2, true, Arc::new(LocalGenerator::default()));
    let err = ask(&h.ctx, request(&[("q", Topic::Sports)]))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, QaError::RetrievalUnavailable(_)));
}

#[tokio::test]
async fn test_generation_failure_truncates_after_complete_frames() {
    let h = harness_with(2, false, Arc::new(FailingGenerator));
    let results: Vec<Result<String>> = ask(
        &h.ctx,
        request(&[("a", Topic::Sports), ("b", Topic::Business)]),
    )
    .await
    .unwrap()
    .collect()
    .await;

    assert_eq!(results.len(), 3);
    let complete: String = results[..2]
        .iter()
        .map(|r| r.as_ref().unwrap().clone())
        .collect();
    let rounds = decode_all(&complete).unwrap();
    assert_eq!(rounds.len(), 2);
    assert_eq!(rounds[1].sequence_id, 1);
    assert!(matches!(results[2], Err(QaError::GenerationFailure(_))));
}

#[tokio::test]
async fn test_batch_limit_enforced() {
    let h = harness(1);
    let ctx = h.ctx.clone().with_max_batch_size(1);
    let err = ask(&ctx, request(&[("a", Topic::Sports), ("b", Topic::Sports)]))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, QaError::InvalidInput(_)));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_covers_retrieval() {
    struct SlowStore;

    #[async_trait]
    impl VectorStore for SlowStore {
        async fn search(&self, _: Topic, _: &[Vec<f32>]) -> Result<Vec<RetrievalResult>> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    let ctx = Context::new(
        Arc::new(IndexEmbedder {
            calls: AtomicUsize::new(0),
        }),
        Arc::new(SlowStore),
        Arc::new(LocalGenerator::default()),
        IoPool::new(1),
    )
    .with_request_timeout(Duration::from_secs(5));

    let err = ask(&ctx, request(&[("q", Topic::Sports)]))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, QaError::DeadlineExceeded(5)));
}
