//! Topic partitioning and scatter-back
//!
//! Questions are grouped by topic so that each topic costs one batched
//! search. Every group remembers the original batch positions of its
//! members, in first-appearance order, so results can be put back.

use crate::error::{QaError, Result};
use crate::models::{Question, RetrievalResult, Topic};
use std::collections::HashMap;

/// Questions of one topic, in the order they appeared in the batch
#[derive(Debug, Clone, PartialEq)]
pub struct TopicGroup {
    pub topic: Topic,
    pub member_indices: Vec<usize>,
    pub member_embeddings: Vec<Vec<f32>>,
}

impl TopicGroup {
    fn new(topic: Topic) -> Self {
        Self {
            topic,
            member_indices: Vec::new(),
            member_embeddings: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.member_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.member_indices.is_empty()
    }
}

/// Group `(index, embedding)` pairs by question topic.
///
/// Iteration order over the returned map is unspecified; the order inside
/// each group is insertion order.
pub fn partition(
    questions: &[Question],
    embeddings: Vec<Vec<f32>>,
) -> Result<HashMap<Topic, TopicGroup>> {
    if questions.len() != embeddings.len() {
        return Err(QaError::InvalidInput(format!(
            "{} questions but {} embeddings",
            questions.len(),
            embeddings.len()
        )));
    }

    let mut groups: HashMap<Topic, TopicGroup> = HashMap::new();
    for (index, (question, embedding)) in questions.iter().zip(embeddings).enumerate() {
        let group = groups
            .entry(question.topic)
            .or_insert_with(|| TopicGroup::new(question.topic));
        group.member_indices.push(index);
        group.member_embeddings.push(embedding);
    }

    Ok(groups)
}

/// Put per-group results back at their original batch positions.
///
/// Each batch pairs a group's `member_indices` with the results its search
/// returned. A group that got back a different number of results than it
/// asked for fails the whole call.
pub fn scatter<I>(total: usize, batches: I) -> Result<Vec<RetrievalResult>>
where
    I: IntoIterator<Item = (Vec<usize>, Vec<RetrievalResult>)>,
{
    let mut slots: Vec<Option<RetrievalResult>> = vec![None; total];

    for (indices, results) in batches {
        if indices.len() != results.len() {
            return Err(QaError::RetrievalUnavailable(format!(
                "requested {} results, store returned {}",
                indices.len(),
                results.len()
            )));
        }
        for (index, result) in indices.into_iter().zip(results) {
            let slot = slots.get_mut(index).ok_or_else(|| {
                QaError::InvalidInput(format!("index {} outside batch of {}", index, total))
            })?;
            *slot = Some(result);
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| {
                QaError::RetrievalUnavailable(format!("no result for question {}", index))
            })
        })
        .collect()
}
