//! In-process generator
//!
//! Opens every answer with an acknowledgement of the question, then emits
//! one excerpt per retrieved passage.

use super::{Generator, Slice, TokenSource};
use crate::error::Result;
use crate::prompt::Prompt;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INPUT_RE: Regex = Regex::new(r"(?s)<input>(.+?)</input>").unwrap();
    static ref ARTICLE_RE: Regex = Regex::new(r"(?s)<article>(.*?)</article>").unwrap();
}

/// Header for prompts that carry no question marker
pub const UNKNOWN_QUESTION_ANSWER: &str = "I don't know what to say..";

/// Opening line of an answer
pub fn header_line(question: Option<&str>) -> String {
    match question {
        Some(question) => format!("Answer for question \"{}\" is:", question),
        None => UNKNOWN_QUESTION_ANSWER.to_string(),
    }
}

/// Question and passages recovered from a rendered prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPrompt {
    pub question: Option<String>,
    pub passages: Vec<String>,
}

/// Recover the marked sections of a prompt string.
///
/// Only used where prompts arrive as bare strings (the generation service
/// endpoint). Markers are looked up after the `Input:` line when present so
/// the preamble's own tag descriptions are skipped.
pub fn parse_prompt(text: &str) -> ParsedPrompt {
    let body = text
        .split_once("\nInput:\n")
        .map(|(_, body)| body)
        .unwrap_or(text);

    let question = INPUT_RE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    let passages = ARTICLE_RE
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect();

    ParsedPrompt { question, passages }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Token source over one prompt's header and passage excerpts
struct ExcerptSource {
    header: Option<String>,
    passages: std::vec::IntoIter<String>,
    excerpt_chars: usize,
}

#[async_trait]
impl TokenSource for ExcerptSource {
    async fn next_slice(&mut self) -> Result<Option<Slice>> {
        if let Some(header) = self.header.take() {
            return Ok(Some(Slice::Text(header)));
        }
        Ok(self
            .passages
            .next()
            .map(|passage| Slice::Text(excerpt(&passage, self.excerpt_chars))))
    }
}

/// Generator that answers from the prompt's own passages
#[derive(Debug, Clone)]
pub struct LocalGenerator {
    excerpt_chars: usize,
}

impl LocalGenerator {
    pub fn new(excerpt_chars: usize) -> Self {
        Self {
            excerpt_chars: excerpt_chars.max(1),
        }
    }

    fn source(&self, question: Option<&str>, passages: Vec<String>) -> Box<dyn TokenSource> {
        Box::new(ExcerptSource {
            header: Some(header_line(question)),
            passages: passages.into_iter(),
            excerpt_chars: self.excerpt_chars,
        })
    }

    /// Open sources for bare prompt strings
    pub fn open_raw(&self, prompts: &[String]) -> Vec<Box<dyn TokenSource>> {
        prompts
            .iter()
            .map(|text| {
                let parsed = parse_prompt(text);
                self.source(parsed.question.as_deref(), parsed.passages)
            })
            .collect()
    }
}

impl Default for LocalGenerator {
    fn default() -> Self {
        Self::new(128)
    }
}

#[async_trait]
impl Generator for LocalGenerator {
    async fn open(&self, prompts: Vec<Prompt>) -> Result<Vec<Box<dyn TokenSource>>> {
        Ok(prompts
            .iter()
            .map(|prompt| self.source(Some(prompt.question()), prompt.passages().to_vec()))
            .collect())
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain(mut source: Box<dyn TokenSource>) -> Vec<Slice> {
        let mut out = Vec::new();
        while let Some(slice) = source.next_slice().await.unwrap() {
            out.push(slice);
        }
        out
    }

    #[tokio::test]
    async fn test_header_then_one_slice_per_passage() {
        let generator = LocalGenerator::new(4);
        let prompt = Prompt::from_parts("Who?", vec!["abcdefgh".into(), "xy".into()]);

        let mut sources = generator.open(vec![prompt]).await.unwrap();
        let slices = drain(sources.remove(0)).await;
        assert_eq!(
            slices,
            vec![
                Slice::text("Answer for question \"Who?\" is:"),
                Slice::text("abcd"),
                Slice::text("xy"),
            ]
        );
    }

    #[tokio::test]
    async fn test_source_stays_exhausted() {
        let generator = LocalGenerator::default();
        let mut sources = generator
            .open(vec![Prompt::from_parts("q", Vec::new())])
            .await
            .unwrap();
        let source = &mut sources[0];
        assert!(source.next_slice().await.unwrap().is_some());
        assert!(source.next_slice().await.unwrap().is_none());
        assert!(source.next_slice().await.unwrap().is_none());
    }

    #[test]
    fn test_parse_rendered_prompt() {
        let prompt = Prompt::from_parts("Who won?", vec!["line one\nline two".into(), "b".into()]);
        let parsed = parse_prompt(prompt.as_str());
        assert_eq!(parsed.question.as_deref(), Some("Who won?"));
        assert_eq!(parsed.passages, vec!["line one\nline two".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_parse_bare_markers() {
        let parsed = parse_prompt("<input>input</input>\n<article>a</article>\n<article>b</article>");
        assert_eq!(parsed.question.as_deref(), Some("input"));
        assert_eq!(parsed.passages, vec!["a".to_string(), "b".to_string()]);

        let parsed = parse_prompt("hello");
        assert_eq!(parsed.question, None);
        assert!(parsed.passages.is_empty());
    }

    #[tokio::test]
    async fn test_open_raw_without_marker() {
        let generator = LocalGenerator::default();
        let mut sources = generator.open_raw(&["hello".to_string()]);
        let slices = drain(sources.remove(0)).await;
        assert_eq!(slices, vec![Slice::text(UNKNOWN_QUESTION_ANSWER)]);
    }

    #[tokio::test]
    async fn test_empty_input_marker_is_unknown_question() {
        let parsed = parse_prompt("<input></input>\n<article>a</article>");
        assert_eq!(parsed.question, None);

        let generator = LocalGenerator::default();
        let mut sources = generator.open_raw(&["<input></input>".to_string()]);
        let slices = drain(sources.remove(0)).await;
        assert_eq!(slices, vec![Slice::text(UNKNOWN_QUESTION_ANSWER)]);
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("héllo", 2), "hé");
        assert_eq!(excerpt("", 5), "");
    }
}
