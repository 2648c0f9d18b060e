//! Question/Feedback Synthesis: interview questions and improvement tips from the
//! generation service, with a deterministic fallback.
//!
//! One request per synthesis, bounded by a timeout, never retried. Whatever comes
//! back is classified into a `SynthesisOutcome` and reduced to `Feedback` by a single
//! total function, so this stage cannot fail an evaluation.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, UNBIASED_INSTRUCTION};
use crate::llm_client::{ChatCompletion, LlmError};
use crate::screening::anonymizer::AnonymizedText;
use crate::screening::catalog::{fallback_questions, FALLBACK_IMPROVEMENTS};
use crate::screening::prompts::{SYNTHESIS_PROMPT_TEMPLATE, SYNTHESIS_REPLY_SHAPE, SYNTHESIS_SYSTEM};

/// Every question set is topped up to at least this many entries.
pub const MIN_QUESTIONS: usize = 5;

/// Characters of anonymized resume text sent with the request.
pub const RESUME_EXCERPT_CHARS: usize = 4000;

/// Which path produced a `Feedback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub questions: Vec<String>,
    pub improvements: Vec<String>,
    pub source: FeedbackSource,
}

/// What the synthesizer knows about the candidate when it asks for questions.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisInput<'a> {
    pub domain: &'a str,
    pub score: f64,
    pub strengths: &'a [String],
    pub improvement_areas: &'a [String],
    pub resume: &'a AnonymizedText,
}

/// Classified reply from the generation service.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisOutcome {
    Success {
        questions: Vec<String>,
        improvements: Vec<String>,
    },
    ParseFailure(String),
    TransportFailure(String),
}

pub struct QuestionSynthesizer {
    client: Arc<dyn ChatCompletion>,
    timeout: Duration,
}

impl QuestionSynthesizer {
    pub fn new(client: Arc<dyn ChatCompletion>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Always returns feedback with at least `MIN_QUESTIONS` questions.
    pub async fn synthesize(&self, input: &SynthesisInput<'_>) -> Feedback {
        let outcome = self.request(input).await;
        reduce(outcome, input.domain)
    }

    async fn request(&self, input: &SynthesisInput<'_>) -> SynthesisOutcome {
        let system = system_prompt();
        let user = build_user_prompt(input);

        match tokio::time::timeout(self.timeout, self.client.complete(&system, &user)).await {
            Err(_) => SynthesisOutcome::TransportFailure(LlmError::Timeout(self.timeout).to_string()),
            Ok(Err(e)) => SynthesisOutcome::TransportFailure(e.to_string()),
            Ok(Ok(reply)) => parse_generation_reply(&reply),
        }
    }
}

fn system_prompt() -> String {
    format!("{SYNTHESIS_SYSTEM}\n\n{JSON_ONLY_INSTRUCTION}\n{UNBIASED_INSTRUCTION}\n{SYNTHESIS_REPLY_SHAPE}")
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_user_prompt(input: &SynthesisInput<'_>) -> String {
    let excerpt: String = input.resume.as_str().chars().take(RESUME_EXCERPT_CHARS).collect();
    SYNTHESIS_PROMPT_TEMPLATE
        .replace("{domain}", input.domain)
        .replace("{score}", &format!("{:.2}", input.score))
        .replace("{strengths}", &bullet_list(input.strengths))
        .replace("{improvements}", &bullet_list(input.improvement_areas))
        .replace("{resume_text}", &excerpt)
}

// ────────────────────────────────────────────────────────────────────────────
// Reply parsing
// ────────────────────────────────────────────────────────────────────────────

fn fence_pattern() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?is)```(?:json)?\s*(.*?)```").ok())
        .as_ref()
}

/// Candidate JSON documents in recovery order: whole reply, fenced block, then the
/// span from the first `{` to the last `}`.
fn json_candidates(reply: &str) -> Vec<&str> {
    let mut candidates = vec![reply.trim()];
    if let Some(block) = fence_pattern()
        .and_then(|re| re.captures(reply))
        .and_then(|caps| caps.get(1))
    {
        candidates.push(block.as_str().trim());
    }
    if let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) {
        if start < end {
            candidates.push(&reply[start..=end]);
        }
    }
    candidates
}

/// Normalises a reply field to a list of distinct non-blank strings. A bare value
/// becomes a one-element list; null or absent becomes empty.
fn string_list(value: Option<&Value>) -> Vec<String> {
    let raw: Vec<String> = match value {
        None | Some(Value::Null) => vec![],
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(value_text)
            .collect(),
        Some(other) => vec![value_text(other)],
    };

    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for item in raw {
        let item = item.trim().to_string();
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn read_fields(object: &Map<String, Value>) -> SynthesisOutcome {
    SynthesisOutcome::Success {
        questions: string_list(object.get("questions")),
        improvements: string_list(object.get("improvements")),
    }
}

/// Classifies a raw reply. The first candidate that parses as JSON decides the
/// outcome; a top level that is not an object is a parse failure.
pub fn parse_generation_reply(reply: &str) -> SynthesisOutcome {
    for candidate in json_candidates(reply) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(object)) => return read_fields(&object),
            Ok(_) => {
                return SynthesisOutcome::ParseFailure("reply JSON is not an object".to_string())
            }
            Err(_) => continue,
        }
    }
    SynthesisOutcome::ParseFailure("no JSON object found in reply".to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Reduction
// ────────────────────────────────────────────────────────────────────────────

fn top_up(mut questions: Vec<String>, domain: &str) -> Vec<String> {
    for extra in fallback_questions(domain) {
        if questions.len() >= MIN_QUESTIONS {
            break;
        }
        if !questions.iter().any(|q| q == extra) {
            questions.push(extra.to_string());
        }
    }
    questions
}

/// Domain fallback questions and the generic tips, without asking the service.
pub fn fallback_feedback(domain: &str) -> Feedback {
    Feedback {
        questions: top_up(vec![], domain),
        improvements: FALLBACK_IMPROVEMENTS.iter().map(|s| s.to_string()).collect(),
        source: FeedbackSource::Fallback,
    }
}

/// Total reduction of a synthesis outcome to feedback.
pub fn reduce(outcome: SynthesisOutcome, domain: &str) -> Feedback {
    match outcome {
        SynthesisOutcome::Success {
            questions,
            improvements,
        } => {
            info!(
                "Generated {} questions and {} improvement tips",
                questions.len(),
                improvements.len()
            );
            Feedback {
                questions: top_up(questions, domain),
                improvements,
                source: FeedbackSource::Generated,
            }
        }
        SynthesisOutcome::ParseFailure(reason) => {
            warn!("Generation reply unusable, using fallback questions: {reason}");
            fallback_feedback(domain)
        }
        SynthesisOutcome::TransportFailure(reason) => {
            warn!("Generation service unavailable, using fallback questions: {reason}");
            fallback_feedback(domain)
        }
    }
}
