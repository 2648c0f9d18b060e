//! Skill Matching: maps a domain's canonical skill list onto found/missing sets.
//!
//! Default: `KeywordSkillMatcher` (case-insensitive substring containment).
//! Alternative: `TokenSkillMatcher` (tokenize, drop stop words, lemmatize, then set
//! membership). Higher recall on plurals and inflections, lower on multi-word skills.
//!
//! The pipeline holds an `Arc<dyn SkillMatcher>` chosen at startup via config.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::screening::anonymizer::AnonymizedText;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

/// Found and missing skills, both in domain-list order.
/// Invariant: together they are exactly the domain list, with no overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub found: Vec<String>,
    pub missing: Vec<String>,
}

impl SkillMatch {
    /// The degraded result used when detection fails: nothing found.
    pub fn none_found(skills: &[&str]) -> Self {
        Self {
            found: vec![],
            missing: skills.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn partition(skills: &[&str], mut is_present: impl FnMut(&str) -> bool) -> Self {
        let mut result = Self::default();
        for skill in skills {
            if is_present(skill) {
                result.found.push(skill.to_string());
            } else {
                result.missing.push(skill.to_string());
            }
        }
        result
    }
}

/// The skill detector trait. Implement this to swap detection strategies without
/// touching the pipeline.
pub trait SkillMatcher: Send + Sync {
    fn match_skills(&self, text: &AnonymizedText, skills: &[&str]) -> Result<SkillMatch, DetectorError>;

    /// Short backend name, for logs.
    fn name(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordSkillMatcher
// ────────────────────────────────────────────────────────────────────────────

pub struct KeywordSkillMatcher;

impl SkillMatcher for KeywordSkillMatcher {
    fn match_skills(&self, text: &AnonymizedText, skills: &[&str]) -> Result<SkillMatch, DetectorError> {
        let text = text.as_str().to_lowercase();
        Ok(SkillMatch::partition(skills, |skill| {
            text.contains(&skill.to_lowercase())
        }))
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TokenSkillMatcher
// ────────────────────────────────────────────────────────────────────────────

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "am", "an", "and", "any", "are", "as", "at",
    "be", "because", "been", "before", "being", "below", "between", "both", "but", "by", "can",
    "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from", "further",
    "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if",
    "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor", "not",
    "now", "of", "off", "on", "once", "only", "or", "other", "our", "out", "over", "own", "same",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "you", "your",
];

/// Tokens keep the characters skill names are spelled with (`c++`, `c#`, `ci/cd`,
/// `scikit-learn`, `node.js`).
fn token_pattern() -> Result<&'static Regex, DetectorError> {
    static TOKEN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    TOKEN
        .get_or_init(|| Regex::new(r"[a-z0-9][a-z0-9+#./\-]*"))
        .as_ref()
        .map_err(|e| DetectorError::Pattern(e.clone()))
}

pub struct TokenSkillMatcher;

impl TokenSkillMatcher {
    fn tokens(text: &str) -> Result<HashSet<String>, DetectorError> {
        let lowered = text.to_lowercase();
        let pattern = token_pattern()?;
        let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();

        Ok(pattern
            .find_iter(&lowered)
            .map(|m| m.as_str().trim_end_matches(['.', '-', '/']))
            .filter(|t| !t.is_empty() && !stop_words.contains(t))
            .map(lemmatize)
            .collect())
    }
}

impl SkillMatcher for TokenSkillMatcher {
    fn match_skills(&self, text: &AnonymizedText, skills: &[&str]) -> Result<SkillMatch, DetectorError> {
        let tokens = Self::tokens(text.as_str())?;
        Ok(SkillMatch::partition(skills, |skill| {
            let lowered = skill.to_lowercase();
            let collapsed: String = lowered.split_whitespace().collect();
            [lemmatize(&lowered), lemmatize(&collapsed), lowered, collapsed]
                .iter()
                .any(|variant| tokens.contains(variant))
        }))
    }

    fn name(&self) -> &'static str {
        "token"
    }
}

/// Light English lemmatizer: strips common inflectional suffixes. Applied to both
/// resume tokens and skill names so the two sides agree. Tokens of three letters or
/// fewer (`aws`, `ats`) and tokens containing symbols (`c++`, `ci/cd`) are left alone.
fn lemmatize(token: &str) -> String {
    if token.len() <= 3 || !token.chars().all(|c| c.is_ascii_alphabetic()) {
        return token.to_string();
    }
    if let Some(stem) = token.strip_suffix("ies") {
        return format!("{stem}y");
    }
    for suffix in ["sses", "shes", "ches", "xes"] {
        if token.ends_with(suffix) {
            return token[..token.len() - 2].to_string();
        }
    }
    if token.ends_with('s') && !token.ends_with("ss") && !token.ends_with("us") && !token.ends_with("is") {
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}
