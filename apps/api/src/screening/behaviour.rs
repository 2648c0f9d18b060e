//! Behavioural signals: pattern-based trait detection and a coarse
//! project-vs-theory profile.
//!
//! Detection is deliberately cheap and low-recall: one regex per trait, checked on
//! the lowercased text, and a plain indicator-word count for the profile. Negation
//! is not handled ("did not build anything" still counts as "build").

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::screening::anonymizer::AnonymizedText;
use crate::screening::skills::DetectorError;

/// Controlled trait vocabulary. Ordering fixes the order traits are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trait {
    Leadership,
    Communication,
    ProblemSolving,
    Teamwork,
    SelfLearning,
    Innovation,
}

pub type TraitSet = BTreeSet<Trait>;

const TRAIT_PATTERNS: &[(Trait, &str)] = &[
    (Trait::Leadership, r"(led|managed|supervised|team lead|mentored|organized|guided)"),
    (Trait::Communication, r"(presented|communicated|collaborated|client interaction|stakeholder)"),
    (Trait::ProblemSolving, r"(debugged|optimized|resolved|diagnosed|analyzed)"),
    (Trait::Teamwork, r"(worked with|collaborated|team|cross-functional)"),
    (Trait::SelfLearning, r"(self learned|self-taught|certification|training|bootcamp|hackathon)"),
    (Trait::Innovation, r"(built|developed|designed|created|invented|prototype)"),
];

const PROJECT_INDICATORS: &[&str] = &["project", "implemented", "built", "created", "developed", "designed"];

/// Coarse orientation of a candidate's resume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    ProjectOriented,
    Balanced,
    TheoryOriented,
    /// No profiling signal was available.
    #[default]
    Neutral,
}

fn compiled_patterns() -> Result<&'static [(Trait, Regex)], DetectorError> {
    static PATTERNS: OnceLock<Result<Vec<(Trait, Regex)>, regex::Error>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            TRAIT_PATTERNS
                .iter()
                .map(|(t, p)| Regex::new(p).map(|re| (*t, re)))
                .collect()
        })
        .as_ref()
        .map(Vec::as_slice)
        .map_err(|e| DetectorError::Pattern(e.clone()))
}

/// Every trait whose pattern matches anywhere in the text. Traits are independent.
pub fn infer_traits(text: &AnonymizedText) -> Result<TraitSet, DetectorError> {
    let lowered = text.as_str().to_lowercase();
    Ok(compiled_patterns()?
        .iter()
        .filter(|(_, re)| re.is_match(&lowered))
        .map(|(t, _)| *t)
        .collect())
}

/// Number of distinct indicator words present (each word counts at most once).
pub fn project_indicator_hits(text: &AnonymizedText) -> usize {
    let lowered = text.as_str().to_lowercase();
    PROJECT_INDICATORS
        .iter()
        .filter(|word| lowered.contains(*word))
        .count()
}

/// ≥3 indicator hits → project oriented, ≥1 → balanced, none → theory oriented.
pub fn infer_profile(text: &AnonymizedText) -> ProfileType {
    match project_indicator_hits(text) {
        0 => ProfileType::TheoryOriented,
        1 | 2 => ProfileType::Balanced,
        _ => ProfileType::ProjectOriented,
    }
}
