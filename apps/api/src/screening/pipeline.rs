//! Screening pipeline: one resume in, one `CandidateReport` out.
//!
//! Flow: anonymize → skills → traits/profile → score → base questions →
//!       question synthesis → report → sink.
//!
//! Stages run sequentially inside one task. Blank input and embedding failures are
//! the only errors; detector errors degrade to empty results and generation
//! failures fall back to deterministic content. Bulk HR screening skips the
//! generation call and uses the fallback set directly. The sink is called once,
//! after the report is complete.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::screening::anonymizer::{anonymize, AnonymizedText};
use crate::screening::behaviour::{infer_profile, infer_traits, ProfileType, Trait, TraitSet};
use crate::screening::catalog::{bank_questions, domain_skills, suggested_courses, suggested_projects};
use crate::screening::scorer::{ScoreResult, ScoringModel};
use crate::screening::sink::{CandidateRecord, CandidateSink, Source};
use crate::screening::skills::{SkillMatch, SkillMatcher};
use crate::screening::synthesizer::{
    fallback_feedback, Feedback, FeedbackSource, QuestionSynthesizer, SynthesisInput,
};

const NO_STRENGTHS: &str = "No domain matching skills detected yet.";
const NO_GAPS: &str = "You covered all skills for this domain!";

/// Used when neither skills, profile nor traits contributed a base question.
const GENERIC_BASE_QUESTIONS: &[&str] = &[
    "Tell me about yourself professionally.",
    "What major project are you most proud of?",
    "How do you handle problem solving?",
];

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationRequest {
    /// Generated when absent.
    #[serde(default)]
    pub candidate_id: Option<Uuid>,
    pub resume_text: String,
    pub domain: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub source: Source,
}

/// Full outcome of one evaluation. Name and email are echoed from the request;
/// nothing here is read back out of the resume's identifying content.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub candidate_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub domain: String,
    pub source: Source,
    /// Winning-label probability, rounded to two decimals.
    pub score: f64,
    pub selected: bool,
    pub scoring: ScoreResult,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub profile_type: ProfileType,
    pub traits: TraitSet,
    /// Question-bank and profile questions, independent of the generation service.
    pub base_questions: Vec<String>,
    pub interview_questions: Vec<String>,
    pub improvement_tips: Vec<String>,
    pub feedback_source: FeedbackSource,
    pub suggested_courses: Vec<String>,
    pub suggested_projects: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl CandidateReport {
    pub fn to_record(&self) -> CandidateRecord {
        CandidateRecord {
            candidate_id: self.candidate_id,
            name: self.name.clone(),
            email: self.email.clone(),
            domain: self.domain.clone(),
            score: self.score,
            selected: self.selected,
            matched_skills: self.matched_skills.clone(),
            missing_skills: self.missing_skills.clone(),
            source: self.source.as_str().to_string(),
            created_at: self.created_at,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

pub struct ScreeningPipeline {
    scorer: Arc<ScoringModel>,
    skill_matcher: Arc<dyn SkillMatcher>,
    synthesizer: QuestionSynthesizer,
    sink: Arc<dyn CandidateSink>,
}

impl ScreeningPipeline {
    pub fn new(
        scorer: Arc<ScoringModel>,
        skill_matcher: Arc<dyn SkillMatcher>,
        synthesizer: QuestionSynthesizer,
        sink: Arc<dyn CandidateSink>,
    ) -> Self {
        Self {
            scorer,
            skill_matcher,
            synthesizer,
            sink,
        }
    }

    /// Evaluates one resume against one domain and persists the summary.
    pub async fn evaluate(&self, request: EvaluationRequest) -> Result<CandidateReport, AppError> {
        if request.resume_text.trim().is_empty() {
            return Err(AppError::Extraction(
                "Resume text is empty; nothing to evaluate.".to_string(),
            ));
        }

        let candidate_id = request.candidate_id.unwrap_or_else(Uuid::new_v4);
        let domain = request.domain.trim().to_string();
        info!(
            "Evaluating candidate {} for domain '{}' ({} chars, matcher={})",
            candidate_id,
            domain,
            request.resume_text.len(),
            self.skill_matcher.name()
        );

        let text = anonymize(&request.resume_text);

        let skills = self.match_skills(&text, &domain);
        let traits = infer_traits(&text).unwrap_or_else(|e| {
            warn!("Trait detection failed, continuing without traits: {e}");
            TraitSet::new()
        });
        let profile_type = infer_profile(&text);

        let scoring = self.scorer.score(&text)?;
        let score = scoring.rounded();
        info!(
            "Candidate {} scored {:.2} ({:?}), {} of {} skills found",
            candidate_id,
            score,
            scoring.label,
            skills.found.len(),
            skills.found.len() + skills.missing.len()
        );

        let strengths = strength_messages(&skills);
        let improvements = gap_messages(&skills);
        let base_questions = base_questions(&skills, profile_type, &traits);

        let feedback = match request.source {
            Source::HrBulk => fallback_feedback(&domain),
            Source::CandidatePortal => {
                self.synthesizer
                    .synthesize(&SynthesisInput {
                        domain: &domain,
                        score,
                        strengths: &strengths,
                        improvement_areas: &improvements,
                        resume: &text,
                    })
                    .await
            }
        };
        let Feedback {
            questions: interview_questions,
            improvements: improvement_tips,
            source: feedback_source,
        } = feedback;

        let report = CandidateReport {
            candidate_id,
            name: request.name.filter(|n| !n.trim().is_empty()),
            email: request.email.filter(|e| !e.trim().is_empty()),
            suggested_courses: to_owned(suggested_courses(&domain)),
            suggested_projects: to_owned(suggested_projects(&domain)),
            domain,
            source: request.source,
            score,
            selected: scoring.is_selected(),
            scoring,
            matched_skills: skills.found,
            missing_skills: skills.missing,
            strengths,
            improvements,
            profile_type,
            traits,
            base_questions,
            interview_questions,
            improvement_tips,
            feedback_source,
            created_at: Utc::now(),
        };

        self.sink.save(&report.to_record()).await;
        Ok(report)
    }

    fn match_skills(&self, text: &AnonymizedText, domain: &str) -> SkillMatch {
        let skills = domain_skills(domain);
        if skills.is_empty() {
            warn!("Unknown domain '{domain}', no skills to match");
        }
        self.skill_matcher
            .match_skills(text, skills)
            .unwrap_or_else(|e| {
                warn!("Skill detection failed, treating every skill as missing: {e}");
                SkillMatch::none_found(skills)
            })
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn strength_messages(skills: &SkillMatch) -> Vec<String> {
    if skills.found.is_empty() {
        vec![NO_STRENGTHS.to_string()]
    } else {
        vec![format!("You already know: {}", skills.found.join(", "))]
    }
}

fn gap_messages(skills: &SkillMatch) -> Vec<String> {
    if skills.missing.is_empty() {
        vec![NO_GAPS.to_string()]
    } else {
        vec![format!("Improve in: {}", skills.missing.join(", "))]
    }
}

/// Bank questions for every found skill, then profile and trait prompts.
fn base_questions(skills: &SkillMatch, profile: ProfileType, traits: &TraitSet) -> Vec<String> {
    let mut questions: Vec<String> = skills
        .found
        .iter()
        .flat_map(|skill| bank_questions(skill).iter().map(|q| q.to_string()))
        .collect();

    let profile_questions: &[&str] = match profile {
        ProfileType::ProjectOriented => &[
            "Explain a complex project you built end-to-end.",
            "What was your biggest architecture decision?",
        ],
        ProfileType::Balanced => &["Explain how you applied theory into projects."],
        ProfileType::TheoryOriented => {
            &["You seem theory-strong, so how do you plan to build real projects?"]
        }
        ProfileType::Neutral => &[],
    };
    questions.extend(profile_questions.iter().map(|q| q.to_string()));

    for (t, question) in [
        (Trait::Leadership, "Describe a time when you led a team."),
        (Trait::Communication, "How do you handle client communication?"),
        (Trait::ProblemSolving, "Tell me about a difficult technical bug you solved."),
    ] {
        if traits.contains(&t) {
            questions.push(question.to_string());
        }
    }

    if questions.is_empty() {
        questions = to_owned(GENERIC_BASE_QUESTIONS);
    }
    questions
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::llm_client::{ChatCompletion, LlmError};
    use crate::screening::scorer::test_model;
    use crate::screening::sink::MemoryCandidateSink;
    use crate::screening::skills::{DetectorError, KeywordSkillMatcher};
    use crate::screening::synthesizer::MIN_QUESTIONS;

    const DS_RESUME: &str = "Priya Sharma\n\
        priya@example.com | +91 98765 43210\n\
        Data analyst with four years of experience in retail forecasting\n\
        Built demand models with NumPy and Pandas and presented results to stakeholders.\n\
        Developed a churn project and designed dashboards for the sales team.";

    struct Unavailable;

    #[async_trait]
    impl ChatCompletion for Unavailable {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            Err(LlmError::EmptyContent)
        }
    }

    struct Canned;

    #[async_trait]
    impl ChatCompletion for Canned {
        async fn complete(&self, _system: &str, user: &str) -> Result<String, LlmError> {
            assert!(!user.contains("priya@example.com"));
            Ok(r#"{"questions": ["How did you validate the churn model?"], "improvements": ["Quantify forecast accuracy."]}"#.to_string())
        }
    }

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatCompletion for Counting {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::EmptyContent)
        }
    }

    struct Broken;

    impl SkillMatcher for Broken {
        fn match_skills(&self, _text: &AnonymizedText, _skills: &[&str]) -> Result<SkillMatch, DetectorError> {
            Err(DetectorError::Pattern(regex::Error::Syntax("forced".to_string())))
        }
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn pipeline(
        client: Arc<dyn ChatCompletion>,
        matcher: Arc<dyn SkillMatcher>,
        sink: Arc<MemoryCandidateSink>,
    ) -> ScreeningPipeline {
        ScreeningPipeline::new(
            Arc::new(test_model(16, 1.5)),
            matcher,
            QuestionSynthesizer::new(client, Duration::from_secs(5)),
            sink,
        )
    }

    fn request(text: &str, domain: &str) -> EvaluationRequest {
        EvaluationRequest {
            candidate_id: None,
            resume_text: text.to_string(),
            domain: domain.to_string(),
            name: Some("Priya".to_string()),
            email: Some("priya@example.com".to_string()),
            source: Source::CandidatePortal,
        }
    }

    #[tokio::test]
    async fn test_data_science_evaluation_with_service_down() {
        let sink = Arc::new(MemoryCandidateSink::new());
        let pipeline = pipeline(Arc::new(Unavailable), Arc::new(KeywordSkillMatcher), sink.clone());

        let report = pipeline.evaluate(request(DS_RESUME, "data_science")).await.unwrap();

        assert!(report.matched_skills.contains(&"numpy".to_string()));
        assert!(report.matched_skills.contains(&"pandas".to_string()));
        assert!(report.missing_skills.contains(&"tensorflow".to_string()));
        assert!(report.strengths[0].starts_with("You already know: "));
        assert!(report.strengths[0].contains("numpy"));
        assert!(report.strengths[0].contains("pandas"));
        assert!(report.improvements[0].starts_with("Improve in: "));
        assert!(report.selected);
        assert_eq!(report.score, 0.82);

        assert_eq!(report.feedback_source, FeedbackSource::Fallback);
        assert_eq!(report.interview_questions.len(), MIN_QUESTIONS);

        // bank questions for found skills come first
        assert_eq!(report.base_questions[0], bank_questions("numpy")[0]);
        assert_eq!(report.profile_type, ProfileType::ProjectOriented);
        assert!(report.traits.contains(&Trait::Communication));
        assert!(!report.suggested_courses.is_empty());

        assert_eq!(sink.len().await, 1);
        let stored = &sink.recent(1).await.unwrap().candidates[0];
        assert_eq!(stored.candidate_id, report.candidate_id);
        assert_eq!(stored.source, "candidate_portal");
        assert_eq!(stored.email.as_deref(), Some("priya@example.com"));
    }

    #[tokio::test]
    async fn test_generated_feedback_is_used_and_topped_up() {
        let sink = Arc::new(MemoryCandidateSink::new());
        let pipeline = pipeline(Arc::new(Canned), Arc::new(KeywordSkillMatcher), sink);

        let report = pipeline.evaluate(request(DS_RESUME, "data_science")).await.unwrap();
        assert_eq!(report.feedback_source, FeedbackSource::Generated);
        assert_eq!(report.interview_questions[0], "How did you validate the churn model?");
        assert_eq!(report.interview_questions.len(), MIN_QUESTIONS);
        assert_eq!(report.improvement_tips, vec!["Quantify forecast accuracy."]);
    }

    #[tokio::test]
    async fn test_bulk_screening_skips_generation_call() {
        let sink = Arc::new(MemoryCandidateSink::new());
        let client = Arc::new(Counting::default());
        let pipeline = pipeline(client.clone(), Arc::new(KeywordSkillMatcher), sink.clone());

        let mut req = request(DS_RESUME, "data_science");
        req.source = Source::HrBulk;
        let report = pipeline.evaluate(req).await.unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.feedback_source, FeedbackSource::Fallback);
        assert_eq!(report.interview_questions.len(), MIN_QUESTIONS);
        assert_eq!(report.score, 0.82);
        assert_eq!(sink.recent(1).await.unwrap().candidates[0].source, "hr_bulk");
    }

    #[tokio::test]
    async fn test_candidate_portal_requests_generation_once() {
        let sink = Arc::new(MemoryCandidateSink::new());
        let client = Arc::new(Counting::default());
        let pipeline = pipeline(client.clone(), Arc::new(KeywordSkillMatcher), sink);

        pipeline.evaluate(request(DS_RESUME, "data_science")).await.unwrap();
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_resume_is_extraction_error_and_not_persisted() {
        let sink = Arc::new(MemoryCandidateSink::new());
        let pipeline = pipeline(Arc::new(Unavailable), Arc::new(KeywordSkillMatcher), sink.clone());

        let err = pipeline.evaluate(request("  \n ", "data_science")).await.unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
        assert_eq!(sink.len().await, 0);
    }

    #[tokio::test]
    async fn test_detector_failure_degrades_to_all_missing() {
        let sink = Arc::new(MemoryCandidateSink::new());
        let pipeline = pipeline(Arc::new(Unavailable), Arc::new(Broken), sink);

        let report = pipeline.evaluate(request(DS_RESUME, "data_science")).await.unwrap();
        assert!(report.matched_skills.is_empty());
        assert_eq!(report.missing_skills.len(), domain_skills("data_science").len());
        assert_eq!(report.strengths, vec![NO_STRENGTHS.to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_domain_has_no_skills_but_still_reports() {
        let sink = Arc::new(MemoryCandidateSink::new());
        let pipeline = pipeline(Arc::new(Unavailable), Arc::new(KeywordSkillMatcher), sink);

        let report = pipeline.evaluate(request(DS_RESUME, "astronomy")).await.unwrap();
        assert!(report.matched_skills.is_empty());
        assert!(report.missing_skills.is_empty());
        assert_eq!(report.improvements, vec![NO_GAPS.to_string()]);
        assert_eq!(report.interview_questions.len(), MIN_QUESTIONS);
    }

    #[tokio::test]
    async fn test_reevaluation_with_same_id_replaces_record() {
        let sink = Arc::new(MemoryCandidateSink::new());
        let pipeline = pipeline(Arc::new(Unavailable), Arc::new(KeywordSkillMatcher), sink.clone());
        let id = Uuid::new_v4();

        for domain in ["data_science", "web_development"] {
            let mut req = request(DS_RESUME, domain);
            req.candidate_id = Some(id);
            pipeline.evaluate(req).await.unwrap();
        }

        assert_eq!(sink.len().await, 1);
        assert_eq!(sink.recent(5).await.unwrap().candidates[0].domain, "web_development");
    }

    #[test]
    fn test_base_questions_fall_back_to_generic() {
        let questions = base_questions(&SkillMatch::default(), ProfileType::Neutral, &TraitSet::new());
        assert_eq!(questions, to_owned(GENERIC_BASE_QUESTIONS));
    }

    #[test]
    fn test_base_questions_follow_traits() {
        let traits = TraitSet::from([Trait::Leadership, Trait::ProblemSolving]);
        let questions = base_questions(&SkillMatch::default(), ProfileType::Balanced, &traits);
        assert_eq!(
            questions,
            vec![
                "Explain how you applied theory into projects.",
                "Describe a time when you led a team.",
                "Tell me about a difficult technical bug you solved.",
            ]
        );
    }

    #[test]
    fn test_request_defaults() {
        let req: EvaluationRequest =
            serde_json::from_str(r#"{"resume_text": "x", "domain": "data_science"}"#).unwrap();
        assert!(req.candidate_id.is_none());
        assert_eq!(req.source, Source::CandidatePortal);
    }
}
