//! Scoring: resume text → sentence embedding → calibrated label probabilities.
//!
//! The classifier head is trained offline on sentence-transformer embeddings and
//! shipped as a JSON artifact naming the checkpoint it was trained against. It is
//! loaded once at startup into an immutable `ScoringModel` and shared as
//! `Arc<ScoringModel>`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::screening::anonymizer::AnonymizedText;
use crate::screening::embeddings::{sentence_embedder, Embedder, SentenceModel};

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("model artifact is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),

    #[error("embedding failed: {0}")]
    Embedding(String),
}

/// Classifier output classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Selected,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelProbability {
    pub label: Label,
    pub probability: f64,
}

/// One scoring decision.
///
/// `probability` is the probability of the winning `label`, which is what the
/// persisted score carries. A rejected candidate with `probability` 0.9 is a
/// confident rejection, not a likely hire; read `selected_probability` for P(selected).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub probability: f64,
    pub label: Label,
    /// Per-label probabilities in model label order; empty when the model was not run.
    pub probabilities: Vec<LabelProbability>,
    pub selected_probability: f64,
}

impl ScoreResult {
    /// Policy outcome for unreadable or empty resumes.
    pub fn empty_input() -> Self {
        Self {
            probability: 0.0,
            label: Label::Rejected,
            probabilities: vec![],
            selected_probability: 0.0,
        }
    }

    pub fn is_selected(&self) -> bool {
        self.label == Label::Selected
    }

    /// Winning probability rounded to two decimal places.
    pub fn rounded(&self) -> f64 {
        (self.probability * 100.0).round() / 100.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Classifier
// ────────────────────────────────────────────────────────────────────────────

/// Logistic regression. One coefficient row with two labels is the binary form
/// (`P(labels[1]) = σ(w·x + b)`); one row per label is multinomial (softmax).
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    labels: Vec<Label>,
    coefficients: Vec<Vec<f32>>,
    intercepts: Vec<f32>,
}

impl LogisticClassifier {
    pub fn new(
        labels: Vec<Label>,
        coefficients: Vec<Vec<f32>>,
        intercepts: Vec<f32>,
    ) -> Result<Self, ScoringError> {
        if labels.len() < 2 {
            return Err(ScoringError::Invalid("at least two labels are required".to_string()));
        }
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(ScoringError::Invalid(format!("duplicate label {label:?}")));
            }
        }

        let binary = coefficients.len() == 1 && labels.len() == 2;
        if !binary && coefficients.len() != labels.len() {
            return Err(ScoringError::Invalid(format!(
                "{} coefficient rows for {} labels",
                coefficients.len(),
                labels.len()
            )));
        }
        if intercepts.len() != coefficients.len() {
            return Err(ScoringError::Invalid(format!(
                "{} intercepts for {} coefficient rows",
                intercepts.len(),
                coefficients.len()
            )));
        }

        let width = coefficients[0].len();
        if width == 0 || coefficients.iter().any(|row| row.len() != width) {
            return Err(ScoringError::Invalid(
                "coefficient rows must be non-empty and equally wide".to_string(),
            ));
        }
        let all_finite = coefficients
            .iter()
            .flatten()
            .chain(intercepts.iter())
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(ScoringError::Invalid("non-finite weight".to_string()));
        }

        Ok(Self {
            labels,
            coefficients,
            intercepts,
        })
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn input_dimension(&self) -> usize {
        self.coefficients[0].len()
    }

    /// Probabilities aligned with `labels()`, summing to 1.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f64> {
        let logits: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| {
                row.iter()
                    .zip(features)
                    .map(|(w, x)| f64::from(*w) * f64::from(*x))
                    .sum::<f64>()
                    + f64::from(*b)
            })
            .collect();

        if logits.len() == 1 {
            let positive = sigmoid(logits[0]);
            return vec![1.0 - positive, positive];
        }
        softmax(&logits)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Artifact + model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbeddingSpec {
    Sentence { model: SentenceModel },
}

impl EmbeddingSpec {
    pub fn dimension(&self) -> usize {
        match self {
            EmbeddingSpec::Sentence { model } => model.dimension(),
        }
    }
}

/// On-disk form of a trained model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub labels: Vec<Label>,
    pub embedding: EmbeddingSpec,
    pub coefficients: Vec<Vec<f32>>,
    pub intercepts: Vec<f32>,
}

impl ModelArtifact {
    pub fn read(path: &Path) -> Result<Self, ScoringError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ScoringError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Validates the classifier head against the embedding it was trained on.
    /// Runs before any embedding weights are fetched.
    pub fn classifier(&self) -> Result<LogisticClassifier, ScoringError> {
        let classifier = LogisticClassifier::new(
            self.labels.clone(),
            self.coefficients.clone(),
            self.intercepts.clone(),
        )?;
        if classifier.input_dimension() != self.embedding.dimension() {
            return Err(ScoringError::Invalid(format!(
                "embedding dimension {} does not match classifier input {}",
                self.embedding.dimension(),
                classifier.input_dimension()
            )));
        }
        Ok(classifier)
    }
}

/// Embedding function + classifier, immutable after construction.
pub struct ScoringModel {
    embedder: Box<dyn Embedder>,
    classifier: LogisticClassifier,
}

impl ScoringModel {
    pub fn new(embedder: Box<dyn Embedder>, classifier: LogisticClassifier) -> Result<Self, ScoringError> {
        if embedder.dimension() != classifier.input_dimension() {
            return Err(ScoringError::Invalid(format!(
                "embedding dimension {} does not match classifier input {}",
                embedder.dimension(),
                classifier.input_dimension()
            )));
        }
        Ok(Self {
            embedder,
            classifier,
        })
    }

    /// Reads and validates an artifact, then loads its embedder. Blocking; called
    /// once at startup.
    pub fn load(path: &Path, cache_dir: Option<&Path>) -> Result<Self, ScoringError> {
        let artifact = ModelArtifact::read(path)?;
        let classifier = artifact.classifier()?;
        let embedder = match artifact.embedding {
            EmbeddingSpec::Sentence { model } => sentence_embedder(model, cache_dir)?,
        };
        let model = Self::new(embedder, classifier)?;
        info!(
            "Scoring model loaded from {} (labels={:?}, embedding={:?})",
            path.display(),
            model.classifier.labels(),
            artifact.embedding
        );
        Ok(model)
    }

    /// Scores a resume. Blank text is rejected with probability 0.0 without running
    /// the model.
    pub fn score(&self, text: &AnonymizedText) -> Result<ScoreResult, ScoringError> {
        if text.is_blank() {
            return Ok(ScoreResult::empty_input());
        }

        let features = self.embedder.embed(text.as_str())?;
        let probs = self.classifier.predict_proba(&features);

        // first maximum wins ties
        let best = probs
            .iter()
            .enumerate()
            .fold(0, |best, (i, p)| if *p > probs[best] { i } else { best });

        let probabilities: Vec<LabelProbability> = self
            .classifier
            .labels()
            .iter()
            .zip(&probs)
            .map(|(label, probability)| LabelProbability {
                label: *label,
                probability: *probability,
            })
            .collect();

        let selected_probability = probabilities
            .iter()
            .find(|lp| lp.label == Label::Selected)
            .map(|lp| lp.probability)
            .unwrap_or(0.0);

        Ok(ScoreResult {
            probability: probs[best],
            label: self.classifier.labels()[best],
            probabilities,
            selected_probability,
        })
    }
}

/// Binary model over the hashing test embedder with all-zero weights, so the
/// intercept alone sets the logit.
#[cfg(test)]
pub fn test_model(dimension: usize, intercept: f32) -> ScoringModel {
    use crate::screening::embeddings::HashingEmbedder;

    let classifier = LogisticClassifier::new(
        vec![Label::Rejected, Label::Selected],
        vec![vec![0.0; dimension]],
        vec![intercept],
    )
    .expect("valid test classifier");
    ScoringModel::new(Box::new(HashingEmbedder::new(dimension)), classifier)
        .expect("matching test dimensions")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::screening::anonymizer::anonymize;
    use crate::screening::embeddings::HashingEmbedder;

    const RESUME: &str = "Engineering resume with a long first line of content\nBuilt a pandas pipeline.";

    fn sentence_artifact(width: usize) -> ModelArtifact {
        ModelArtifact {
            labels: vec![Label::Rejected, Label::Selected],
            embedding: EmbeddingSpec::Sentence {
                model: SentenceModel::AllMiniLmL6V2,
            },
            coefficients: vec![vec![0.0; width]],
            intercepts: vec![0.0],
        }
    }

    /// Puts all weight on one coordinate so tests control the logit exactly.
    struct UnitEmbedder;

    impl Embedder for UnitEmbedder {
        fn dimension(&self) -> usize {
            2
        }
        fn embed(&self, _text: &str) -> Result<Vec<f32>, ScoringError> {
            Ok(vec![1.0, 0.0])
        }
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn dimension(&self) -> usize {
            4
        }
        fn embed(&self, _text: &str) -> Result<Vec<f32>, ScoringError> {
            Err(ScoringError::Embedding("session closed".to_string()))
        }
    }

    #[test]
    fn test_empty_text_is_rejected_without_model() {
        let classifier =
            LogisticClassifier::new(vec![Label::Rejected, Label::Selected], vec![vec![0.0; 4]], vec![5.0])
                .unwrap();
        // the failing embedder proves the model never runs on blank input
        let model = ScoringModel::new(Box::new(FailingEmbedder), classifier).unwrap();
        for blank in ["", "   ", "\n\t"] {
            let result = model.score(&anonymize(blank)).unwrap();
            assert_eq!(result.probability, 0.0);
            assert_eq!(result.label, Label::Rejected);
            assert!(result.probabilities.is_empty());
        }
    }

    #[test]
    fn test_embedding_failure_is_reported() {
        let classifier =
            LogisticClassifier::new(vec![Label::Rejected, Label::Selected], vec![vec![0.0; 4]], vec![0.0])
                .unwrap();
        let model = ScoringModel::new(Box::new(FailingEmbedder), classifier).unwrap();
        assert!(matches!(
            model.score(&anonymize(RESUME)),
            Err(ScoringError::Embedding(_))
        ));
    }

    #[test]
    fn test_binary_positive_intercept_selects() {
        let result = test_model(16, 2.0).score(&anonymize(RESUME)).unwrap();
        assert_eq!(result.label, Label::Selected);
        assert!((result.probability - sigmoid(2.0)).abs() < 1e-9);
        assert_eq!(result.selected_probability, result.probability);
        assert_eq!(result.rounded(), 0.88);
    }

    #[test]
    fn test_rejected_score_is_winning_label_probability() {
        let result = test_model(16, -1.0).score(&anonymize(RESUME)).unwrap();
        assert_eq!(result.label, Label::Rejected);
        assert!(result.probability > 0.7);
        assert!((result.selected_probability - (1.0 - result.probability)).abs() < 1e-9);
    }

    #[test]
    fn test_probabilities_sum_to_one_multinomial() {
        let classifier = LogisticClassifier::new(
            vec![Label::Rejected, Label::Selected],
            vec![vec![0.3, -1.2], vec![-0.7, 2.5]],
            vec![0.1, -0.4],
        )
        .unwrap();
        let model = ScoringModel::new(Box::new(UnitEmbedder), classifier).unwrap();
        let result = model.score(&anonymize(RESUME)).unwrap();
        let total: f64 = result.probabilities.iter().map(|p| p.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
        // logits: 0.3 + 0.1 = 0.4 vs -0.7 - 0.4 = -1.1
        assert_eq!(result.label, Label::Rejected);
    }

    #[test]
    fn test_ties_pick_first_label() {
        let result = test_model(4, 0.0).score(&anonymize(RESUME)).unwrap();
        assert_eq!(result.label, Label::Rejected);
        assert_eq!(result.probability, 0.5);
    }

    #[test]
    fn test_embedder_dimension_mismatch_rejected() {
        let classifier =
            LogisticClassifier::new(vec![Label::Rejected, Label::Selected], vec![vec![0.0; 8]], vec![0.0])
                .unwrap();
        assert!(matches!(
            ScoringModel::new(Box::new(HashingEmbedder::new(16)), classifier),
            Err(ScoringError::Invalid(_))
        ));
    }

    #[test]
    fn test_artifact_width_must_match_sentence_model() {
        assert!(sentence_artifact(384).classifier().is_ok());
        let err = sentence_artifact(128).classifier().unwrap_err();
        assert!(err.to_string().contains("384"));
    }

    #[test]
    fn test_row_count_mismatch_rejected() {
        let err = LogisticClassifier::new(
            vec![Label::Rejected, Label::Selected],
            vec![vec![0.0; 4], vec![0.0; 4], vec![0.0; 4]],
            vec![0.0; 3],
        )
        .unwrap_err();
        assert!(err.to_string().contains("3 coefficient rows"));
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        assert!(LogisticClassifier::new(
            vec![Label::Selected, Label::Selected],
            vec![vec![0.0; 4]],
            vec![0.0],
        )
        .is_err());
    }

    #[test]
    fn test_read_artifact_wire_format() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"labels":["rejected","selected"],"embedding":{{"kind":"sentence","model":"all-MiniLM-L6-v2"}},"coefficients":[[0.5,-0.5]],"intercepts":[0.0]}}"#
        )
        .unwrap();
        let artifact = ModelArtifact::read(file.path()).unwrap();
        assert_eq!(artifact.embedding.dimension(), 384);
        // two weights cannot serve a 384-wide embedding
        assert!(matches!(artifact.classifier(), Err(ScoringError::Invalid(_))));
    }

    #[test]
    fn test_load_rejects_bad_artifact_before_fetching_weights() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&sentence_artifact(16)).unwrap();
        file.write_all(json.as_bytes()).unwrap();
        assert!(matches!(
            ScoringModel::load(file.path(), None),
            Err(ScoringError::Invalid(_))
        ));
    }

    #[test]
    fn test_unknown_embedding_kind_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"labels":["rejected","selected"],"embedding":{{"kind":"hashing","dimension":2}},"coefficients":[[0.5,-0.5]],"intercepts":[0.0]}}"#
        )
        .unwrap();
        assert!(matches!(ModelArtifact::read(file.path()), Err(ScoringError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = ScoringModel::load(Path::new("/nonexistent/model.json"), None).err().unwrap();
        assert!(matches!(err, ScoringError::Io { .. }));
    }
}
