//! Sentence embeddings for the scorer.
//!
//! Production vectors come from a local ONNX sentence-transformer run through
//! `fastembed`. The model files are fetched into the cache directory on first
//! start and reused afterwards.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::screening::scorer::ScoringError;

/// Text → fixed-dimension vector.
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>, ScoringError>;
}

/// Sentence-transformer checkpoints an artifact may be trained against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentenceModel {
    #[serde(rename = "all-MiniLM-L6-v2")]
    AllMiniLmL6V2,
    #[serde(rename = "all-MiniLM-L12-v2")]
    AllMiniLmL12V2,
    #[serde(rename = "bge-small-en-v1.5")]
    BgeSmallEnV15,
}

impl SentenceModel {
    /// Output width, known without loading the weights.
    pub fn dimension(self) -> usize {
        match self {
            SentenceModel::AllMiniLmL6V2 | SentenceModel::AllMiniLmL12V2 | SentenceModel::BgeSmallEnV15 => 384,
        }
    }
}

#[cfg(feature = "local-embeddings")]
pub use local::SentenceEmbedder;

#[cfg(feature = "local-embeddings")]
mod local {
    use super::*;

    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use parking_lot::Mutex;
    use tracing::info;

    fn fastembed_model(model: SentenceModel) -> EmbeddingModel {
        match model {
            SentenceModel::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
            SentenceModel::AllMiniLmL12V2 => EmbeddingModel::AllMiniLML12V2,
            SentenceModel::BgeSmallEnV15 => EmbeddingModel::BGESmallENV15,
        }
    }

    fn embedding_error(e: impl std::fmt::Display) -> ScoringError {
        ScoringError::Embedding(e.to_string())
    }

    /// ONNX session behind a mutex; the runtime needs exclusive access per run.
    pub struct SentenceEmbedder {
        model: Mutex<TextEmbedding>,
        kind: SentenceModel,
    }

    impl SentenceEmbedder {
        /// Loads the checkpoint, downloading it into `cache_dir` if missing. Blocking.
        pub fn load(kind: SentenceModel, cache_dir: Option<&Path>) -> Result<Self, ScoringError> {
            let mut options = InitOptions::new(fastembed_model(kind)).with_show_download_progress(false);
            if let Some(dir) = cache_dir {
                options = options.with_cache_dir(dir.to_path_buf());
            }
            let model = TextEmbedding::try_new(options).map_err(embedding_error)?;
            info!("Sentence embedder ready ({kind:?}, dimension={})", kind.dimension());
            Ok(Self {
                model: Mutex::new(model),
                kind,
            })
        }
    }

    impl Embedder for SentenceEmbedder {
        fn dimension(&self) -> usize {
            self.kind.dimension()
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>, ScoringError> {
            let mut vectors = self
                .model
                .lock()
                .embed(vec![text], None)
                .map_err(embedding_error)?;
            let vector = vectors
                .pop()
                .ok_or_else(|| ScoringError::Embedding("embedder returned no vector".to_string()))?;
            if vector.len() != self.dimension() {
                return Err(ScoringError::Embedding(format!(
                    "expected {} values, got {}",
                    self.dimension(),
                    vector.len()
                )));
            }
            Ok(vector)
        }
    }
}

#[cfg(not(feature = "local-embeddings"))]
pub fn sentence_embedder(
    kind: SentenceModel,
    _cache_dir: Option<&Path>,
) -> Result<Box<dyn Embedder>, ScoringError> {
    Err(ScoringError::Invalid(format!(
        "artifact needs the {kind:?} sentence embedder but this build has no local-embeddings feature"
    )))
}

#[cfg(feature = "local-embeddings")]
pub fn sentence_embedder(
    kind: SentenceModel,
    cache_dir: Option<&Path>,
) -> Result<Box<dyn Embedder>, ScoringError> {
    Ok(Box::new(SentenceEmbedder::load(kind, cache_dir)?))
}

/// Deterministic stand-in for tests: signed feature hashing over lowercase word
/// tokens, L2-normalised.
#[cfg(test)]
pub struct HashingEmbedder {
    dimension: usize,
}

#[cfg(test)]
impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[cfg(test)]
impl Embedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ScoringError> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut vector = vec![0.0_f32; self.dimension];
        if self.dimension == 0 {
            return Ok(vector);
        }
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let hash = hasher.finish();
            let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
            vector[(hash % self.dimension as u64) as usize] += sign;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_model_wire_names() {
        let model: SentenceModel = serde_json::from_str("\"all-MiniLM-L6-v2\"").unwrap();
        assert_eq!(model, SentenceModel::AllMiniLmL6V2);
        assert_eq!(model.dimension(), 384);
        assert!(serde_json::from_str::<SentenceModel>("\"word2vec\"").is_err());
    }

    #[test]
    fn test_hashing_embedder_is_case_insensitive_and_normalised() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed("Rust, Tokio and Axum services").unwrap();
        let b = embedder.embed("rust tokio AND axum SERVICES").unwrap();
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hashing_embedder_blank_is_zero_vector() {
        let v = HashingEmbedder::new(8).embed("  ...  ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
