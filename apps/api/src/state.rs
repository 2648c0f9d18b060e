use std::sync::Arc;

use crate::screening::pipeline::ScreeningPipeline;
use crate::screening::sink::CandidateSink;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ScreeningPipeline>,
    /// Same sink the pipeline writes to; read by the candidate listing.
    pub sink: Arc<dyn CandidateSink>,
}
