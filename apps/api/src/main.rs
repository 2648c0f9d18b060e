mod config;
mod db;
mod errors;
mod llm_client;
mod routes;
mod screening;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, SkillMatcherKind};
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::screening::pipeline::ScreeningPipeline;
use crate::screening::scorer::ScoringModel;
use crate::screening::sink::{CandidateSink, MemoryCandidateSink, PgCandidateSink};
use crate::screening::skills::{KeywordSkillMatcher, SkillMatcher, TokenSkillMatcher};
use crate::screening::synthesizer::QuestionSynthesizer;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    // Load the scoring model once; it is shared read-only for the process lifetime.
    // The first start downloads embedding weights, so this runs off the async workers.
    let model_path = config.scoring_model_path.clone();
    let cache_dir = config.embedding_cache_dir.clone();
    let scorer = tokio::task::spawn_blocking(move || {
        ScoringModel::load(&model_path, cache_dir.as_deref())
    })
    .await?
    .with_context(|| {
        format!(
            "failed to load scoring model from {}",
            config.scoring_model_path.display()
        )
    })?;

    // Candidate sink: PostgreSQL when configured, in-process otherwise
    let sink: Arc<dyn CandidateSink> = match &config.database_url {
        Some(url) => {
            let pg = PgCandidateSink::new(create_pool(url, config.db_max_connections).await?);
            pg.ensure_schema().await?;
            Arc::new(pg)
        }
        None => {
            info!("DATABASE_URL not set, candidate summaries are kept in memory");
            Arc::new(MemoryCandidateSink::new())
        }
    };

    // Initialize generation-service client
    let llm = LlmClient::new(
        config.ollama_url.clone(),
        config.ollama_model.clone(),
        config.generation_timeout,
    )?;
    info!(
        "LLM client initialized (model: {}, timeout: {:?})",
        llm.model(),
        config.generation_timeout
    );

    let skill_matcher = build_skill_matcher(config.skill_matcher);
    info!("Skill matcher: {}", skill_matcher.name());

    let pipeline = ScreeningPipeline::new(
        Arc::new(scorer),
        skill_matcher,
        QuestionSynthesizer::new(Arc::new(llm), config.generation_timeout),
        sink.clone(),
    );

    // Build app state
    let state = AppState {
        pipeline: Arc::new(pipeline),
        sink,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the HR dashboard host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_skill_matcher(kind: SkillMatcherKind) -> Arc<dyn SkillMatcher> {
    match kind {
        SkillMatcherKind::Keyword => Arc::new(KeywordSkillMatcher),
        SkillMatcherKind::Token => Arc::new(TokenSkillMatcher),
    }
}
