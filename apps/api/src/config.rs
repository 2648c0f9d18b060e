use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434/api/chat";
const DEFAULT_OLLAMA_MODEL: &str = "llama3:latest";
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;
const DEFAULT_SCORING_MODEL_PATH: &str = "models/resume_classifier.json";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Which skill detector backs the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SkillMatcherKind {
    /// Case-insensitive substring containment.
    #[default]
    Keyword,
    /// Tokenized, lemmatized set membership.
    Token,
}

impl std::str::FromStr for SkillMatcherKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "token" | "lemma" => Ok(Self::Token),
            other => bail!("SKILL_MATCHER must be 'keyword' or 'token', got '{other}'"),
        }
    }
}

/// Service configuration loaded from environment variables.
/// Only malformed values fail startup; everything has a default except the database,
/// which is optional (an in-process store is used when it is absent).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub ollama_url: String,
    pub ollama_model: String,
    pub generation_timeout: Duration,
    pub scoring_model_path: PathBuf,
    /// Where embedding weights are cached; the embedder's default when unset.
    pub embedding_cache_dir: Option<PathBuf>,
    pub skill_matcher: SkillMatcherKind,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let generation_timeout_secs = match optional_env("GENERATION_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("GENERATION_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_GENERATION_TIMEOUT_SECS,
        };

        let db_max_connections = match optional_env("DB_MAX_CONNECTIONS") {
            Some(raw) => parse_pool_size(&raw)?,
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            db_max_connections,
            ollama_url: optional_env("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            ollama_model: optional_env("OLLAMA_MODEL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            generation_timeout: Duration::from_secs(generation_timeout_secs),
            scoring_model_path: optional_env("SCORING_MODEL_PATH")
                .unwrap_or_else(|| DEFAULT_SCORING_MODEL_PATH.to_string())
                .into(),
            embedding_cache_dir: optional_env("EMBEDDING_CACHE_DIR").map(PathBuf::from),
            skill_matcher: optional_env("SKILL_MATCHER")
                .map(|raw| raw.parse())
                .transpose()?
                .unwrap_or_default(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn parse_pool_size(raw: &str) -> Result<u32> {
    let size = raw
        .parse::<u32>()
        .context("DB_MAX_CONNECTIONS must be a whole number")?;
    if size == 0 {
        bail!("DB_MAX_CONNECTIONS must be at least 1");
    }
    Ok(size)
}

/// Reads an env var, treating unset and blank the same way.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_matcher_kind_parses_known_values() {
        assert_eq!("keyword".parse::<SkillMatcherKind>().unwrap(), SkillMatcherKind::Keyword);
        assert_eq!(" Token ".parse::<SkillMatcherKind>().unwrap(), SkillMatcherKind::Token);
        assert_eq!("lemma".parse::<SkillMatcherKind>().unwrap(), SkillMatcherKind::Token);
    }

    #[test]
    fn test_skill_matcher_kind_rejects_unknown() {
        let err = "fuzzy".parse::<SkillMatcherKind>().unwrap_err();
        assert!(err.to_string().contains("fuzzy"));
    }

    #[test]
    fn test_pool_size_parsing() {
        assert_eq!(parse_pool_size("25").unwrap(), 25);
        assert!(parse_pool_size("0").is_err());
        assert!(parse_pool_size("ten").is_err());
    }

    #[test]
    fn test_skill_matcher_default_is_keyword() {
        assert_eq!(SkillMatcherKind::default(), SkillMatcherKind::Keyword);
    }
}
