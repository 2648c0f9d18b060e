//! Candidate persistence: one summary row per evaluated resume, plus the reporting
//! query behind the HR candidate list.
//!
//! `save` is fire-and-report: a storage failure is logged and swallowed so it can
//! never fail an evaluation whose report is already built.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

/// Where an evaluation request came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    #[default]
    CandidatePortal,
    HrBulk,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::CandidatePortal => "candidate_portal",
            Source::HrBulk => "hr_bulk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CandidateRecord {
    pub candidate_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub domain: String,
    /// Winning-label probability, rounded to two decimals.
    pub score: f64,
    pub selected: bool,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateStats {
    pub total: i64,
    pub selected: i64,
    pub rejected: i64,
    /// `None` when nothing has been stored yet.
    pub avg_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateListing {
    pub candidates: Vec<CandidateRecord>,
    pub stats: CandidateStats,
}

#[async_trait]
pub trait CandidateSink: Send + Sync {
    /// Inserts or replaces the record with the same `candidate_id`. Never fails.
    async fn save(&self, record: &CandidateRecord);

    /// The `limit` most recent records, newest first, with stats over all records.
    async fn recent(&self, limit: i64) -> Result<CandidateListing, sqlx::Error>;
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ────────────────────────────────────────────────────────────────────────────

pub struct PgCandidateSink {
    pool: PgPool,
}

#[derive(FromRow)]
struct StatsRow {
    total: i64,
    selected: i64,
    avg_score: Option<f64>,
}

impl PgCandidateSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `candidates` table and its recency index if missing.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS candidates (
                candidate_id   UUID PRIMARY KEY,
                name           TEXT,
                email          TEXT,
                domain         TEXT NOT NULL,
                score          DOUBLE PRECISION NOT NULL,
                selected       BOOLEAN NOT NULL DEFAULT FALSE,
                matched_skills TEXT[] NOT NULL DEFAULT '{}',
                missing_skills TEXT[] NOT NULL DEFAULT '{}',
                source         TEXT NOT NULL,
                created_at     TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS candidates_created_at_idx ON candidates (created_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        info!("candidates table ready");
        Ok(())
    }

    async fn upsert(&self, record: &CandidateRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO candidates
                (candidate_id, name, email, domain, score, selected,
                 matched_skills, missing_skills, source, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (candidate_id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                domain = EXCLUDED.domain,
                score = EXCLUDED.score,
                selected = EXCLUDED.selected,
                matched_skills = EXCLUDED.matched_skills,
                missing_skills = EXCLUDED.missing_skills,
                source = EXCLUDED.source,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(record.candidate_id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.domain)
        .bind(record.score)
        .bind(record.selected)
        .bind(&record.matched_skills)
        .bind(&record.missing_skills)
        .bind(&record.source)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CandidateSink for PgCandidateSink {
    async fn save(&self, record: &CandidateRecord) {
        match self.upsert(record).await {
            Ok(()) => info!("Saved candidate summary {}", record.candidate_id),
            Err(e) => warn!(
                "Failed to save candidate summary {}: {e}",
                record.candidate_id
            ),
        }
    }

    async fn recent(&self, limit: i64) -> Result<CandidateListing, sqlx::Error> {
        let candidates = sqlx::query_as::<_, CandidateRecord>(
            r#"
            SELECT candidate_id, name, email, domain, score, selected,
                   matched_skills, missing_skills, source, created_at
            FROM candidates
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE selected) AS selected,
                   AVG(score) AS avg_score
            FROM candidates
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CandidateListing {
            candidates,
            stats: CandidateStats {
                total: row.total,
                selected: row.selected,
                rejected: row.total - row.selected,
                avg_score: row.avg_score,
            },
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

/// Records kept by the in-process sink before the oldest are evicted.
const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

/// Process-local sink, used when no database is configured and in tests.
/// Bounded: once full, saving a new id evicts the oldest record.
pub struct MemoryCandidateSink {
    records: RwLock<HashMap<Uuid, CandidateRecord>>,
    capacity: usize,
}

impl Default for MemoryCandidateSink {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }
}

impl MemoryCandidateSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl CandidateSink for MemoryCandidateSink {
    async fn save(&self, record: &CandidateRecord) {
        let mut records = self.records.write().await;
        if !records.contains_key(&record.candidate_id) && records.len() >= self.capacity {
            let oldest = records
                .values()
                .min_by_key(|r| r.created_at)
                .map(|r| r.candidate_id);
            if let Some(id) = oldest {
                records.remove(&id);
                warn!("In-memory candidate store full, evicted {id}");
            }
        }
        records.insert(record.candidate_id, record.clone());
    }

    async fn recent(&self, limit: i64) -> Result<CandidateListing, sqlx::Error> {
        let records = self.records.read().await;

        let mut candidates: Vec<CandidateRecord> = records.values().cloned().collect();
        candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        candidates.truncate(usize::try_from(limit).unwrap_or(0));

        let total = records.len() as i64;
        let selected = records.values().filter(|r| r.selected).count() as i64;
        let avg_score = (!records.is_empty())
            .then(|| records.values().map(|r| r.score).sum::<f64>() / records.len() as f64);

        Ok(CandidateListing {
            candidates,
            stats: CandidateStats {
                total,
                selected,
                rejected: total - selected,
                avg_score,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn record(score: f64, selected: bool, minutes_ago: i64) -> CandidateRecord {
        CandidateRecord {
            candidate_id: Uuid::new_v4(),
            name: None,
            email: None,
            domain: "data_science".to_string(),
            score,
            selected,
            matched_skills: vec!["numpy".to_string()],
            missing_skills: vec!["tensorflow".to_string()],
            source: Source::CandidatePortal.as_str().to_string(),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn test_memory_sink_replaces_same_id() {
        let sink = MemoryCandidateSink::new();
        let mut first = record(0.4, false, 5);
        sink.save(&first).await;

        first.score = 0.9;
        first.selected = true;
        sink.save(&first).await;

        assert_eq!(sink.len().await, 1);
        let listing = sink.recent(10).await.unwrap();
        assert_eq!(listing.candidates[0].score, 0.9);
        assert_eq!(listing.stats.selected, 1);
    }

    #[tokio::test]
    async fn test_memory_sink_recent_is_newest_first_and_limited() {
        let sink = MemoryCandidateSink::new();
        let old = record(0.2, false, 30);
        let mid = record(0.6, true, 10);
        let new = record(0.8, true, 1);
        for r in [&mid, &old, &new] {
            sink.save(r).await;
        }

        let listing = sink.recent(2).await.unwrap();
        let ids: Vec<Uuid> = listing.candidates.iter().map(|r| r.candidate_id).collect();
        assert_eq!(ids, vec![new.candidate_id, mid.candidate_id]);

        // stats cover every record, not just the returned page
        assert_eq!(listing.stats.total, 3);
        assert_eq!(listing.stats.selected, 2);
        assert_eq!(listing.stats.rejected, 1);
        let avg = listing.stats.avg_score.unwrap();
        assert!((avg - (0.2 + 0.6 + 0.8) / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_memory_sink_evicts_oldest_when_full() {
        let sink = MemoryCandidateSink::with_capacity(2);
        let old = record(0.2, false, 30);
        let mid = record(0.6, true, 10);
        let new = record(0.8, true, 1);
        for r in [&old, &mid, &new] {
            sink.save(r).await;
        }

        assert_eq!(sink.len().await, 2);
        let ids: Vec<Uuid> = sink
            .recent(10)
            .await
            .unwrap()
            .candidates
            .iter()
            .map(|r| r.candidate_id)
            .collect();
        assert_eq!(ids, vec![new.candidate_id, mid.candidate_id]);

        // replacing an existing id never evicts
        sink.save(&mid).await;
        assert_eq!(sink.len().await, 2);
    }

    #[tokio::test]
    async fn test_memory_sink_empty_stats() {
        let listing = MemoryCandidateSink::new().recent(50).await.unwrap();
        assert!(listing.candidates.is_empty());
        assert_eq!(listing.stats, CandidateStats::default());
    }

    #[test]
    fn test_source_wire_names() {
        assert_eq!(Source::HrBulk.as_str(), "hr_bulk");
        assert_eq!(serde_json::to_string(&Source::CandidatePortal).unwrap(), "\"candidate_portal\"");
        assert_eq!(Source::default(), Source::CandidatePortal);
    }
}
