use axum::{
    extract::{multipart::Field, rejection::JsonRejection, Multipart, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::screening::catalog::DOMAINS;
use crate::screening::extract::extract_text_blocking;
use crate::screening::pipeline::{CandidateReport, EvaluationRequest};
use crate::screening::sink::{CandidateListing, Source};
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Serialize)]
pub struct DomainSummary {
    pub key: &'static str,
    pub skills: &'static [&'static str],
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct BulkProcessed {
    pub candidate_id: Uuid,
    pub file: String,
    pub score: f64,
    pub selected: bool,
    pub matched_skills: Vec<String>,
}

#[derive(Serialize)]
pub struct BulkSkipped {
    pub file: String,
    pub reason: String,
}

#[derive(Serialize)]
pub struct BulkEvaluationResponse {
    pub domain: String,
    pub processed: Vec<BulkProcessed>,
    pub skipped: Vec<BulkSkipped>,
}

struct UploadedFile {
    file_name: String,
    bytes: Vec<u8>,
}

fn require_domain(domain: Option<String>) -> Result<String, AppError> {
    domain
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::Validation("Job domain is required.".to_string()))
}

fn multipart_error(e: impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("Malformed multipart body: {e}"))
}

async fn read_file(field: Field<'_>) -> Result<UploadedFile, AppError> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let bytes = field.bytes().await.map_err(multipart_error)?.to_vec();
    Ok(UploadedFile { file_name, bytes })
}

/// GET /api/v1/domains
pub async fn handle_list_domains() -> Json<Vec<DomainSummary>> {
    Json(
        DOMAINS
            .iter()
            .map(|d| DomainSummary {
                key: d.key,
                skills: d.skills,
            })
            .collect(),
    )
}

/// POST /api/v1/evaluations
/// Bodies that do not deserialize (bad JSON, missing fields) are validation errors.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    body: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Result<Json<CandidateReport>, AppError> {
    let Json(mut req) = body.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    req.domain = require_domain(Some(req.domain))?;
    let report = state.pipeline.evaluate(req).await?;
    Ok(Json(report))
}

/// POST /api/v1/evaluations/upload
/// Multipart fields: `resume` (file), `domain`, optional `name` and `email`.
pub async fn handle_evaluate_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CandidateReport>, AppError> {
    let mut resume = None;
    let mut domain = None;
    let mut name = None;
    let mut email = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "resume" => resume = Some(read_file(field).await?),
            "domain" => domain = Some(field.text().await.map_err(multipart_error)?),
            "name" => name = Some(field.text().await.map_err(multipart_error)?),
            "email" => email = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let resume = resume
        .filter(|f| !f.bytes.is_empty())
        .ok_or_else(|| AppError::Validation("No resume file provided.".to_string()))?;
    let domain = require_domain(domain)?;

    let resume_text = extract_text_blocking(resume.file_name, resume.bytes).await?;
    let report = state
        .pipeline
        .evaluate(EvaluationRequest {
            candidate_id: None,
            resume_text,
            domain,
            name: name.map(|n| n.trim().to_string()),
            email: email.map(|e| e.trim().to_string()),
            source: Source::CandidatePortal,
        })
        .await?;

    Ok(Json(report))
}

/// POST /api/v1/evaluations/bulk
/// Multipart fields: one or more `resumes` files and a `domain`. Files that cannot
/// be read are skipped and reported, not fatal. Bulk screening only scores; no
/// per-file question generation is requested.
pub async fn handle_evaluate_bulk(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BulkEvaluationResponse>, AppError> {
    let mut files = Vec::new();
    let mut domain = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "resumes" => files.push(read_file(field).await?),
            "domain" => domain = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    if files.is_empty() {
        return Err(AppError::Validation("No resumes uploaded.".to_string()));
    }
    let domain = require_domain(domain)?;
    info!("Bulk screening {} resumes for domain '{}'", files.len(), domain);

    let mut processed = Vec::with_capacity(files.len());
    let mut skipped = Vec::new();

    for file in files {
        let file_name = file.file_name.clone();
        let outcome = match extract_text_blocking(file.file_name, file.bytes).await {
            Ok(resume_text) => {
                state
                    .pipeline
                    .evaluate(EvaluationRequest {
                        candidate_id: None,
                        resume_text,
                        domain: domain.clone(),
                        name: Some(file_name.clone()),
                        email: None,
                        source: Source::HrBulk,
                    })
                    .await
            }
            Err(e) => Err(e.into()),
        };

        match outcome {
            Ok(report) => processed.push(BulkProcessed {
                candidate_id: report.candidate_id,
                file: file_name,
                score: report.score,
                selected: report.selected,
                matched_skills: report.matched_skills,
            }),
            Err(e) => {
                warn!("Skipping {file_name} in bulk upload: {e}");
                skipped.push(BulkSkipped {
                    file: file_name,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(Json(BulkEvaluationResponse {
        domain,
        processed,
        skipped,
    }))
}

/// GET /api/v1/candidates?limit=N
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<CandidateListing>, AppError> {
    let limit = params.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIST_LIMIT);
    let listing = state.sink.recent(limit).await?;
    Ok(Json(listing))
}
