//! API Request Handlers

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::types::*;
use crate::core::analyzer::PolicyAnalyzer;
use crate::core::ingest::DocumentFormat;
use crate::models::config::DecoderConfig;
use crate::models::errors::AppError;
use crate::utils::constants::APP_VERSION;
use crate::utils::telemetry::TelemetryCollector;

/// Shared application state
pub struct AppState {
    pub analyzer: Arc<PolicyAnalyzer>,
    pub telemetry: Arc<TelemetryCollector>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: DecoderConfig, telemetry: Arc<TelemetryCollector>) -> Self {
        let analyzer = Arc::new(PolicyAnalyzer::new(config, telemetry.clone()));

        // Background task: evict expired assessments every 60 seconds
        let cache = analyzer.cache().clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                interval.tick().await;
                cache.cleanup_expired();
            }
        });

        Self {
            analyzer,
            telemetry,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

type HandlerError = (StatusCode, Json<ApiResponse<()>>);

fn fail(err: AppError, start: Instant) -> HandlerError {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiResponse::error(
            ApiError::from(&err),
            start.elapsed().as_secs_f64() * 1000.0,
        )),
    )
}

fn detect_format(document: &str, filename: Option<&str>) -> DocumentFormat {
    match filename {
        Some(name) => DocumentFormat::from_filename(name),
        None => DocumentFormat::sniff(document),
    }
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

// ============================================
// Policy Analysis
// ============================================

pub async fn analyze_policy(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PolicyAnalysisRequest>,
) -> Result<Json<ApiResponse<PolicyAnalysisData>>, HandlerError> {
    let start = Instant::now();

    let format = detect_format(&req.document, req.filename.as_deref());

    let analysis = state
        .analyzer
        .analyze_document(req.document.as_bytes(), format, &req.profile)
        .await
        .map_err(|e| fail(e, start))?;

    info!(
        analysis_id = %analysis.analysis_id,
        score = analysis.assessment.score.total,
        "policy analysis served"
    );

    Ok(Json(ApiResponse::success(
        analysis.into(),
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}

// ============================================
// Clause Extraction (no actuarial pass)
// ============================================

pub async fn extract_clauses(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClauseExtractionRequest>,
) -> Result<Json<ApiResponse<ClauseExtractionData>>, HandlerError> {
    let start = Instant::now();

    let format = detect_format(&req.document, req.filename.as_deref());
    let text = crate::core::ingest::extract_text(req.document.as_bytes(), format)
        .map_err(|e| fail(e, start))?;

    let (filter_stats, extraction, llm_signal) = state
        .analyzer
        .extract_clauses(&text)
        .await
        .map_err(|e| fail(e, start))?;

    let data = ClauseExtractionData {
        filter_stats,
        clauses: extraction.into(),
        llm_signal,
    };

    Ok(Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}

// ============================================
// Risk Scoring (explicit terms, no LLM)
// ============================================

pub async fn score_risk(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RiskScoreRequest>,
) -> Result<Json<ApiResponse<RiskScoreData>>, HandlerError> {
    let start = Instant::now();

    let assessment = state
        .analyzer
        .score_terms(&req.terms, &req.profile, req.counts, req.llm_signal)
        .map_err(|e| fail(e, start))?;

    let data = RiskScoreData {
        vulnerability: assessment.into(),
    };

    Ok(Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}

// ============================================
// Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();

    let stats = state.telemetry.get_stats();
    let data = StatsData {
        total_analyzed: stats.total_analyzed,
        high_risk_detected: stats.high_risk_detected,
        catastrophic_warnings: stats.catastrophic_warnings,
        by_tier: stats.by_tier,
        avg_latency_ms: stats.avg_latency_ms,
        cache: state.analyzer.cache().stats(),
        uptime_seconds: state.uptime_seconds(),
        api_version: APP_VERSION.to_string(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}
