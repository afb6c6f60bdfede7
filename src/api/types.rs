//! API Request/Response Types

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::core::analyzer::PolicyAnalysis;
use crate::core::risk_engine::{
    ConditionExposure, DensityCounts, RiskAssessment, ScoreComponents, ScoreFactor,
};
use crate::models::errors::AppError;
use crate::models::types::{
    CoPayment, DangerAlert, Exclusion, ExtractionResult, FilterStats, HiddenLimit,
    PolicyholderProfile, PolicyTerms, WaitingPeriod,
};
use crate::utils::cache::CacheStats;
use crate::utils::constants::fmt_inr;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "API_BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            code: "API_UNAUTHORIZED".to_string(),
            message: "Invalid or missing API key".to_string(),
            details: None,
        }
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            code: "API_RATE_LIMITED".to_string(),
            message: format!("Rate limit exceeded. Retry after {} seconds", retry_after),
            details: Some(format!("retry_after: {}", retry_after)),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "API_INTERNAL_ERROR".to_string(),
            message: message.into(),
            details: None,
        }
    }
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: err.source.as_ref().map(|s| s.to_string()),
        }
    }
}

// ============================================
// Policy Analysis
// ============================================

#[derive(Debug, Deserialize)]
pub struct PolicyAnalysisRequest {
    /// Policy document content: plain text, Markdown, or HTML
    pub document: String,
    /// Optional filename hint for format detection
    #[serde(default)]
    pub filename: Option<String>,
    /// Policyholder profile; fields default when omitted
    #[serde(default)]
    pub profile: PolicyholderProfile,
}

#[derive(Debug, Serialize)]
pub struct PolicyAnalysisData {
    pub analysis_id: String,
    pub vulnerability: VulnerabilityData,
    pub clauses: ClauseSummary,
    /// Numeric terms parsed out of the clause lists
    pub terms: PolicyTerms,
    pub filter_stats: FilterStats,
    /// Average of the per-call model scores
    pub llm_signal: u8,
    pub analysis_latency_ms: u64,
}

impl From<PolicyAnalysis> for PolicyAnalysisData {
    fn from(analysis: PolicyAnalysis) -> Self {
        Self {
            analysis_id: analysis.analysis_id,
            vulnerability: analysis.assessment.into(),
            clauses: analysis.extraction.into(),
            terms: analysis.terms,
            filter_stats: analysis.filter_stats,
            llm_signal: analysis.llm_signal,
            analysis_latency_ms: analysis.latency_ms,
        }
    }
}

/// The Vulnerability Score with its full transparency breakdown
#[derive(Debug, Serialize)]
pub struct VulnerabilityData {
    pub total: u8,
    pub tier: String,
    pub tier_detail: String,
    /// Hex color for UI meters
    pub color: String,
    pub expected_oop_5yr: f64,
    /// INR display string for the headline number
    pub expected_oop_display: String,
    pub rejection_probability_pct: f64,
    pub financial_exposure_pct: f64,
    pub exclusion_density_pct: f64,
    pub catastrophic_expenditure_warning: bool,
    pub components: ScoreComponents,
    pub factors: Vec<ScoreFactor>,
    pub condition_breakdown: BTreeMap<String, ConditionExposure>,
}

impl From<RiskAssessment> for VulnerabilityData {
    fn from(assessment: RiskAssessment) -> Self {
        Self {
            total: assessment.score.total,
            tier: assessment.score.tier.label().to_string(),
            tier_detail: assessment.score.tier.detail().to_string(),
            color: assessment.score.color_code().to_string(),
            expected_oop_5yr: assessment.expected_oop_5yr,
            expected_oop_display: fmt_inr(assessment.expected_oop_5yr),
            rejection_probability_pct: assessment.rejection_probability_pct,
            financial_exposure_pct: assessment.financial_exposure_pct,
            exclusion_density_pct: assessment.exclusion_density_pct,
            catastrophic_expenditure_warning: assessment.catastrophic_expenditure_warning,
            components: assessment.score.components,
            factors: assessment.score.factors,
            condition_breakdown: assessment.condition_breakdown,
        }
    }
}

/// The extracted clause lists, alerts first
#[derive(Debug, Serialize)]
pub struct ClauseSummary {
    pub danger_alerts: Vec<DangerAlert>,
    pub waiting_periods: Vec<WaitingPeriod>,
    pub exclusions: Vec<Exclusion>,
    pub co_payment: Vec<CoPayment>,
    pub hidden_limits: Vec<HiddenLimit>,
}

impl From<ExtractionResult> for ClauseSummary {
    fn from(extraction: ExtractionResult) -> Self {
        Self {
            danger_alerts: extraction.danger_alerts,
            waiting_periods: extraction.waiting_periods,
            exclusions: extraction.exclusions,
            co_payment: extraction.co_payment,
            hidden_limits: extraction.hidden_limits,
        }
    }
}

// ============================================
// Clause Extraction
// ============================================

#[derive(Debug, Deserialize)]
pub struct ClauseExtractionRequest {
    pub document: String,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClauseExtractionData {
    pub filter_stats: FilterStats,
    pub clauses: ClauseSummary,
    pub llm_signal: u8,
}

// ============================================
// Risk Scoring (no LLM)
// ============================================

#[derive(Debug, Deserialize)]
pub struct RiskScoreRequest {
    /// Explicit policy terms, e.g. corrected by the user after review
    pub terms: PolicyTerms,
    #[serde(default)]
    pub profile: PolicyholderProfile,
    /// Clause counts for the exclusion-density component
    #[serde(default)]
    pub counts: DensityCounts,
    /// Optional model signal carried over from a previous extraction
    #[serde(default)]
    pub llm_signal: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct RiskScoreData {
    pub vulnerability: VulnerabilityData,
}

// ============================================
// Stats / Health
// ============================================

#[derive(Debug, Serialize)]
pub struct StatsData {
    pub total_analyzed: u64,
    pub high_risk_detected: u64,
    pub catastrophic_warnings: u64,
    pub by_tier: HashMap<String, u64>,
    pub avg_latency_ms: f64,
    pub cache: CacheStats,
    pub uptime_seconds: u64,
    pub api_version: String,
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
