//! Analysis Pipeline
//!
//! Orchestrates the full decode: ingest -> pre-filter -> clause
//! extraction -> term parsing -> actuarial scoring. Completed analyses
//! are cached by document+profile fingerprint so a resubmission within
//! the TTL window costs no LLM calls.

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::extraction::run_extraction;
use crate::core::filter::extract_relevant_text;
use crate::core::ingest::{self, DocumentFormat};
use crate::core::risk_engine::{assess_policy_risk, DensityCounts, RiskAssessment};
use crate::core::terms::{dedupe_extraction, terms_from_extraction};
use crate::models::config::DecoderConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{ExtractionResult, FilterStats, PolicyholderProfile, PolicyTerms};
use crate::providers::ollama::OllamaClient;
use crate::utils::cache::AnalysisCache;
use crate::utils::constants::DEFAULT_LLM_SIGNAL;
use crate::utils::telemetry::TelemetryCollector;

/// Everything one full decode produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyAnalysis {
    pub analysis_id: String,
    /// SHA-256 over document text and profile
    pub fingerprint: String,
    pub filter_stats: FilterStats,
    /// Deduplicated extraction, alerts sorted most severe first
    pub extraction: ExtractionResult,
    pub terms: PolicyTerms,
    pub assessment: RiskAssessment,
    /// Average of the per-call model scores
    pub llm_signal: u8,
    pub latency_ms: u64,
}

/// The decode pipeline with its LLM client, cache, and telemetry
pub struct PolicyAnalyzer {
    config: DecoderConfig,
    client: OllamaClient,
    cache: AnalysisCache,
    telemetry: Arc<TelemetryCollector>,
}

impl PolicyAnalyzer {
    pub fn new(config: DecoderConfig, telemetry: Arc<TelemetryCollector>) -> Self {
        let client = OllamaClient::new(&config);
        let cache = AnalysisCache::with_ttl(config.cache_ttl_secs);
        Self {
            config,
            client,
            cache,
            telemetry,
        }
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    pub fn client(&self) -> &OllamaClient {
        &self.client
    }

    /// Stable identity for a (document, profile) pair
    pub fn fingerprint(text: &str, profile: &PolicyholderProfile) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update(profile.age.to_le_bytes());
        hasher.update(profile.annual_income.to_le_bytes());
        hasher.update(profile.sum_insured.to_le_bytes());
        for condition in &profile.declared_conditions {
            hasher.update(condition.as_bytes());
            hasher.update([0]);
        }
        hex::encode(hasher.finalize())
    }

    /// Full decode from raw document bytes
    pub async fn analyze_document(
        &self,
        bytes: &[u8],
        format: DocumentFormat,
        profile: &PolicyholderProfile,
    ) -> AppResult<PolicyAnalysis> {
        let text = ingest::extract_text(bytes, format)?;
        self.analyze_text(&text, profile).await
    }

    /// Full decode from already-extracted text
    pub async fn analyze_text(
        &self,
        text: &str,
        profile: &PolicyholderProfile,
    ) -> AppResult<PolicyAnalysis> {
        profile.validate()?;

        let fingerprint = Self::fingerprint(text, profile);
        if let Some(hit) = self.cache.get(&fingerprint) {
            return Ok(hit);
        }

        let start = Instant::now();

        let (filtered, filter_stats) = extract_relevant_text(text, self.config.min_score);
        info!(
            total_paragraphs = filter_stats.total_paragraphs,
            selected = filter_stats.selected_paragraphs,
            reduction_pct = filter_stats.reduction_pct,
            "pre-filter complete"
        );

        let outcome = run_extraction(&self.client, &filtered)
            .await?
            .ok_or_else(|| {
                warn!("extraction produced nothing usable");
                AppError::llm_no_extraction()
            })?;

        let llm_signal = average_signal(&outcome.call_scores);
        let mut extraction = dedupe_extraction(outcome.result);
        extraction
            .danger_alerts
            .sort_by(|a, b| b.severity.rank().cmp(&a.severity.rank()));

        let terms = terms_from_extraction(&extraction);
        let counts = DensityCounts::from_extraction(&extraction);
        let assessment = assess_policy_risk(&terms, profile, counts, llm_signal);

        let latency_ms = start.elapsed().as_millis() as u64;
        self.telemetry.record_analysis(
            latency_ms,
            assessment.score.tier,
            assessment.catastrophic_expenditure_warning,
        );

        info!(
            score = assessment.score.total,
            tier = assessment.score.tier.label(),
            items = extraction.item_count(),
            latency_ms,
            "analysis complete"
        );

        let analysis = PolicyAnalysis {
            analysis_id: Uuid::new_v4().to_string(),
            fingerprint: fingerprint.clone(),
            filter_stats,
            extraction,
            terms,
            assessment,
            llm_signal,
            latency_ms,
        };

        self.cache.insert(fingerprint, analysis.clone());
        Ok(analysis)
    }

    /// Clause extraction without a profile or the actuarial pass
    pub async fn extract_clauses(
        &self,
        text: &str,
    ) -> AppResult<(FilterStats, ExtractionResult, u8)> {
        let (filtered, filter_stats) = extract_relevant_text(text, self.config.min_score);

        let outcome = run_extraction(&self.client, &filtered)
            .await?
            .ok_or_else(AppError::llm_no_extraction)?;

        let llm_signal = average_signal(&outcome.call_scores);
        let mut extraction = dedupe_extraction(outcome.result);
        extraction
            .danger_alerts
            .sort_by(|a, b| b.severity.rank().cmp(&a.severity.rank()));

        Ok((filter_stats, extraction, llm_signal))
    }

    /// Actuarial pass on caller-supplied terms; no LLM involvement
    pub fn score_terms(
        &self,
        terms: &PolicyTerms,
        profile: &PolicyholderProfile,
        counts: DensityCounts,
        llm_signal: Option<u8>,
    ) -> AppResult<RiskAssessment> {
        profile.validate()?;
        terms.validate()?;

        let assessment = assess_policy_risk(
            terms,
            profile,
            counts,
            llm_signal.unwrap_or(DEFAULT_LLM_SIGNAL),
        );

        self.telemetry.record_analysis(
            0,
            assessment.score.tier,
            assessment.catastrophic_expenditure_warning,
        );

        Ok(assessment)
    }
}

fn average_signal(call_scores: &[u8]) -> u8 {
    if call_scores.is_empty() {
        return DEFAULT_LLM_SIGNAL;
    }
    let sum: u32 = call_scores.iter().map(|&s| s as u32).sum();
    (sum / call_scores.len() as u32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_stable_and_profile_sensitive() {
        let profile = PolicyholderProfile::default();
        let a = PolicyAnalyzer::fingerprint("policy text", &profile);
        let b = PolicyAnalyzer::fingerprint("policy text", &profile);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let older = PolicyholderProfile {
            age: 60,
            ..Default::default()
        };
        assert_ne!(a, PolicyAnalyzer::fingerprint("policy text", &older));
        assert_ne!(a, PolicyAnalyzer::fingerprint("other text", &profile));
    }

    #[test]
    fn test_average_signal() {
        assert_eq!(average_signal(&[]), DEFAULT_LLM_SIGNAL);
        assert_eq!(average_signal(&[40]), 40);
        assert_eq!(average_signal(&[40, 61]), 50);
    }
}
