//! Policy Decoder Library
//!
//! LLM-assisted health insurance policy analyzer producing a granular
//! 0-100 Vulnerability Score:
//! - Clause relevance pre-filtering keeps LLM calls at 1-2 per document
//! - Clause Intelligence Extraction via a locally hosted Ollama model
//!   (waiting periods, exclusions, co-payments, hidden limits, alerts)
//! - Actuarial risk engine: expected out-of-pocket projection, claim
//!   rejection probability, financial exposure ratio, exclusion density

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::analyzer::{PolicyAnalysis, PolicyAnalyzer};
pub use crate::core::extraction::ExtractionOutcome;
pub use crate::core::ingest::DocumentFormat;
pub use crate::core::risk_engine::{
    DensityCounts, RiskAssessment, RiskTier, VulnerabilityScore, VulnerabilityScoreBuilder,
};
pub use models::config::DecoderConfig;
pub use models::errors::{AppError, AppResult, ErrorCode};
pub use models::types::{
    ExtractionResult, FilterStats, PolicyholderProfile, PolicyTerms, Severity,
};
pub use providers::ollama::OllamaClient;
pub use utils::cache::{AnalysisCache, CacheStats};
pub use utils::telemetry::{TelemetryCollector, TelemetryStats};
