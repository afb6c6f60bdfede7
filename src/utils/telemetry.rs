//! Telemetry Module
//!
//! Anonymous operational statistics: analysis volume, latency, and the
//! distribution of vulnerability tiers detected. Privacy-first: no
//! document text, no clause content, no policyholder data is ever
//! recorded here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::risk_engine::RiskTier;
use crate::models::errors::AppResult;

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Aggregated statistics for reporting
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelemetryStats {
    /// Total policies analyzed
    pub total_analyzed: u64,
    /// Analyses that landed in the High tier
    pub high_risk_detected: u64,
    /// Analyses with a catastrophic-expenditure warning
    pub catastrophic_warnings: u64,
    /// Tier label -> count
    pub by_tier: HashMap<String, u64>,
    /// Average analysis latency (ms)
    pub avg_latency_ms: f64,
    /// Period start timestamp
    pub period_start: u64,
    /// Period end timestamp
    pub period_end: u64,
}

/// Collector shared across the API handlers and the CLI
pub struct TelemetryCollector {
    total_analyzed: AtomicU64,
    high_risk_detected: AtomicU64,
    catastrophic_warnings: AtomicU64,
    latency_sum_ms: AtomicU64,
    by_tier: RwLock<HashMap<String, u64>>,
    period_start: u64,
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self {
            total_analyzed: AtomicU64::new(0),
            high_risk_detected: AtomicU64::new(0),
            catastrophic_warnings: AtomicU64::new(0),
            latency_sum_ms: AtomicU64::new(0),
            by_tier: RwLock::new(HashMap::new()),
            period_start: current_timestamp(),
        }
    }

    /// Record one completed analysis
    pub fn record_analysis(&self, latency_ms: u64, tier: RiskTier, catastrophic: bool) {
        self.total_analyzed.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_ms.fetch_add(latency_ms, Ordering::Relaxed);

        if tier == RiskTier::High {
            self.high_risk_detected.fetch_add(1, Ordering::Relaxed);
        }
        if catastrophic {
            self.catastrophic_warnings.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut by_tier) = self.by_tier.write() {
            *by_tier.entry(tier.label().to_string()).or_insert(0) += 1;
        }
    }

    pub fn get_stats(&self) -> TelemetryStats {
        let total = self.total_analyzed.load(Ordering::Relaxed);
        let latency_sum = self.latency_sum_ms.load(Ordering::Relaxed);

        TelemetryStats {
            total_analyzed: total,
            high_risk_detected: self.high_risk_detected.load(Ordering::Relaxed),
            catastrophic_warnings: self.catastrophic_warnings.load(Ordering::Relaxed),
            by_tier: self
                .by_tier
                .read()
                .map(|m| m.clone())
                .unwrap_or_default(),
            avg_latency_ms: if total > 0 {
                latency_sum as f64 / total as f64
            } else {
                0.0
            },
            period_start: self.period_start,
            period_end: current_timestamp(),
        }
    }

    /// Write current stats to a JSON file. Target directory comes from
    /// DECODER_TELEMETRY_DIR, defaulting to the working directory.
    pub fn export_stats_json(&self) -> AppResult<PathBuf> {
        let dir = std::env::var("DECODER_TELEMETRY_DIR").unwrap_or_else(|_| ".".to_string());
        let path = PathBuf::from(dir).join("decoder_stats.json");

        let stats = self.get_stats();
        let json = serde_json::to_string_pretty(&stats)?;

        let mut file = fs::File::create(&path)?;
        file.write_all(json.as_bytes())?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_aggregate() {
        let telemetry = TelemetryCollector::new();
        telemetry.record_analysis(120, RiskTier::High, true);
        telemetry.record_analysis(80, RiskTier::Low, false);

        let stats = telemetry.get_stats();
        assert_eq!(stats.total_analyzed, 2);
        assert_eq!(stats.high_risk_detected, 1);
        assert_eq!(stats.catastrophic_warnings, 1);
        assert_eq!(stats.avg_latency_ms, 100.0);
        assert_eq!(stats.by_tier.get("High Risk"), Some(&1));
        assert_eq!(stats.by_tier.get("Low Risk"), Some(&1));
    }

    #[test]
    fn test_empty_stats() {
        let stats = TelemetryCollector::new().get_stats();
        assert_eq!(stats.total_analyzed, 0);
        assert_eq!(stats.avg_latency_ms, 0.0);
    }
}
