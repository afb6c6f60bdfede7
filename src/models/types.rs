//! Core Data Structures
//!
//! Shapes shared across the pipeline: the clause extraction contract
//! returned by the LLM, the policyholder profile, numeric policy terms,
//! and pre-filter statistics.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::utils::constants::{DEFAULT_AGE, DEFAULT_ANNUAL_INCOME, DEFAULT_SUM_INSURED};
use crate::models::errors::{AppError, AppResult};

// ============================================
// Clause extraction contract
// ============================================

/// Alert severity as emitted by the extraction prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
}

impl Severity {
    /// Sort rank, highest first
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 3,
            Severity::High => 2,
            Severity::Medium => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

/// A waiting-period clause: claims for the condition are rejected until
/// the period lapses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitingPeriod {
    #[serde(default)]
    pub condition: String,
    /// Duration as written in the policy, e.g. "2 years"
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub impact: String,
}

/// A treatment or scenario the policy will not pay for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub impact: String,
}

/// A co-payment clause: the policyholder bears a share of every bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoPayment {
    /// As written, e.g. "20%"
    #[serde(default)]
    pub percentage: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub impact: String,
}

/// A sub-limit or cap buried in the policy schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiddenLimit {
    #[serde(default)]
    pub limit: String,
    #[serde(default)]
    pub applies_to: String,
    #[serde(default)]
    pub impact: String,
}

/// A plain-language red flag raised by the extraction pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DangerAlert {
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub message: String,
}

/// Everything one extraction call returns. Field names match the JSON
/// contract in the prompt; missing fields default to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Model's own 0-100 estimate, used downstream as a soft signal
    #[serde(default)]
    pub risk_score: u8,
    #[serde(default)]
    pub waiting_periods: Vec<WaitingPeriod>,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
    #[serde(default)]
    pub co_payment: Vec<CoPayment>,
    #[serde(default)]
    pub hidden_limits: Vec<HiddenLimit>,
    #[serde(default)]
    pub danger_alerts: Vec<DangerAlert>,
}

impl ExtractionResult {
    /// True when no call produced a score or a single item
    pub fn is_empty(&self) -> bool {
        self.risk_score == 0
            && self.waiting_periods.is_empty()
            && self.exclusions.is_empty()
            && self.co_payment.is_empty()
            && self.hidden_limits.is_empty()
            && self.danger_alerts.is_empty()
    }

    /// Merge two extraction results. Risk score = max of both,
    /// lists are concatenated preserving call order.
    pub fn merge(mut self, other: ExtractionResult) -> ExtractionResult {
        self.risk_score = self.risk_score.max(other.risk_score);
        self.waiting_periods.extend(other.waiting_periods);
        self.exclusions.extend(other.exclusions);
        self.co_payment.extend(other.co_payment);
        self.hidden_limits.extend(other.hidden_limits);
        self.danger_alerts.extend(other.danger_alerts);
        self
    }

    /// Total number of extracted items across all categories
    pub fn item_count(&self) -> usize {
        self.waiting_periods.len()
            + self.exclusions.len()
            + self.co_payment.len()
            + self.hidden_limits.len()
            + self.danger_alerts.len()
    }
}

// ============================================
// Policyholder profile
// ============================================

/// Who is being insured. Drives the actuarial side of the score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyholderProfile {
    pub age: u32,
    /// Gross annual income (INR)
    pub annual_income: f64,
    /// Policy sum insured (INR)
    pub sum_insured: f64,
    /// Declared pre-existing conditions (canonical names)
    #[serde(default)]
    pub declared_conditions: Vec<String>,
}

impl Default for PolicyholderProfile {
    fn default() -> Self {
        Self {
            age: DEFAULT_AGE,
            annual_income: DEFAULT_ANNUAL_INCOME,
            sum_insured: DEFAULT_SUM_INSURED,
            declared_conditions: Vec::new(),
        }
    }
}

impl PolicyholderProfile {
    /// Range checks before the profile reaches the risk engine
    pub fn validate(&self) -> AppResult<()> {
        if self.age == 0 || self.age > 120 {
            return Err(AppError::invalid_profile(format!(
                "Age out of range: {}",
                self.age
            )));
        }
        if self.annual_income < 0.0 {
            return Err(AppError::invalid_profile("Annual income cannot be negative"));
        }
        if self.sum_insured <= 0.0 {
            return Err(AppError::invalid_profile("Sum insured must be positive"));
        }
        Ok(())
    }
}

// ============================================
// Parsed policy terms
// ============================================

/// Numeric policy terms, either parsed out of the extraction lists or
/// supplied directly by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyTerms {
    /// Co-payment as a fraction (0.2 for a 20% clause)
    #[serde(default)]
    pub copay_rate: f64,
    /// Conditions currently inside a waiting window, with the duration
    /// string as written in the policy
    #[serde(default)]
    pub waiting_periods: HashMap<String, String>,
    /// Per-condition caps (INR)
    #[serde(default)]
    pub sub_limits: HashMap<String, f64>,
    /// Daily room rent cap (INR), if the policy has one
    #[serde(default)]
    pub room_rent_daily: Option<f64>,
    /// Flat per-claim deductible (INR)
    #[serde(default)]
    pub deductible: f64,
}

impl PolicyTerms {
    pub fn validate(&self) -> AppResult<()> {
        if !(0.0..=1.0).contains(&self.copay_rate) {
            return Err(AppError::new(
                crate::models::errors::ErrorCode::TermInvalidValue,
                format!("Co-pay rate out of range: {}", self.copay_rate),
            ));
        }
        if self.deductible < 0.0 {
            return Err(AppError::new(
                crate::models::errors::ErrorCode::TermInvalidValue,
                "Deductible cannot be negative",
            ));
        }
        Ok(())
    }
}

// ============================================
// Pre-filter statistics
// ============================================

/// Coverage report from the clause relevance pre-filter
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FilterStats {
    pub total_paragraphs: usize,
    pub selected_paragraphs: usize,
    pub total_chars: usize,
    pub filtered_chars: usize,
    /// How much of the document was trimmed away (percent, one decimal)
    pub reduction_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical.rank() > Severity::High.rank());
        assert!(Severity::High.rank() > Severity::Medium.rank());
    }

    #[test]
    fn test_extraction_merge() {
        let a = ExtractionResult {
            risk_score: 40,
            exclusions: vec![Exclusion {
                item: "Cosmetic surgery".into(),
                impact: "Full cost borne by you".into(),
            }],
            ..Default::default()
        };
        let b = ExtractionResult {
            risk_score: 65,
            waiting_periods: vec![WaitingPeriod {
                condition: "Cataract".into(),
                duration: "2 years".into(),
                impact: "Claims rejected for 2 years".into(),
            }],
            ..Default::default()
        };

        let merged = a.merge(b);
        assert_eq!(merged.risk_score, 65);
        assert_eq!(merged.exclusions.len(), 1);
        assert_eq!(merged.waiting_periods.len(), 1);
        assert_eq!(merged.item_count(), 2);
    }

    #[test]
    fn test_profile_validation() {
        assert!(PolicyholderProfile::default().validate().is_ok());

        let bad_age = PolicyholderProfile {
            age: 0,
            ..Default::default()
        };
        assert!(bad_age.validate().is_err());

        let bad_si = PolicyholderProfile {
            sum_insured: 0.0,
            ..Default::default()
        };
        assert!(bad_si.validate().is_err());
    }

    #[test]
    fn test_terms_validation() {
        assert!(PolicyTerms::default().validate().is_ok());

        let bad = PolicyTerms {
            copay_rate: 1.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
