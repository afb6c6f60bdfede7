//! Actuarial Risk Engine
//!
//! Turns extracted policy terms plus a policyholder profile into a
//! granular 0-100 Vulnerability Score instead of a binary good/bad
//! verdict. Three actuarial components feed the composite:
//!
//! 1. Financial Exposure Ratio (38%) - expected out-of-pocket spend
//!    against disposable income, per the WHO catastrophic-expenditure
//!    framing
//! 2. Claim Rejection Probability (32%) - probability-weighted chance of
//!    at least one rejection, driven by waiting periods
//! 3. Exclusion Density (22%) - how loaded the policy is with
//!    exclusions, waiting periods, hidden limits, and co-pays
//!
//! The model's own reading of the policy text rides along as an 8% soft
//! signal. Every component contributes a named, weighted factor to the
//! transparency breakdown.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::types::{ExtractionResult, PolicyholderProfile, PolicyTerms};
use crate::utils::constants::{
    age_band_index, disease_prevalence, known_conditions, treatment_cost,
    ASSUMED_STANDARD_ROOM_RENT, CATASTROPHIC_FER, COMPOSITE_WEIGHTS, DENSITY_SIGMOID_MIDPOINT,
    DENSITY_SIGMOID_SLOPE, DENSITY_WEIGHTS, DISPOSABLE_INCOME_SHARE, MAX_ANNUAL_PROBABILITY,
    PROJECTION_YEARS, ROOM_RENT_BILL_SHARE, TIER_THRESHOLDS,
};

// ============================================
// Probability model
// ============================================

/// Age-stratified probability of hospitalization for a condition in a
/// given year. Declared pre-existing conditions are forced to 1.0 by
/// the caller (certain cost).
pub fn disease_probability(age: u32, condition: &str) -> f64 {
    disease_prevalence(condition)[age_band_index(age)]
}

// ============================================
// Expected out-of-pocket
// ============================================

/// Per-condition exposure detail, kept for transparency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionExposure {
    pub annual_probability: f64,
    pub treatment_cost: f64,
    pub expected_oop_5yr: f64,
    pub in_waiting_period: bool,
    pub sub_limit_shortfall: f64,
    pub copay_exposure: f64,
}

/// Output of the expected-value pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OopProjection {
    /// Expected out-of-pocket spend over the projection horizon (INR)
    pub total_oop_5yr: f64,
    /// Probability of at least one claim rejection
    pub rejection_probability: f64,
    /// Per-condition detail, keyed by canonical condition name
    pub breakdown: BTreeMap<String, ConditionExposure>,
}

fn round0(v: f64) -> f64 {
    v.round()
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Expected out-of-pocket calculator.
///
/// Actuarial Expected Value per condition:
///   E[OOP] = P(claim) x [max(0, TreatmentCost - SumInsured)
///            + CoPay% x min(TreatmentCost, SumInsured)
///            + SubLimit shortfall]
/// projected over the 5-year horizon with compound probability
/// `1 - (1-p)^5`. A condition inside a waiting period bears the full
/// treatment cost and contributes its probability to rejection risk.
pub fn expected_out_of_pocket(
    terms: &PolicyTerms,
    age: u32,
    declared: &[String],
    sum_insured: f64,
) -> OopProjection {
    let mut total_oop = 0.0;
    let mut no_rejection_prob = 1.0;
    let mut breakdown = BTreeMap::new();

    for condition in known_conditions() {
        let is_declared = declared
            .iter()
            .any(|d| d.eq_ignore_ascii_case(condition));
        let p = if is_declared {
            1.0
        } else {
            disease_probability(age, condition)
        };
        let cost = treatment_cost(condition);

        // Room rent cap below standard proportionately reduces the
        // room-linked share of the bill
        let room_rent_penalty = match terms.room_rent_daily {
            Some(cap) if cap < ASSUMED_STANDARD_ROOM_RENT => {
                let proportion = cap / ASSUMED_STANDARD_ROOM_RENT;
                cost * (1.0 - proportion) * ROOM_RENT_BILL_SHARE
            }
            _ => 0.0,
        };

        // Sub-limit shortfall (sub-limit defaults to the sum insured)
        let sub_limit = terms
            .sub_limits
            .get(condition)
            .copied()
            .unwrap_or(sum_insured);
        let sub_limit_shortfall = (cost - sub_limit).max(0.0);

        // Flat deductible per claim
        let deductible_exposure = terms.deductible.min(cost);

        // Co-pay on the admissible amount (after sub-limit)
        let admissible = (cost.min(sub_limit) - terms.deductible).max(0.0);
        let copay_exposure = admissible * terms.copay_rate;

        // Sum-insured exhaustion
        let si_shortfall = (cost - sum_insured).max(0.0);

        let gross_oop = sub_limit_shortfall
            + deductible_exposure
            + copay_exposure
            + si_shortfall
            + room_rent_penalty;

        // Waiting period means full claim rejection during the window
        let in_waiting = terms.waiting_periods.contains_key(condition);
        let rejection_contribution = if in_waiting { p } else { 0.0 };

        // P(at least one event over the horizon) = 1 - (1-p)^years
        let five_year_p = 1.0 - (1.0 - p.min(MAX_ANNUAL_PROBABILITY)).powi(PROJECTION_YEARS as i32);
        let oop_5yr = if in_waiting {
            cost
        } else {
            five_year_p * gross_oop
        };

        total_oop += oop_5yr;
        no_rejection_prob *= 1.0 - rejection_contribution;

        breakdown.insert(
            condition.to_string(),
            ConditionExposure {
                annual_probability: round3(p),
                treatment_cost: cost,
                expected_oop_5yr: round0(oop_5yr),
                in_waiting_period: in_waiting,
                sub_limit_shortfall: round0(sub_limit_shortfall),
                copay_exposure: round0(copay_exposure),
            },
        );
    }

    OopProjection {
        total_oop_5yr: round0(total_oop),
        rejection_probability: round4(1.0 - no_rejection_prob),
        breakdown,
    }
}

// ============================================
// Component scores
// ============================================

/// Expected OOP over disposable income for the horizon, clamped to 1.0.
/// FER above 0.3 is the standard "catastrophic" threshold (WHO
/// definition of catastrophic health expenditure).
pub fn financial_exposure_ratio(expected_oop_5yr: f64, annual_income: f64) -> f64 {
    if annual_income <= 0.0 {
        return 1.0;
    }
    let disposable_5yr = annual_income * PROJECTION_YEARS as f64 * DISPOSABLE_INCOME_SHARE;
    (expected_oop_5yr / disposable_5yr).min(1.0)
}

/// How many restrictive clauses each category contributed
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DensityCounts {
    pub exclusions: usize,
    pub waiting_periods: usize,
    pub hidden_limits: usize,
    pub co_payments: usize,
}

impl DensityCounts {
    pub fn from_extraction(extraction: &ExtractionResult) -> Self {
        Self {
            exclusions: extraction.exclusions.len(),
            waiting_periods: extraction.waiting_periods.len(),
            hidden_limits: extraction.hidden_limits.len(),
            co_payments: extraction.co_payment.len(),
        }
    }
}

/// 0-1 exclusion burden via sigmoid normalization of the weighted
/// clause counts. 1 = maximum exclusion burden.
pub fn exclusion_density(counts: DensityCounts) -> f64 {
    let raw = counts.exclusions as f64 * DENSITY_WEIGHTS[0]
        + counts.waiting_periods as f64 * DENSITY_WEIGHTS[1]
        + counts.hidden_limits as f64 * DENSITY_WEIGHTS[2]
        + counts.co_payments as f64 * DENSITY_WEIGHTS[3];

    1.0 / (1.0 + (-DENSITY_SIGMOID_SLOPE * (raw - DENSITY_SIGMOID_MIDPOINT)).exp())
}

// ============================================
// Vulnerability score
// ============================================

/// Vulnerability tiers with advisory copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    High,
    Moderate,
    LowModerate,
    Low,
}

impl RiskTier {
    pub fn from_score(score: u8) -> Self {
        if score >= TIER_THRESHOLDS[0] {
            Self::High
        } else if score >= TIER_THRESHOLDS[1] {
            Self::Moderate
        } else if score >= TIER_THRESHOLDS[2] {
            Self::LowModerate
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High Risk",
            Self::Moderate => "Moderate Risk",
            Self::LowModerate => "Low-Moderate Risk",
            Self::Low => "Low Risk",
        }
    }

    pub fn detail(&self) -> &'static str {
        match self {
            Self::High => {
                "This policy poses serious financial risk. Claim rejection likelihood is high \
                 and out-of-pocket costs could be catastrophic."
            }
            Self::Moderate => {
                "Significant exclusions or waiting periods exist. You may face sizeable \
                 out-of-pocket expenses."
            }
            Self::LowModerate => {
                "Policy has some limitations but is generally manageable. Review waiting \
                 periods before filing claims."
            }
            Self::Low => "Policy appears transparent and claimant-friendly.",
        }
    }
}

/// Individual component scores (each 0-100)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub financial_exposure: f64,
    pub rejection_risk: f64,
    pub exclusion_density: f64,
    pub llm_signal: u8,
}

/// Individual factor contributing to the score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreFactor {
    pub name: String,
    pub score: f64,
    pub weight: f64,
    pub reason: String,
}

/// Granular Vulnerability Score (0-100)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulnerabilityScore {
    /// Overall score (0-100)
    pub total: u8,
    pub tier: RiskTier,
    /// Individual component scores
    pub components: ScoreComponents,
    /// Detailed breakdown for transparency
    pub factors: Vec<ScoreFactor>,
}

impl VulnerabilityScore {
    /// Weighted composite of the component scores
    pub fn calculate(components: ScoreComponents, factors: Vec<ScoreFactor>) -> Self {
        let composite = COMPOSITE_WEIGHTS[0] * components.financial_exposure
            + COMPOSITE_WEIGHTS[1] * components.rejection_risk
            + COMPOSITE_WEIGHTS[2] * components.exclusion_density
            + COMPOSITE_WEIGHTS[3] * components.llm_signal as f64;

        let total = composite.clamp(0.0, 100.0) as u8;

        Self {
            total,
            tier: RiskTier::from_score(total),
            components,
            factors,
        }
    }

    /// Hex color for UI meters
    pub fn color_code(&self) -> &'static str {
        match self.total {
            70..=100 => "#c0392b",
            45..=69 => "#d4860a",
            _ => "#27ae60",
        }
    }
}

/// Builder assembling a Vulnerability Score from analysis results
pub struct VulnerabilityScoreBuilder {
    components: ScoreComponents,
    factors: Vec<ScoreFactor>,
}

impl VulnerabilityScoreBuilder {
    pub fn new() -> Self {
        Self {
            components: ScoreComponents::default(),
            factors: Vec::new(),
        }
    }

    /// Financial Exposure Ratio component (fraction 0-1)
    pub fn with_financial_exposure(mut self, fer: f64) -> Self {
        let score = round1(fer * 100.0);
        self.components.financial_exposure = score;
        self.factors.push(ScoreFactor {
            name: "Financial exposure".to_string(),
            score,
            weight: COMPOSITE_WEIGHTS[0],
            reason: format!(
                "Expected 5-year out-of-pocket consumes {:.1}% of disposable income",
                score
            ),
        });
        self
    }

    /// Claim rejection probability component (fraction 0-1)
    pub fn with_rejection_risk(mut self, probability: f64) -> Self {
        let score = round1(probability * 100.0);
        self.components.rejection_risk = score;
        self.factors.push(ScoreFactor {
            name: "Claim rejection risk".to_string(),
            score,
            weight: COMPOSITE_WEIGHTS[1],
            reason: format!(
                "{:.1}% chance of at least one claim rejection, driven by waiting periods",
                score
            ),
        });
        self
    }

    /// Exclusion density component (fraction 0-1)
    pub fn with_exclusion_density(mut self, density: f64, counts: DensityCounts) -> Self {
        let score = round1(density * 100.0);
        self.components.exclusion_density = score;
        self.factors.push(ScoreFactor {
            name: "Exclusion density".to_string(),
            score,
            weight: COMPOSITE_WEIGHTS[2],
            reason: format!(
                "{} exclusions, {} waiting periods, {} hidden limits, {} co-payment clauses",
                counts.exclusions, counts.waiting_periods, counts.hidden_limits, counts.co_payments
            ),
        });
        self
    }

    /// Model's own policy-text reading (0-100)
    pub fn with_llm_signal(mut self, score: u8) -> Self {
        self.components.llm_signal = score.min(100);
        self.factors.push(ScoreFactor {
            name: "Language-model signal".to_string(),
            score: score.min(100) as f64,
            weight: COMPOSITE_WEIGHTS[3],
            reason: "Model's own reading of the policy text".to_string(),
        });
        self
    }

    pub fn build(self) -> VulnerabilityScore {
        VulnerabilityScore::calculate(self.components, self.factors)
    }
}

impl Default for VulnerabilityScoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================
// Full assessment
// ============================================

/// Comprehensive risk assessment for one policy and one policyholder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: VulnerabilityScore,
    /// Expected out-of-pocket spend over the next 5 years (INR)
    pub expected_oop_5yr: f64,
    pub rejection_probability_pct: f64,
    pub financial_exposure_pct: f64,
    pub exclusion_density_pct: f64,
    /// FER at or above the WHO catastrophic threshold
    pub catastrophic_expenditure_warning: bool,
    pub condition_breakdown: BTreeMap<String, ConditionExposure>,
}

/// Run the full actuarial pass: expected out-of-pocket, exposure ratio,
/// exclusion density, and the weighted composite.
pub fn assess_policy_risk(
    terms: &PolicyTerms,
    profile: &PolicyholderProfile,
    counts: DensityCounts,
    llm_signal: u8,
) -> RiskAssessment {
    let projection = expected_out_of_pocket(
        terms,
        profile.age,
        &profile.declared_conditions,
        profile.sum_insured,
    );

    let fer = financial_exposure_ratio(projection.total_oop_5yr, profile.annual_income);
    let density = exclusion_density(counts);

    let score = VulnerabilityScoreBuilder::new()
        .with_financial_exposure(fer)
        .with_rejection_risk(projection.rejection_probability)
        .with_exclusion_density(density, counts)
        .with_llm_signal(llm_signal)
        .build();

    RiskAssessment {
        expected_oop_5yr: projection.total_oop_5yr,
        rejection_probability_pct: round1(projection.rejection_probability * 100.0),
        financial_exposure_pct: round1(fer * 100.0),
        exclusion_density_pct: round1(density * 100.0),
        catastrophic_expenditure_warning: fer >= CATASTROPHIC_FER,
        condition_breakdown: projection.breakdown,
        score,
    }
}
