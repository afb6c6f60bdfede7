//! Integration tests for the Policy Decoder pipeline (no LLM calls)

use std::collections::HashMap;

use policy_decoder::core::filter::{extract_relevant_text, score_paragraph, split_paragraphs};
use policy_decoder::core::ingest::{extract_text, DocumentFormat};
use policy_decoder::core::risk_engine::{
    assess_policy_risk, exclusion_density, expected_out_of_pocket, DensityCounts, RiskTier,
};
use policy_decoder::core::terms::{parse_copay_pct, parse_room_rent, terms_from_extraction};
use policy_decoder::models::errors::ErrorCode;
use policy_decoder::models::types::{
    CoPayment, ExtractionResult, HiddenLimit, PolicyholderProfile, PolicyTerms, WaitingPeriod,
};
use policy_decoder::{PolicyAnalyzer, TelemetryCollector};

/// A condensed but structurally realistic policy document
const SAMPLE_POLICY: &str = "\
STAR SECURE HEALTH INSURANCE POLICY\n\
\n\
The policyholder is requested to read this document carefully before filing a claim \
with the Company under any section of this Policy.\n\
\n\
SECTION 4: GENERAL EXCLUSIONS\n\
\n\
The Company shall not be liable to make any payment for any claim directly or \
indirectly caused by cosmetic or plastic surgery, unless necessitated by an accident.\n\
\n\
Dental treatment or surgery of any kind is specifically excluded unless requiring \
hospitalization arising out of accidental bodily injury sustained by the insured.\n\
\n\
SECTION 5: WAITING PERIODS\n\
\n\
A waiting period of 24 months shall apply to cataract treatment from the first policy \
commencement date, during which no claim shall be admissible under this section.\n\
\n\
Pre-existing diseases declared at inception are subject to a waiting period of 4 years \
from the date of first enrollment, irrespective of continuity of coverage.\n\
\n\
SECTION 6: CO-PAYMENT AND LIMITS\n\
\n\
A co-payment of 20% shall apply to each and every admissible claim where the insured \
person's age at entry is sixty years or above, and the insured shall bear that share.\n\
\n\
Room rent shall not exceed Rs. 3,000 per day and proportionate deduction applies to \
all associated medical expenses when a higher room category is occupied.\n\
\n\
SECTION 9: RENEWAL TERMS\n\
\n\
The policy is renewable for life provided the premium is received before expiry of the \
grace period of thirty days from the due date communicated by the Company in writing.\n";

// ============================================
// Ingestion + filtering
// ============================================

#[test]
fn test_ingest_plain_text() {
    let text = extract_text(SAMPLE_POLICY.as_bytes(), DocumentFormat::PlainText)
        .expect("sample policy is readable");
    assert!(text.contains("GENERAL EXCLUSIONS"));
}

#[test]
fn test_ingest_rejects_scanned_stub() {
    let err = extract_text(b"page 1\n\npage 2\n", DocumentFormat::PlainText).unwrap_err();
    assert_eq!(err.code, ErrorCode::DocUnreadable);
}

#[test]
fn test_filter_keeps_risk_sections_drops_boilerplate() {
    let (filtered, stats) = extract_relevant_text(SAMPLE_POLICY, 2.0);

    assert!(filtered.contains("cosmetic or plastic surgery"));
    assert!(filtered.contains("waiting period of 24 months"));
    assert!(filtered.contains("co-payment of 20%"));
    assert!(filtered.contains("Room rent shall not exceed"));
    assert!(stats.selected_paragraphs > 0);
    assert_eq!(
        stats.total_paragraphs,
        split_paragraphs(SAMPLE_POLICY).len()
    );
}

#[test]
fn test_exclusion_paragraph_outscores_renewal_paragraph() {
    let exclusion = "The Company shall not be liable for claims arising from cosmetic \
        surgery as the same is specifically excluded.";
    let renewal = "The policy is renewable for life provided the premium is received \
        before expiry of the grace period.";
    assert!(score_paragraph(exclusion) > score_paragraph(renewal));
}

// ============================================
// Term parsing
// ============================================

#[test]
fn test_terms_parsed_from_extraction_lists() {
    let extraction = ExtractionResult {
        risk_score: 62,
        waiting_periods: vec![
            WaitingPeriod {
                condition: "Cataract".into(),
                duration: "24 months".into(),
                impact: "Claims rejected during the period".into(),
            },
            WaitingPeriod {
                condition: "Pre-existing heart disease".into(),
                duration: "4 years".into(),
                impact: String::new(),
            },
        ],
        co_payment: vec![CoPayment {
            percentage: "20%".into(),
            condition: "age sixty or above".into(),
            impact: String::new(),
        }],
        hidden_limits: vec![HiddenLimit {
            limit: "Room rent capped at Rs. 3,000 per day".into(),
            applies_to: "all admissions".into(),
            impact: "proportionate deduction".into(),
        }],
        ..Default::default()
    };

    let terms = terms_from_extraction(&extraction);
    assert_eq!(terms.copay_rate, 0.2);
    assert_eq!(terms.room_rent_daily, Some(3_000.0));
    assert!(terms.waiting_periods.contains_key("Cataract"));
    assert!(terms.waiting_periods.contains_key("Heart Disease"));
}

#[test]
fn test_term_parsers_return_defaults_when_absent() {
    assert_eq!(parse_copay_pct(&[]), 0.0);
    assert_eq!(parse_room_rent(&[]), None);
}

// ============================================
// Risk engine laws
// ============================================

#[test]
fn test_risk_tier_ordering() {
    let tiers = [
        RiskTier::from_score(90),
        RiskTier::from_score(60),
        RiskTier::from_score(30),
        RiskTier::from_score(5),
    ];
    assert_eq!(
        tiers,
        [
            RiskTier::High,
            RiskTier::Moderate,
            RiskTier::LowModerate,
            RiskTier::Low
        ]
    );
}

#[test]
fn test_waiting_period_dominates_out_of_pocket() {
    let mut waiting = HashMap::new();
    waiting.insert("Cancer".to_string(), "4 years".to_string());
    let trapped = PolicyTerms {
        waiting_periods: waiting,
        ..Default::default()
    };
    let free = PolicyTerms::default();

    let with_trap = expected_out_of_pocket(&trapped, 35, &[], 10_000_000.0);
    let without = expected_out_of_pocket(&free, 35, &[], 10_000_000.0);

    assert_eq!(with_trap.total_oop_5yr - without.total_oop_5yr, 600_000.0);
    assert!(with_trap.rejection_probability > without.rejection_probability);
}

#[test]
fn test_copay_scales_exposure() {
    let light = PolicyTerms {
        copay_rate: 0.1,
        ..Default::default()
    };
    let heavy = PolicyTerms {
        copay_rate: 0.3,
        ..Default::default()
    };

    let low = expected_out_of_pocket(&light, 45, &[], 500_000.0);
    let high = expected_out_of_pocket(&heavy, 45, &[], 500_000.0);
    assert!(high.total_oop_5yr > low.total_oop_5yr);
}

#[test]
fn test_density_saturates_below_one() {
    let extreme = exclusion_density(DensityCounts {
        exclusions: 100,
        waiting_periods: 50,
        hidden_limits: 50,
        co_payments: 20,
    });
    assert!(extreme > 0.95 && extreme <= 1.0);
}

#[test]
fn test_full_assessment_is_internally_consistent() {
    let mut waiting = HashMap::new();
    waiting.insert("Cataract".to_string(), "2 years".to_string());
    let terms = PolicyTerms {
        copay_rate: 0.2,
        waiting_periods: waiting,
        sub_limits: HashMap::new(),
        room_rent_daily: Some(3_000.0),
        deductible: 0.0,
    };
    let profile = PolicyholderProfile {
        age: 62,
        annual_income: 600_000.0,
        sum_insured: 500_000.0,
        declared_conditions: vec!["Diabetes".to_string()],
    };
    let counts = DensityCounts {
        exclusions: 2,
        waiting_periods: 2,
        hidden_limits: 1,
        co_payments: 1,
    };

    let assessment = assess_policy_risk(&terms, &profile, counts, 62);

    // Composite equals the weighted components, truncated
    let expected = 0.38 * assessment.score.components.financial_exposure
        + 0.32 * assessment.score.components.rejection_risk
        + 0.22 * assessment.score.components.exclusion_density
        + 0.08 * assessment.score.components.llm_signal as f64;
    assert_eq!(assessment.score.total, expected.clamp(0.0, 100.0) as u8);

    // Declared diabetes is certain, so it must appear in the breakdown
    assert_eq!(
        assessment.condition_breakdown["Diabetes"].annual_probability,
        1.0
    );
    // Cataract sits in a waiting period and bears its full cost
    assert!(assessment.condition_breakdown["Cataract"].in_waiting_period);
    assert_eq!(
        assessment.condition_breakdown["Cataract"].expected_oop_5yr,
        55_000.0
    );
    assert_eq!(assessment.score.factors.len(), 4);
}

// ============================================
// Analyzer plumbing (no LLM)
// ============================================

#[test]
fn test_fingerprint_distinguishes_profiles() {
    let base = PolicyholderProfile::default();
    let declared = PolicyholderProfile {
        declared_conditions: vec!["Cancer".to_string()],
        ..Default::default()
    };
    assert_ne!(
        PolicyAnalyzer::fingerprint(SAMPLE_POLICY, &base),
        PolicyAnalyzer::fingerprint(SAMPLE_POLICY, &declared)
    );
}

#[test]
fn test_score_terms_requires_valid_profile() {
    let analyzer = PolicyAnalyzer::new(
        Default::default(),
        std::sync::Arc::new(TelemetryCollector::new()),
    );
    let bad_profile = PolicyholderProfile {
        age: 0,
        ..Default::default()
    };

    let err = analyzer
        .score_terms(
            &PolicyTerms::default(),
            &bad_profile,
            DensityCounts::default(),
            None,
        )
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TermInvalidProfile);
}

#[test]
fn test_score_terms_records_telemetry() {
    let telemetry = std::sync::Arc::new(TelemetryCollector::new());
    let analyzer = PolicyAnalyzer::new(Default::default(), telemetry.clone());

    analyzer
        .score_terms(
            &PolicyTerms::default(),
            &PolicyholderProfile::default(),
            DensityCounts::default(),
            Some(10),
        )
        .expect("clean terms score");

    assert_eq!(telemetry.get_stats().total_analyzed, 1);
}
