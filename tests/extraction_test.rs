//! Extraction parsing tests against canned model completions.
//! The Ollama provider itself is never called here.

use policy_decoder::core::extraction::{build_extraction_prompt, extract_json, parse_extraction};
use policy_decoder::core::terms::{dedupe_extraction, terms_from_extraction};
use policy_decoder::models::types::Severity;

/// A well-behaved completion following the output contract
const CLEAN_COMPLETION: &str = r#"{
  "risk_score": 72,
  "waiting_periods": [
    {"condition": "Cataract", "duration": "24 months", "impact": "Any cataract claim is rejected for two years."},
    {"condition": "Pre-existing diabetes", "duration": "4 years", "impact": "You pay diabetes bills yourself for four years."}
  ],
  "exclusions": [
    {"item": "Cosmetic surgery", "impact": "Full cost borne by the policyholder."},
    {"item": "Dental treatment", "impact": "Not payable unless caused by an accident."}
  ],
  "co_payment": [
    {"percentage": "20%", "condition": "insured aged 60 or above", "impact": "A fifth of every bill is yours."}
  ],
  "hidden_limits": [
    {"limit": "Room rent capped at Rs. 3,000 per day", "applies_to": "all hospitalizations", "impact": "Higher room category triggers proportionate deduction."}
  ],
  "danger_alerts": [
    {"severity": "Critical", "message": "Senior citizens face a 20% co-payment on every claim."},
    {"severity": "Medium", "message": "Room rent cap is below metro hospital rates."}
  ]
}"#;

/// The same payload wrapped the way chatty local models actually answer
fn chatty(payload: &str) -> String {
    format!(
        "Sure! I analyzed the policy clauses. Here is the JSON you asked for:\n\n```json\n{}\n```\n\nLet me know if you need anything else.",
        payload
    )
}

#[test]
fn test_clean_completion_parses_fully() {
    let result = parse_extraction(CLEAN_COMPLETION).expect("contract-shaped JSON parses");
    assert_eq!(result.risk_score, 72);
    assert_eq!(result.waiting_periods.len(), 2);
    assert_eq!(result.exclusions.len(), 2);
    assert_eq!(result.co_payment.len(), 1);
    assert_eq!(result.hidden_limits.len(), 1);
    assert_eq!(result.danger_alerts.len(), 2);
    assert_eq!(result.danger_alerts[0].severity, Severity::Critical);
}

#[test]
fn test_chatty_completion_recovers_same_json() {
    let wrapped = chatty(CLEAN_COMPLETION);
    let recovered = extract_json(&wrapped).expect("json recovered from chatter");
    let direct: serde_json::Value = serde_json::from_str(CLEAN_COMPLETION).unwrap();
    let from_chatter: serde_json::Value = serde_json::from_str(&recovered).unwrap();
    assert_eq!(direct, from_chatter);
}

#[test]
fn test_completion_with_no_json_yields_none() {
    assert!(parse_extraction("The policy looks mostly fine to me.").is_none());
    assert!(extract_json("").is_none());
}

#[test]
fn test_partial_contract_gets_defaults() {
    let partial = r#"{"risk_score": 35, "exclusions": [{"item": "War", "impact": ""}]}"#;
    let result = parse_extraction(partial).expect("partial JSON parses");
    assert_eq!(result.risk_score, 35);
    assert_eq!(result.exclusions.len(), 1);
    assert!(result.waiting_periods.is_empty());
    assert!(result.danger_alerts.is_empty());
}

#[test]
fn test_out_of_range_scores_are_clamped() {
    let high = parse_extraction(r#"{"risk_score": 400}"#).unwrap();
    assert_eq!(high.risk_score, 100);

    let negative = parse_extraction(r#"{"risk_score": -20}"#).unwrap();
    assert_eq!(negative.risk_score, 0);

    let fractional = parse_extraction(r#"{"risk_score": 66.7}"#).unwrap();
    assert_eq!(fractional.risk_score, 66);
}

#[test]
fn test_merge_across_two_calls() {
    let first = parse_extraction(CLEAN_COMPLETION).unwrap();
    let second = parse_extraction(
        r#"{
            "risk_score": 48,
            "exclusions": [{"item": "Cosmetic surgery", "impact": "Full cost borne by the policyholder."}],
            "hidden_limits": [{"limit": "ICU charges capped at 2% of sum insured", "applies_to": "ICU", "impact": "Shortfall is yours."}]
        }"#,
    )
    .unwrap();

    let merged = first.merge(second);
    // Max of both call scores
    assert_eq!(merged.risk_score, 72);
    // Concatenation first, dedup second
    assert_eq!(merged.exclusions.len(), 3);
    let deduped = dedupe_extraction(merged);
    assert_eq!(deduped.exclusions.len(), 2);
    assert_eq!(deduped.hidden_limits.len(), 2);
}

#[test]
fn test_end_to_end_terms_from_canned_extraction() {
    let extraction = dedupe_extraction(parse_extraction(CLEAN_COMPLETION).unwrap());
    let terms = terms_from_extraction(&extraction);

    assert_eq!(terms.copay_rate, 0.2);
    assert_eq!(terms.room_rent_daily, Some(3_000.0));
    assert!(terms.waiting_periods.contains_key("Cataract"));
    assert!(terms.waiting_periods.contains_key("Diabetes"));
    assert_eq!(terms.deductible, 0.0);
}

#[test]
fn test_prompt_contract_is_stable() {
    let prompt = build_extraction_prompt("BODY");
    // The five categories the downstream pipeline depends on
    for key in [
        "waiting_periods",
        "exclusions",
        "co_payment",
        "hidden_limits",
        "danger_alerts",
    ] {
        assert!(prompt.contains(key), "prompt lost category {}", key);
    }
    assert!(prompt.ends_with("BODY\n"));
    assert!(prompt.contains("Respond with ONLY a valid JSON object"));
}
