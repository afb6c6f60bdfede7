//! Policy Term Parsing
//!
//! Bridges the gap between what the LLM extracted (free-text clause
//! descriptions) and what the risk engine needs (numbers). Co-pay
//! percentages, room-rent caps, and deductibles are pulled out of the
//! extraction lists with forgiving regexes; waiting-period conditions
//! are aligned with the canonical condition names used by the actuarial
//! tables.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

use crate::models::types::{CoPayment, ExtractionResult, HiddenLimit, PolicyTerms, WaitingPeriod};
use crate::utils::constants::known_conditions;

lazy_static! {
    /// "20%" or "12.5%" anywhere in a clause
    static ref PERCENT: Regex =
        Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("percent pattern is valid");

    /// First rupee amount in a clause, commas tolerated
    static ref AMOUNT: Regex =
        Regex::new(r"(?:rs\.?|inr|rupees?)?\s*(\d[\d,]*)").expect("amount pattern is valid");
}

/// Order-preserving dedup by serialized identity. Extraction over two
/// halves of a document routinely repeats the same clause.
pub fn dedupe<T: Serialize>(items: Vec<T>) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let key = serde_json::to_string(item).unwrap_or_default();
            seen.insert(key)
        })
        .collect()
}

/// Deduplicate every list in an extraction result
pub fn dedupe_extraction(result: ExtractionResult) -> ExtractionResult {
    ExtractionResult {
        risk_score: result.risk_score,
        waiting_periods: dedupe(result.waiting_periods),
        exclusions: dedupe(result.exclusions),
        co_payment: dedupe(result.co_payment),
        hidden_limits: dedupe(result.hidden_limits),
        danger_alerts: dedupe(result.danger_alerts),
    }
}

/// Extract a numeric co-payment fraction from the extraction list.
/// Returns 0.0 when no percentage is found anywhere.
pub fn parse_copay_pct(copayments: &[CoPayment]) -> f64 {
    for cp in copayments {
        if let Some(caps) = PERCENT.captures(&cp.percentage) {
            if let Ok(pct) = caps[1].parse::<f64>() {
                return (pct / 100.0).min(1.0);
            }
        }
    }
    0.0
}

/// Look for a daily room-rent cap among the hidden limits
pub fn parse_room_rent(hidden_limits: &[HiddenLimit]) -> Option<f64> {
    for hl in hidden_limits {
        let text = hl.limit.to_lowercase();
        if text.contains("room") && text.contains("rent") {
            if let Some(amount) = first_amount(&text) {
                return Some(amount);
            }
        }
    }
    None
}

/// Look for a flat deductible (or "excess") among the hidden limits
pub fn parse_deductible(hidden_limits: &[HiddenLimit]) -> f64 {
    for hl in hidden_limits {
        let text = hl.limit.to_lowercase();
        if text.contains("deductible") || text.contains("excess") {
            if let Some(amount) = first_amount(&text) {
                return amount;
            }
        }
    }
    0.0
}

fn first_amount(text: &str) -> Option<f64> {
    AMOUNT
        .captures(text)
        .and_then(|caps| caps[1].replace(',', "").parse::<f64>().ok())
}

/// Map extracted waiting-period conditions to canonical condition names.
///
/// The actuarial tables key by canonical names ("Cataract"), while the
/// model reports conditions as written ("cataract surgery of any kind").
/// Case-insensitive containment aligns the two; conditions with no
/// canonical match are kept as written for display.
pub fn map_waiting_conditions(waiting: &[WaitingPeriod]) -> HashMap<String, String> {
    let canon = known_conditions();
    let mut map = HashMap::new();

    for wp in waiting {
        let condition = wp.condition.trim();
        if condition.is_empty() {
            continue;
        }
        let duration = if wp.duration.trim().is_empty() {
            "2 years".to_string()
        } else {
            wp.duration.trim().to_string()
        };

        let lower = condition.to_lowercase();
        let mut matched = false;
        for name in &canon {
            if lower.contains(&name.to_lowercase()) {
                map.insert((*name).to_string(), duration.clone());
                matched = true;
            }
        }
        if !matched {
            map.insert(condition.to_string(), duration);
        }
    }

    map
}

/// Assemble numeric policy terms from a (deduplicated) extraction result
pub fn terms_from_extraction(extraction: &ExtractionResult) -> PolicyTerms {
    PolicyTerms {
        copay_rate: parse_copay_pct(&extraction.co_payment),
        waiting_periods: map_waiting_conditions(&extraction.waiting_periods),
        sub_limits: HashMap::new(),
        room_rent_daily: parse_room_rent(&extraction.hidden_limits),
        deductible: parse_deductible(&extraction.hidden_limits),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::Exclusion;

    fn copay(pct: &str) -> CoPayment {
        CoPayment {
            percentage: pct.to_string(),
            condition: String::new(),
            impact: String::new(),
        }
    }

    fn limit(text: &str) -> HiddenLimit {
        HiddenLimit {
            limit: text.to_string(),
            applies_to: String::new(),
            impact: String::new(),
        }
    }

    #[test]
    fn test_parse_copay_pct() {
        assert_eq!(parse_copay_pct(&[copay("20%")]), 0.2);
        assert_eq!(parse_copay_pct(&[copay("a 12.5 % share")]), 0.125);
        assert_eq!(parse_copay_pct(&[copay("not stated")]), 0.0);
        assert_eq!(parse_copay_pct(&[]), 0.0);
        // First parseable entry wins
        assert_eq!(parse_copay_pct(&[copay("unknown"), copay("30%")]), 0.3);
    }

    #[test]
    fn test_parse_room_rent() {
        let limits = [limit("Room rent capped at Rs. 3,000 per day")];
        assert_eq!(parse_room_rent(&limits), Some(3000.0));

        let limits = [limit("ICU charges capped at Rs. 10,000")];
        assert_eq!(parse_room_rent(&limits), None);
    }

    #[test]
    fn test_parse_deductible() {
        let limits = [limit("A deductible of INR 25,000 applies per claim")];
        assert_eq!(parse_deductible(&limits), 25_000.0);
        assert_eq!(parse_deductible(&[limit("No caps mentioned")]), 0.0);
    }

    #[test]
    fn test_map_waiting_conditions_canonical() {
        let waiting = [WaitingPeriod {
            condition: "Cataract surgery of any kind".to_string(),
            duration: "2 years".to_string(),
            impact: String::new(),
        }];
        let map = map_waiting_conditions(&waiting);
        assert_eq!(map.get("Cataract"), Some(&"2 years".to_string()));
    }

    #[test]
    fn test_map_waiting_conditions_unmatched_kept() {
        let waiting = [WaitingPeriod {
            condition: "Bariatric procedures".to_string(),
            duration: String::new(),
            impact: String::new(),
        }];
        let map = map_waiting_conditions(&waiting);
        assert_eq!(map.get("Bariatric procedures"), Some(&"2 years".to_string()));
    }

    #[test]
    fn test_dedupe_preserves_order() {
        let items = vec![
            Exclusion { item: "A".into(), impact: "x".into() },
            Exclusion { item: "B".into(), impact: "y".into() },
            Exclusion { item: "A".into(), impact: "x".into() },
        ];
        let out = dedupe(items);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].item, "A");
        assert_eq!(out[1].item, "B");
    }

    #[test]
    fn test_terms_from_extraction() {
        let extraction = ExtractionResult {
            risk_score: 50,
            co_payment: vec![copay("15%")],
            hidden_limits: vec![
                limit("Room rent limited to Rs 2,500/day"),
                limit("Excess of Rs. 10,000 on every claim"),
            ],
            waiting_periods: vec![WaitingPeriod {
                condition: "Pre-existing diabetes".to_string(),
                duration: "4 years".to_string(),
                impact: String::new(),
            }],
            ..Default::default()
        };

        let terms = terms_from_extraction(&extraction);
        assert_eq!(terms.copay_rate, 0.15);
        assert_eq!(terms.room_rent_daily, Some(2500.0));
        assert_eq!(terms.deductible, 10_000.0);
        assert_eq!(terms.waiting_periods.get("Diabetes"), Some(&"4 years".to_string()));
        assert!(terms.validate().is_ok());
    }
}
