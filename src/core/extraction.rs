//! Clause Intelligence Extraction
//!
//! Single-call LLM analysis on pre-filtered policy text.
//!
//! The pre-filter reduces the document to the paragraphs that contain
//! risk signals, so one generation call covers the whole policy. If the
//! filtered text is still too long for a single reliable call, it is
//! split into at most 2 focused calls at a paragraph boundary and the
//! results merged. Total LLM calls stay at 1-2 regardless of document
//! length.
//!
//! Local models wrap JSON in prose, markdown fences, or both, so the
//! recovery path here is deliberately paranoid: fence stripping, a
//! widest-brace match, then a substring scan.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::errors::AppResult;
use crate::models::types::{
    CoPayment, DangerAlert, Exclusion, ExtractionResult, HiddenLimit, Severity, WaitingPeriod,
};
use crate::providers::ollama::OllamaClient;
use crate::utils::constants::MAX_SINGLE_CALL_CHARS;

lazy_static! {
    /// Markdown code fences around model output
    static ref CODE_FENCE: Regex = Regex::new(r"```(?:json)?").expect("fence pattern is valid");

    /// Widest brace-delimited candidate in a completion
    static ref JSON_OBJECT: Regex = Regex::new(r"(?s)\{.*\}").expect("object pattern is valid");
}

/// Build the extraction prompt for a block of pre-filtered clauses
pub fn build_extraction_prompt(text: &str) -> String {
    format!(
        r#"You are a strict Indian health insurance policy analyzer.

TASK: Extract ONLY information explicitly present in the policy clauses below.
These clauses have already been pre-filtered from a full policy document to contain
only the sections relevant to exclusions, waiting periods, co-payments, and limits.

RULES:
- Extract ONLY what is explicitly written. Do NOT invent or infer.
- Return empty lists [] when a category has no matches in the text.
- DO NOT mention suicide, self-harm, or mental health unless explicitly written.
- Every item must be traceable to an actual sentence in the text.

RISK SCORE GUIDE (0-100):
  0-30  : Few exclusions, short waiting periods, low co-pay - policy is claimant-friendly
  31-60 : Moderate exclusions or waiting periods - some financial exposure
  61-80 : Many exclusions, long waiting periods, or high co-pay - significant risk
  81-100: Extensive exclusions, multiple co-pays, very long waiting periods - high rejection risk

OUTPUT: Respond with ONLY a valid JSON object. No preamble, no explanation, no markdown fences.

{{
  "risk_score": <integer 0-100>,
  "waiting_periods": [
    {{"condition": "<name>", "duration": "<e.g. 2 years>", "impact": "<plain English consequence>"}}
  ],
  "exclusions": [
    {{"item": "<excluded item>", "impact": "<what the policyholder must pay themselves>"}}
  ],
  "co_payment": [
    {{"percentage": "<e.g. 20%>", "condition": "<when it applies>", "impact": "<cost consequence>"}}
  ],
  "hidden_limits": [
    {{"limit": "<description>", "applies_to": "<treatment or scenario>", "impact": "<consequence>"}}
  ],
  "danger_alerts": [
    {{"severity": "<Critical|High|Medium>", "message": "<plain language warning>"}}
  ]
}}

Policy Clauses:
{text}
"#
    )
}

/// Recover the first valid JSON object from raw model output.
///
/// Tries the widest `{{...}}` candidate first, then falls back to a
/// substring scan (each opening brace forward, longest valid suffix
/// backward).
pub fn extract_json(raw: &str) -> Option<String> {
    let clean = CODE_FENCE.replace_all(raw, "");
    let clean = clean.trim();

    if let Some(m) = JSON_OBJECT.find(clean) {
        let candidate = m.as_str();
        if serde_json::from_str::<Value>(candidate).is_ok() {
            return Some(candidate.to_string());
        }
    }

    // Substring search fallback
    let boundaries: Vec<usize> = clean
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(clean.len()))
        .collect();

    for (bi, &start) in boundaries.iter().enumerate() {
        if !clean[start..].starts_with('{') {
            continue;
        }
        for &end in boundaries[bi + 1..].iter().rev() {
            let candidate = &clean[start..end];
            if serde_json::from_str::<Value>(candidate).is_ok() {
                return Some(candidate.to_string());
            }
        }
    }

    None
}

/// Models sometimes emit a bare string where the contract expects an
/// object. Route it into the item's primary field instead of dropping it.
fn str_or_field(item: &Value, field: &str) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get(field)
            .or_else(|| map.get("value"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

fn obj_field(item: &Value, field: &str) -> String {
    item.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn parse_severity(item: &Value) -> Severity {
    match obj_field(item, "severity").to_lowercase().as_str() {
        "critical" => Severity::Critical,
        "high" => Severity::High,
        _ => Severity::Medium,
    }
}

fn list<'a>(value: &'a Value, key: &str) -> Vec<&'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|a| a.iter().collect())
        .unwrap_or_default()
}

/// Parse and validate raw model output into an [`ExtractionResult`].
///
/// Missing categories default to empty, the risk score is clamped to
/// 0-100, and malformed items are coerced rather than rejected. Returns
/// `None` when no JSON object can be recovered at all.
pub fn parse_extraction(raw: &str) -> Option<ExtractionResult> {
    let json_string = match extract_json(raw) {
        Some(s) => s,
        None => {
            let preview: String = raw.chars().take(400).collect();
            warn!(preview = %preview, "no JSON found in LLM output");
            return None;
        }
    };

    let value: Value = match serde_json::from_str(&json_string) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "JSON parse failed");
            return None;
        }
    };

    let risk_score = value
        .get("risk_score")
        .and_then(|v| {
            v.as_f64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        })
        .unwrap_or(0.0)
        .clamp(0.0, 100.0) as u8;

    let waiting_periods = list(&value, "waiting_periods")
        .into_iter()
        .map(|item| WaitingPeriod {
            condition: str_or_field(item, "condition"),
            duration: obj_field(item, "duration"),
            impact: obj_field(item, "impact"),
        })
        .collect();

    let exclusions = list(&value, "exclusions")
        .into_iter()
        .map(|item| Exclusion {
            item: str_or_field(item, "item"),
            impact: obj_field(item, "impact"),
        })
        .collect();

    let co_payment = list(&value, "co_payment")
        .into_iter()
        .map(|item| CoPayment {
            percentage: str_or_field(item, "percentage"),
            condition: obj_field(item, "condition"),
            impact: obj_field(item, "impact"),
        })
        .collect();

    let hidden_limits = list(&value, "hidden_limits")
        .into_iter()
        .map(|item| HiddenLimit {
            limit: str_or_field(item, "limit"),
            applies_to: obj_field(item, "applies_to"),
            impact: obj_field(item, "impact"),
        })
        .collect();

    let danger_alerts = list(&value, "danger_alerts")
        .into_iter()
        .map(|item| DangerAlert {
            severity: parse_severity(item),
            message: str_or_field(item, "message"),
        })
        .collect();

    Some(ExtractionResult {
        risk_score,
        waiting_periods,
        exclusions,
        co_payment,
        hidden_limits,
        danger_alerts,
    })
}

/// Byte offset of the best split point near the midpoint of `text`:
/// a blank line within 500 chars, a newline within 200 chars, or the
/// hard midpoint.
fn split_point(text: &str) -> usize {
    let boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let n = boundaries.len();
    let mid = n / 2;

    let window = |radius: usize| -> (usize, usize) {
        let lo = boundaries[mid.saturating_sub(radius)];
        let hi = if mid + radius < n {
            boundaries[mid + radius]
        } else {
            text.len()
        };
        (lo, hi)
    };

    let (lo, hi) = window(500);
    if let Some(pos) = text[lo..hi].rfind("\n\n") {
        return lo + pos;
    }

    let (lo, hi) = window(200);
    if let Some(pos) = text[lo..hi].rfind('\n') {
        return lo + pos;
    }

    boundaries[mid]
}

/// What the 1-2 extraction calls produced together
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// Merged result across all successful calls
    pub result: ExtractionResult,
    /// The risk score each successful call reported, in call order.
    /// Downstream averages these as the model's soft signal.
    pub call_scores: Vec<u8>,
}

/// Analyze pre-filtered policy text with 1-2 LLM calls.
///
/// Text at or under [`MAX_SINGLE_CALL_CHARS`] gets a single call.
/// Longer text is split into two halves at a paragraph boundary, each
/// analyzed separately, and the results merged (max risk score,
/// concatenated lists). Returns `None` when nothing parseable came back
/// from any call.
pub async fn run_extraction(
    client: &OllamaClient,
    filtered_text: &str,
) -> AppResult<Option<ExtractionOutcome>> {
    let text = filtered_text.trim();

    if text.is_empty() {
        return Ok(None);
    }

    let char_count = text.chars().count();

    if char_count <= MAX_SINGLE_CALL_CHARS {
        let raw = client.generate(&build_extraction_prompt(text)).await?;
        return Ok(parse_extraction(&raw).map(|result| ExtractionOutcome {
            call_scores: vec![result.risk_score],
            result,
        }));
    }

    // Two-call split at a paragraph boundary near the midpoint
    let at = split_point(text);
    let part_a = text[..at].trim();
    let part_b = text[at..].trim();

    debug!(
        chars = char_count,
        "filtered text too long, splitting into 2 calls"
    );

    let raw_a = client.generate(&build_extraction_prompt(part_a)).await?;
    let result_a = parse_extraction(&raw_a);

    let raw_b = client.generate(&build_extraction_prompt(part_b)).await?;
    let result_b = parse_extraction(&raw_b);

    let mut call_scores = Vec::new();
    if let Some(a) = &result_a {
        call_scores.push(a.risk_score);
    }
    if let Some(b) = &result_b {
        call_scores.push(b.risk_score);
    }

    let result = match (result_a, result_b) {
        (None, None) => return Ok(None),
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (Some(a), Some(b)) => a.merge(b),
    };

    Ok(Some(ExtractionOutcome {
        result,
        call_scores,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_plain() {
        let raw = r#"{"risk_score": 40, "exclusions": []}"#;
        assert_eq!(extract_json(raw), Some(raw.to_string()));
    }

    #[test]
    fn test_extract_json_with_fences_and_preamble() {
        let raw = "Here is the analysis you asked for:\n```json\n{\"risk_score\": 55}\n```\nLet me know!";
        let json = extract_json(raw).expect("json recovered");
        assert_eq!(json, "{\"risk_score\": 55}");
    }

    #[test]
    fn test_extract_json_trailing_garbage() {
        // Widest match fails (trailing brace soup), substring scan wins
        let raw = "{\"risk_score\": 10} } trailing }";
        let json = extract_json(raw).expect("json recovered");
        assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());
        assert!(json.contains("risk_score"));
    }

    #[test]
    fn test_extract_json_none() {
        assert_eq!(extract_json("I could not find any policy text."), None);
    }

    #[test]
    fn test_parse_defaults_and_clamp() {
        let parsed = parse_extraction(r#"{"risk_score": 250}"#).expect("parsed");
        assert_eq!(parsed.risk_score, 100);
        assert!(parsed.exclusions.is_empty());
        assert!(parsed.waiting_periods.is_empty());

        let parsed = parse_extraction(r#"{"risk_score": "72"}"#).expect("parsed");
        assert_eq!(parsed.risk_score, 72);
    }

    #[test]
    fn test_parse_full_contract() {
        let raw = r#"{
            "risk_score": 68,
            "waiting_periods": [
                {"condition": "Cataract", "duration": "2 years", "impact": "Claims rejected"}
            ],
            "exclusions": [{"item": "Cosmetic surgery", "impact": "You pay everything"}],
            "co_payment": [{"percentage": "20%", "condition": "age above 60", "impact": "You pay a fifth"}],
            "hidden_limits": [{"limit": "Room rent Rs. 3,000/day", "applies_to": "All admissions", "impact": "Proportionate deduction"}],
            "danger_alerts": [{"severity": "Critical", "message": "Very high co-pay for seniors"}]
        }"#;

        let parsed = parse_extraction(raw).expect("parsed");
        assert_eq!(parsed.risk_score, 68);
        assert_eq!(parsed.waiting_periods[0].condition, "Cataract");
        assert_eq!(parsed.danger_alerts[0].severity, Severity::Critical);
        assert_eq!(parsed.item_count(), 5);
    }

    #[test]
    fn test_parse_coerces_bare_strings() {
        let raw = r#"{"risk_score": 30, "exclusions": ["Dental treatment"], "danger_alerts": ["watch out"]}"#;
        let parsed = parse_extraction(raw).expect("parsed");
        assert_eq!(parsed.exclusions[0].item, "Dental treatment");
        assert_eq!(parsed.danger_alerts[0].message, "watch out");
        assert_eq!(parsed.danger_alerts[0].severity, Severity::Medium);
    }

    #[test]
    fn test_parse_unknown_severity_downgrades() {
        let raw = r#"{"danger_alerts": [{"severity": "catastrophic", "message": "m"}]}"#;
        let parsed = parse_extraction(raw).expect("parsed");
        assert_eq!(parsed.danger_alerts[0].severity, Severity::Medium);
    }

    #[test]
    fn test_split_point_prefers_blank_line() {
        let mut text = "x".repeat(3000);
        text.push_str("\n\n");
        text.push_str(&"y".repeat(3100));
        let at = split_point(&text);
        assert_eq!(&text[at..at + 2], "\n\n");
    }

    #[test]
    fn test_prompt_embeds_text_and_contract() {
        let prompt = build_extraction_prompt("CLAUSE BODY HERE");
        assert!(prompt.contains("CLAUSE BODY HERE"));
        assert!(prompt.contains("\"risk_score\""));
        assert!(prompt.contains("danger_alerts"));
    }
}
