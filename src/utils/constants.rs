//! Constants Module - Single Source of Truth
//!
//! Every constant, reference table, and conversion helper used across the
//! application is defined here. No hardcoded values in other modules.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "PolicyDecoder";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for HTTP requests
pub const USER_AGENT: &str = "PolicyDecoder/0.1.0";

// ============================================
// LLM CONSTANTS
// ============================================

/// Default Ollama base URL
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default extraction model
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

/// Default timeout for a single generation request (seconds).
/// Local models on CPU can take minutes on long prompts.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 180;

/// Sampling temperature for extraction (near-deterministic)
pub const LLM_TEMPERATURE: f64 = 0.05;

/// Nucleus sampling cutoff
pub const LLM_TOP_P: f64 = 0.9;

/// Context window requested from the model
pub const LLM_NUM_CTX: u32 = 8192;

/// Filtered text above this length is split into two focused calls.
/// Keeps total LLM calls at 1-2 regardless of document length.
pub const MAX_SINGLE_CALL_CHARS: usize = 6000;

// Note: retry constants live in src/providers/ollama.rs next to the
// backoff loop that uses them.

// ============================================
// DOCUMENT / FILTER CONSTANTS
// ============================================

/// Documents with less readable text than this are rejected
/// (almost always a scanned or image-only source).
pub const MIN_READABLE_CHARS: usize = 200;

/// Fragments shorter than this are dropped during paragraph splitting
/// (page numbers, running headers)
pub const MIN_PARAGRAPH_CHARS: usize = 30;

/// Paragraphs longer than this are never treated as section headers
pub const MAX_HEADER_CHARS: usize = 300;

/// ALL-CAPS lines up to this length count as section headers
pub const MAX_CAPS_HEADER_CHARS: usize = 100;

/// Neighbouring paragraphs included around each scoring hit
pub const CONTEXT_WINDOW: usize = 1;

/// Paragraphs included after a section-header match
pub const HEADER_FOLLOWTHROUGH: usize = 8;

/// Default minimum relevance score for direct inclusion
pub const DEFAULT_MIN_SCORE: f64 = 2.0;

/// Lowered threshold used by the low-coverage fallback sweep
pub const FALLBACK_MIN_SCORE: f64 = 0.5;

/// Bonus multiplier for exact word-boundary keyword matches
pub const EXACT_MATCH_BONUS: f64 = 0.3;

// ============================================
// CACHE CONSTANTS
// ============================================

/// Default cache TTL (seconds)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

// ============================================
// RISK ENGINE CONSTANTS
// ============================================

/// Average hospitalization costs in INR.
/// Source: NHA Health Accounts, IRDAI Annual Reports.
pub const AVG_TREATMENT_COST: [(&str, f64); 10] = [
    ("Diabetes", 85_000.0),
    ("Hypertension", 65_000.0),
    ("Heart Disease", 350_000.0),
    ("Thyroid Disorders", 70_000.0),
    ("Dental Treatment", 45_000.0),
    ("Cancer", 600_000.0),
    ("Kidney Disease", 400_000.0),
    ("Orthopedic Surgery", 200_000.0),
    ("Maternity", 120_000.0),
    ("Cataract", 55_000.0),
];

/// Fallback treatment cost for conditions outside the reference table
pub const DEFAULT_TREATMENT_COST: f64 = 100_000.0;

/// Upper bounds of the age bands used by the prevalence tables
pub const AGE_BANDS: [u32; 5] = [25, 35, 45, 55, 120];

/// Age-banded annual hospitalization probabilities per condition.
/// Based on ICMR epidemiological data.
pub const BASE_DISEASE_PREVALENCE: [(&str, [f64; 5]); 10] = [
    ("Diabetes", [0.04, 0.10, 0.18, 0.28, 0.38]),
    ("Hypertension", [0.05, 0.12, 0.22, 0.35, 0.48]),
    ("Heart Disease", [0.02, 0.06, 0.14, 0.25, 0.40]),
    ("Thyroid Disorders", [0.03, 0.07, 0.12, 0.16, 0.20]),
    ("Dental Treatment", [0.15, 0.20, 0.25, 0.30, 0.35]),
    ("Cancer", [0.01, 0.02, 0.05, 0.09, 0.14]),
    ("Kidney Disease", [0.01, 0.03, 0.07, 0.12, 0.18]),
    ("Orthopedic Surgery", [0.03, 0.06, 0.10, 0.18, 0.28]),
    ("Maternity", [0.10, 0.20, 0.05, 0.00, 0.00]),
    ("Cataract", [0.00, 0.01, 0.05, 0.15, 0.35]),
];

/// Prevalence fallback for conditions outside the reference table
pub const DEFAULT_PREVALENCE: [f64; 5] = [0.05, 0.08, 0.12, 0.18, 0.25];

/// Assumed standard room rent (INR/day). Caps below this trigger
/// proportionate deduction of the room-linked share of the bill.
pub const ASSUMED_STANDARD_ROOM_RENT: f64 = 5_000.0;

/// Share of a hospital bill linked to room category
pub const ROOM_RENT_BILL_SHARE: f64 = 0.4;

/// Share of gross income treated as disposable
pub const DISPOSABLE_INCOME_SHARE: f64 = 0.7;

/// Out-of-pocket projection horizon (years)
pub const PROJECTION_YEARS: u32 = 5;

/// Annual probability cap before multi-year compounding
pub const MAX_ANNUAL_PROBABILITY: f64 = 0.99;

/// WHO catastrophic health expenditure threshold (FER)
pub const CATASTROPHIC_FER: f64 = 0.40;

/// Exclusion-density weights: exclusions, waiting periods, hidden limits,
/// co-payments
pub const DENSITY_WEIGHTS: [f64; 4] = [3.0, 2.5, 2.0, 1.5];

/// Sigmoid steepness for density normalization
pub const DENSITY_SIGMOID_SLOPE: f64 = 0.1;

/// Sigmoid midpoint for density normalization
pub const DENSITY_SIGMOID_MIDPOINT: f64 = 15.0;

/// Composite weights: financial exposure, rejection risk, exclusion
/// density, LLM soft signal
pub const COMPOSITE_WEIGHTS: [f64; 4] = [0.38, 0.32, 0.22, 0.08];

/// Vulnerability tier thresholds: High, Moderate, Low-Moderate
pub const TIER_THRESHOLDS: [u8; 3] = [75, 50, 25];

/// LLM soft signal used when no call returned a usable score
pub const DEFAULT_LLM_SIGNAL: u8 = 50;

// ============================================
// POLICYHOLDER DEFAULTS
// ============================================

/// Default sum insured (INR)
pub const DEFAULT_SUM_INSURED: f64 = 500_000.0;

/// Default annual income (INR)
pub const DEFAULT_ANNUAL_INCOME: f64 = 1_000_000.0;

/// Default policyholder age
pub const DEFAULT_AGE: u32 = 30;

// ============================================
// CONVERSION HELPERS
// ============================================

/// Treatment cost lookup with table fallback
pub fn treatment_cost(condition: &str) -> f64 {
    AVG_TREATMENT_COST
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(condition))
        .map(|(_, cost)| *cost)
        .unwrap_or(DEFAULT_TREATMENT_COST)
}

/// Age-banded prevalence lookup with table fallback
pub fn disease_prevalence(condition: &str) -> [f64; 5] {
    BASE_DISEASE_PREVALENCE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(condition))
        .map(|(_, probs)| *probs)
        .unwrap_or(DEFAULT_PREVALENCE)
}

/// All conditions covered by the reference tables
pub fn known_conditions() -> Vec<&'static str> {
    AVG_TREATMENT_COST.iter().map(|(name, _)| *name).collect()
}

/// Index of the age band an age falls into
pub fn age_band_index(age: u32) -> usize {
    AGE_BANDS
        .iter()
        .position(|&upper| age <= upper)
        .unwrap_or(AGE_BANDS.len() - 1)
}

/// Indian-style INR display: crores, lakhs, thousands
pub fn fmt_inr(amount: f64) -> String {
    if amount >= 10_000_000.0 {
        format!("Rs. {:.1} Cr", amount / 10_000_000.0)
    } else if amount >= 100_000.0 {
        format!("Rs. {:.1} L", amount / 100_000.0)
    } else if amount >= 1_000.0 {
        format!("Rs. {:.0}K", amount / 1_000.0)
    } else {
        format!("Rs. {}", amount as i64)
    }
}
