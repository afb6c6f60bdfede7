//! Clause Relevance Pre-Filter
//!
//! Instead of blindly chunking a whole policy and paying one LLM call per
//! chunk, the document is reduced to the paragraphs that actually carry
//! risk signals:
//!
//! 1. Split into paragraphs (the natural semantic unit in policy docs).
//! 2. Score every paragraph by weighted risk-signal keywords.
//! 3. Capture context neighbours around each hit, since a clause often
//!    spans two paragraphs (keyword in para N, the actual exclusion list
//!    in para N+1).
//! 4. Keep section-header paragraphs and their followthrough even without
//!    keywords, because headers introduce whole sections that matter.
//! 5. Return one filtered string for a single LLM call, plus coverage
//!    statistics for reporting.
//!
//! A 15,000-word policy typically reduces to 2,000-4,000 words of dense
//! relevant content while retaining virtually everything that matters for
//! exclusion and waiting-period detection.

use lazy_static::lazy_static;
use regex::{Regex, RegexSet};

use crate::models::types::FilterStats;
use crate::utils::constants::{
    CONTEXT_WINDOW, DEFAULT_MIN_SCORE, EXACT_MATCH_BONUS, FALLBACK_MIN_SCORE,
    HEADER_FOLLOWTHROUGH, MAX_CAPS_HEADER_CHARS, MAX_HEADER_CHARS, MIN_PARAGRAPH_CHARS,
};

/// Keyword groups, each capturing a different risk category.
/// Higher weight = stronger signal.
const KEYWORD_GROUPS: &[(f64, &[&str])] = &[
    // Exclusions: highest weight, most directly actionable
    (4.0, &[
        "not covered", "not payable", "not admissible", "not entitled",
        "excluded", "exclusion", "exclusions", "shall not be liable",
        "shall not cover", "will not cover", "does not cover",
        "no benefit", "no claim", "no coverage", "outside the scope",
        "beyond the scope", "expressly excluded", "specifically excluded",
    ]),
    // Waiting periods: high weight, directly causes claim rejection
    (3.5, &[
        "waiting period", "waiting periods", "initial waiting",
        "specific illness", "pre-existing disease waiting",
        "ped waiting", "30-day waiting", "30 day waiting",
        "first 30 days", "first year", "first two years",
        "first 2 years", "first 4 years", "moratorium",
        "cooling period", "qualifying period",
    ]),
    // Co-payment and deductibles
    (3.0, &[
        "co-payment", "co payment", "copayment", "copay", "co-pay",
        "deductible", "you shall bear", "insured shall bear",
        "policyholder shall pay", "out of pocket", "your share",
        "proportionate deduction",
    ]),
    // Sub-limits and caps
    (3.0, &[
        "sub-limit", "sub limit", "sublimit", "capped at", "cap of",
        "maximum payable", "maximum benefit", "maximum liability",
        "not exceed", "shall not exceed", "up to a maximum",
        "room rent", "room charge", "icu charges", "icu limit",
        "day care", "ambulance charge", "organ donor",
        "ayurvedic", "homeopathic", "dental limit",
        "maternity limit", "newborn limit",
    ]),
    // General risk signals: lower weight but still worth including
    (1.5, &[
        "shall not", "will not", "is not", "are not", "cannot",
        "liable", "liability", "obligation",
        "clause", "condition", "provision", "exception",
        "herein", "notwithstanding", "irrespective",
        "subject to", "provided that", "provided however",
        "in no event", "under no circumstances",
    ]),
];

lazy_static! {
    /// Section headers that signal a whole section of interest follows
    static ref IMPORTANT_SECTION_HEADERS: RegexSet = RegexSet::new([
        r"exclusion", r"not covered", r"what (is|are) not",
        r"waiting period", r"waiting clause",
        r"co.?pay", r"co.?payment", r"deductible",
        r"sub.?limit", r"coverage limit", r"benefit limit",
        r"general condition", r"special condition", r"important condition",
        r"terms and condition", r"definitions", r"interpretation",
        r"claim procedure", r"claim process",
    ])
    .expect("header patterns are valid");

    /// Numbered section headings like "Section 4: Exclusions"
    static ref NUMBERED_HEADING: Regex =
        Regex::new(r"^(section|clause|article|schedule|part)\s+[\dIVXivx]+")
            .expect("heading pattern is valid");

    /// List-item openings that start a new paragraph mid-block
    static ref LIST_ITEM_BOUNDARY: Regex =
        Regex::new(r"\n(\s*(?:\d+\.|[a-z]\)|•|–|—|\*)\s)").expect("boundary pattern is valid");

    /// Blank-line paragraph separator
    static ref PARA_SEPARATOR: Regex = Regex::new(r"\n{2,}").expect("separator pattern is valid");

    /// Fragments that are purely numeric/whitespace (page footers)
    static ref NUMERIC_FRAGMENT: Regex =
        Regex::new(r"^[\d\s\-\.]+$").expect("fragment pattern is valid");
}

/// Split text into meaningful paragraphs.
///
/// Double newlines, bullet points, and numbered list items are
/// boundaries. Very short fragments (page headers/footers) and purely
/// numeric fragments are dropped.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    // Promote list-item openings to full paragraph breaks, then split
    // on blank lines. Mirrors a lookahead split without needing one.
    let with_breaks = LIST_ITEM_BOUNDARY.replace_all(&text, "\n\n$1");

    PARA_SEPARATOR
        .split(&with_breaks)
        .filter_map(|p| {
            let p = p.trim();
            if p.chars().count() < MIN_PARAGRAPH_CHARS {
                return None;
            }
            if NUMERIC_FRAGMENT.is_match(p) {
                return None;
            }
            Some(p.to_string())
        })
        .collect()
}

/// True when `needle` occurs in `haystack` on word boundaries
/// (the ends of the match are not flanked by word characters)
fn has_exact_match(haystack: &str, needle: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut search_from = 0;

    while let Some(pos) = haystack[search_from..].find(needle) {
        let start = search_from + pos;
        let end = start + needle.len();

        let before_ok = haystack[..start].chars().next_back().map_or(true, |c| !is_word(c));
        let after_ok = haystack[end..].chars().next().map_or(true, |c| !is_word(c));

        if before_ok && after_ok {
            return true;
        }
        search_from = start + 1;
    }
    false
}

/// Relevance score for a paragraph. Higher = more likely to contain
/// policy risk information.
pub fn score_paragraph(para: &str) -> f64 {
    let lower = para.to_lowercase();
    let mut score = 0.0;

    for (weight, keywords) in KEYWORD_GROUPS {
        for kw in *keywords {
            if lower.contains(kw) {
                score += weight;
                // Bonus for exact phrase matches, not just substrings
                if has_exact_match(&lower, kw) {
                    score += weight * EXACT_MATCH_BONUS;
                }
            }
        }
    }

    score
}

/// True if the paragraph looks like a section heading that introduces an
/// important section (exclusions, waiting periods, ...)
pub fn is_section_header(para: &str) -> bool {
    // Very long paragraphs are not headers
    if para.chars().count() > MAX_HEADER_CHARS {
        return false;
    }

    let lower = para.to_lowercase();
    let lower = lower.trim();

    if IMPORTANT_SECTION_HEADERS.is_match(lower) {
        return true;
    }

    // ALL-CAPS short lines are common section titles in policy docs
    let has_alpha = para.chars().any(|c| c.is_alphabetic());
    let has_lower = para.chars().any(|c| c.is_lowercase());
    if has_alpha && !has_lower && para.chars().count() < MAX_CAPS_HEADER_CHARS {
        return true;
    }

    NUMBERED_HEADING.is_match(lower)
}

/// Reduce a policy document to its risk-relevant paragraphs.
///
/// Returns the filtered text (ready for a single LLM call) and coverage
/// statistics. Paragraphs scoring at least `min_score` are included
/// directly; neighbours and header followthroughs ride along. If
/// selection covers suspiciously little of the document (unusual
/// formatting, decorated scans), a lower-threshold sweep runs as a
/// safety net. Non-contiguous blocks are separated with `---` so the
/// model does not read unrelated paragraphs as connected.
pub fn extract_relevant_text(text: &str, min_score: f64) -> (String, FilterStats) {
    let total_chars = text.chars().count();
    let paragraphs = split_paragraphs(text);
    let n = paragraphs.len();

    if n == 0 {
        return (
            text.to_string(),
            FilterStats {
                total_paragraphs: 0,
                selected_paragraphs: 0,
                total_chars,
                filtered_chars: total_chars,
                reduction_pct: 0.0,
            },
        );
    }

    let scores: Vec<f64> = paragraphs.iter().map(|p| score_paragraph(p)).collect();
    let mut include = vec![false; n];

    for (i, (para, score)) in paragraphs.iter().zip(&scores).enumerate() {
        if *score >= min_score {
            for j in i.saturating_sub(CONTEXT_WINDOW)..(i + CONTEXT_WINDOW + 1).min(n) {
                include[j] = true;
            }
        }

        if is_section_header(para) {
            include[i] = true;
            for j in (i + 1)..(i + HEADER_FOLLOWTHROUGH + 1).min(n) {
                include[j] = true;
            }
        }
    }

    // Safety net: under max(3, 10%) selected means something is off.
    // Re-sweep with a lowered threshold.
    let selected = include.iter().filter(|&&inc| inc).count();
    if selected < 3.max(n / 10) {
        for (i, score) in scores.iter().enumerate() {
            if *score >= FALLBACK_MIN_SCORE {
                for j in i.saturating_sub(1)..(i + 2).min(n) {
                    include[j] = true;
                }
            }
        }
    }

    let selected = include.iter().filter(|&&inc| inc).count();

    // Rebuild in original order, marking gaps between blocks
    let mut parts: Vec<&str> = Vec::new();
    let mut prev_included = false;
    for (para, inc) in paragraphs.iter().zip(&include) {
        if *inc {
            if !parts.is_empty() && !prev_included {
                parts.push("---");
            }
            parts.push(para);
            prev_included = true;
        } else {
            prev_included = false;
        }
    }

    let filtered = parts.join("\n\n");
    let filtered_chars = filtered.chars().count();
    let reduction_pct = if total_chars > 0 {
        ((1.0 - filtered_chars as f64 / total_chars as f64) * 1000.0).round() / 10.0
    } else {
        0.0
    };

    let stats = FilterStats {
        total_paragraphs: n,
        selected_paragraphs: selected,
        total_chars,
        filtered_chars,
        reduction_pct,
    };

    (filtered, stats)
}

/// Convenience wrapper using the default threshold
pub fn extract_relevant_text_default(text: &str) -> (String, FilterStats) {
    extract_relevant_text(text, DEFAULT_MIN_SCORE)
}

/// Legacy chunker. Superseded by [`extract_relevant_text`] but kept for
/// callers that need fixed-size windows, e.g. very long appendices.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let text_len = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < text_len {
        let mut end = (start + chunk_size).min(text_len);

        // Prefer a newline or sentence break near the boundary
        if end < text_len {
            let window_start = (start + chunk_size).saturating_sub(400);
            let window: String = chars[window_start..end].iter().collect();
            let bp = window.rfind('\n').or_else(|| window.rfind(". "));
            if let Some(p) = bp {
                end = window_start + window[..p].chars().count() + 1;
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if end >= text_len {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXCLUSION_PARA: &str = "The Company shall not be liable to make any payment \
        for any claim in respect of cosmetic or plastic surgery, as the same is \
        specifically excluded under this Policy.";

    #[test]
    fn test_split_drops_page_furniture() {
        let text = "Page 3 of 40\n\n12.\n\nThis paragraph is long enough to survive the \
            minimum length cut and should be retained by the splitter.";
        let paras = split_paragraphs(text);
        assert_eq!(paras.len(), 1);
        assert!(paras[0].starts_with("This paragraph"));
    }

    #[test]
    fn test_split_on_list_items() {
        let text = "GENERAL EXCLUSIONS APPLICABLE TO THIS POLICY\n1. War or any act of war, \
            invasion or civil unrest shall not be covered under this policy.\n2. Treatment \
            arising from participation in hazardous activities is excluded from coverage.";
        let paras = split_paragraphs(text);
        assert_eq!(paras.len(), 3);
    }

    #[test]
    fn test_scoring_prefers_exclusions() {
        let neutral = "The insured person may renew the policy on the renewal date with \
            continuity of benefits as applicable.";
        assert!(score_paragraph(EXCLUSION_PARA) > score_paragraph(neutral));
        assert!(score_paragraph(EXCLUSION_PARA) >= 4.0);
    }

    #[test]
    fn test_exact_match_bonus() {
        // "excluded" as a word scores the bonus; buried inside another
        // word it only gets the substring hit
        let exact = score_paragraph("this treatment is excluded entirely from the policy plan");
        let substring = score_paragraph("this treatment is unexcludedly covered by the policy plan");
        assert!(exact > substring);
    }

    #[test]
    fn test_section_header_detection() {
        assert!(is_section_header("SECTION 4: WAITING PERIODS"));
        assert!(is_section_header("What is not covered"));
        assert!(is_section_header("PERMANENT EXCLUSIONS"));
        assert!(!is_section_header(EXCLUSION_PARA));
    }

    #[test]
    fn test_filter_selects_header_followthrough() {
        let mut doc = String::from("SECTION 2: DEFINITIONS AND INTERPRETATION\n\n");
        for i in 0..4 {
            doc.push_str(&format!(
                "Neutral renewal paragraph number {} about premium payment dates and grace \
                 windows for the insured person.\n\n",
                i
            ));
        }
        let (filtered, stats) = extract_relevant_text(&doc, DEFAULT_MIN_SCORE);
        assert_eq!(stats.total_paragraphs, 5);
        // Header + all followthrough paragraphs selected
        assert_eq!(stats.selected_paragraphs, 5);
        assert!(filtered.contains("DEFINITIONS"));
    }

    #[test]
    fn test_filter_marks_gaps() {
        let mut doc = String::new();
        doc.push_str(EXCLUSION_PARA);
        doc.push_str("\n\n");
        for i in 0..6 {
            doc.push_str(&format!(
                "Plain narrative paragraph number {} describing the insurer's postal address \
                 and office working hours in detail.\n\n",
                i
            ));
        }
        doc.push_str("A co-payment of 20% shall apply to every admissible claim and the \
            insured shall bear that share of the bill.");

        let (filtered, stats) = extract_relevant_text(&doc, DEFAULT_MIN_SCORE);
        assert!(filtered.contains("---"), "non-contiguous blocks get a separator");
        assert!(stats.selected_paragraphs < stats.total_paragraphs);
        assert!(stats.reduction_pct > 0.0);
    }

    #[test]
    fn test_empty_document_passthrough() {
        let (filtered, stats) = extract_relevant_text("", DEFAULT_MIN_SCORE);
        assert_eq!(filtered, "");
        assert_eq!(stats.total_paragraphs, 0);
        assert_eq!(stats.reduction_pct, 0.0);
    }

    #[test]
    fn test_chunk_text_covers_input() {
        let text = "A sentence about policy terms. ".repeat(400);
        let chunks = chunk_text(&text, 3000, 200);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 3000));
    }
}
