//! Policy Decoder CLI
//!
//! Analyzes one policy document against a policyholder profile and
//! prints the full report: extraction findings, the Vulnerability
//! Score with its component breakdown, and per-condition out-of-pocket
//! projections.
//!
//! Usage:
//!   policy-decoder policy.txt --age 42 --income 900000 \
//!       --sum-insured 500000 --declared Diabetes,Hypertension
//!
//! Environment:
//!   OLLAMA_URL          - Ollama base URL (default: http://localhost:11434)
//!   OLLAMA_MODEL        - Extraction model (default: llama3)
//!   RUST_LOG            - Log level (default: warn for the CLI)

use clap::Parser;
use eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use policy_decoder::core::ingest::DocumentFormat;
use policy_decoder::core::risk_engine::RiskTier;
use policy_decoder::models::types::Severity;
use policy_decoder::utils::constants::{fmt_inr, APP_NAME, APP_VERSION};
use policy_decoder::{DecoderConfig, PolicyAnalyzer, PolicyholderProfile, TelemetryCollector};

#[derive(Parser)]
#[command(
    name = "policy-decoder",
    version,
    about = "Decode a health insurance policy into plain-English risk findings"
)]
struct Cli {
    /// Policy document (.txt, .md, .html)
    file: PathBuf,

    /// Policyholder age
    #[arg(long, default_value_t = 35)]
    age: u32,

    /// Gross annual income (INR)
    #[arg(long, default_value_t = 800_000.0)]
    income: f64,

    /// Policy sum insured (INR)
    #[arg(long, default_value_t = 500_000.0)]
    sum_insured: f64,

    /// Comma-separated pre-existing conditions
    #[arg(long, value_delimiter = ',')]
    declared: Vec<String>,

    /// Pre-filter relevance threshold
    #[arg(long)]
    min_score: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    println!();
    println!("  ================================================");
    println!("    {} v{}", APP_NAME, APP_VERSION);
    println!("    Insurance Policy Decoder");
    println!("  ================================================");
    println!();

    let mut config = DecoderConfig::from_env();
    if let Some(min_score) = cli.min_score {
        config.min_score = min_score;
    }

    let profile = PolicyholderProfile {
        age: cli.age,
        annual_income: cli.income,
        sum_insured: cli.sum_insured,
        declared_conditions: cli.declared.clone(),
    };

    let bytes = tokio::fs::read(&cli.file).await?;
    let format = DocumentFormat::from_filename(&cli.file.to_string_lossy());

    println!("  Reading {} ...", cli.file.display());
    println!("  Model: {} at {}", config.ollama_model, config.ollama_url);
    println!();

    let telemetry = Arc::new(TelemetryCollector::new());
    let analyzer = PolicyAnalyzer::new(config, telemetry);

    let analysis = analyzer.analyze_document(&bytes, format, &profile).await?;

    // -- Coverage --
    let stats = &analysis.filter_stats;
    println!(
        "  Pre-filter: {} of {} paragraphs kept ({:.1}% of the text trimmed)",
        stats.selected_paragraphs, stats.total_paragraphs, stats.reduction_pct
    );
    println!();

    // -- Headline score --
    let assessment = &analysis.assessment;
    let score = &assessment.score;
    section("VULNERABILITY SCORE");
    println!("    {} / 100  [{}]", score.total, score.tier.label());
    println!("    {}", score.tier.detail());
    println!();
    for factor in &score.factors {
        println!(
            "    {:<24} {:>5.1}  (weight {:.2})  {}",
            factor.name, factor.score, factor.weight, factor.reason
        );
    }
    println!();

    if assessment.catastrophic_expenditure_warning {
        section("FINANCIAL CRISIS WARNING");
        println!(
            "    Expected out-of-pocket costs exceed the WHO catastrophic threshold of \
             40% of disposable income."
        );
        println!();
    }

    // -- Findings, most severe first --
    let extraction = &analysis.extraction;
    if !extraction.danger_alerts.is_empty() {
        section("CRITICAL ALERTS");
        for alert in &extraction.danger_alerts {
            let tag = match alert.severity {
                Severity::Critical => "CRITICAL",
                Severity::High => "IMPORTANT",
                Severity::Medium => "NOTE",
            };
            println!("    [{}] {}", tag, alert.message);
        }
        println!();
    }

    if !extraction.waiting_periods.is_empty() {
        section("WAITING PERIOD TRAPS");
        println!("    Claims during these periods are rejected even while premiums are paid.");
        for wp in &extraction.waiting_periods {
            let duration = if wp.duration.is_empty() {
                String::new()
            } else {
                format!(" - {}", wp.duration)
            };
            println!("    * No coverage for {}{}", wp.condition, duration);
            if !wp.impact.is_empty() {
                println!("      {}", wp.impact);
            }
        }
        println!();
    }

    if !extraction.exclusions.is_empty() {
        section("TREATMENTS NOT COVERED");
        println!("    These are paid 100% from your own pocket.");
        for ex in &extraction.exclusions {
            println!("    * {}", ex.item);
            if !ex.impact.is_empty() {
                println!("      {}", ex.impact);
            }
        }
        println!();
    }

    if !extraction.co_payment.is_empty() {
        section("TIMES YOU PAY EXTRA");
        for cp in &extraction.co_payment {
            let when = if cp.condition.is_empty() {
                String::new()
            } else {
                format!(" (when: {})", cp.condition)
            };
            println!("    * You pay {} of the bill yourself{}", cp.percentage, when);
        }
        println!();
    }

    if !extraction.hidden_limits.is_empty() {
        section("HIDDEN LIMITS");
        for hl in &extraction.hidden_limits {
            let applies = if hl.applies_to.is_empty() {
                String::new()
            } else {
                format!(" - applies to {}", hl.applies_to)
            };
            println!("    * {}{}", hl.limit, applies);
        }
        println!();
    }

    // -- Out-of-pocket projection --
    section("5-YEAR OUT-OF-POCKET PROJECTION");
    println!(
        "    Expected total: {}   Rejection risk: {:.1}%",
        fmt_inr(assessment.expected_oop_5yr),
        assessment.rejection_probability_pct
    );
    println!();
    let mut rows: Vec<_> = assessment.condition_breakdown.iter().collect();
    rows.sort_by(|a, b| {
        b.1.expected_oop_5yr
            .partial_cmp(&a.1.expected_oop_5yr)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (condition, exposure) in rows.iter().take(6) {
        let waiting = if exposure.in_waiting_period {
            "  [WAITING PERIOD]"
        } else {
            ""
        };
        println!(
            "    {:<20} {:>12}  (annual probability {:.1}%){}",
            condition,
            fmt_inr(exposure.expected_oop_5yr),
            exposure.annual_probability * 100.0,
            waiting
        );
    }
    println!();

    if score.tier == RiskTier::High {
        println!("  Verdict: read the flagged clauses before renewing this policy.");
    }
    println!("  Done in {} ms.", analysis.latency_ms);

    Ok(())
}

fn section(title: &str) {
    println!("  -- {} --", title);
}
