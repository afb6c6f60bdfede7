//! Configuration module for the Policy Decoder
//!
//! All defaults come from utils/constants.rs; every knob can be
//! overridden through the environment.

use std::time::Duration;

use crate::utils::constants::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_LLM_TIMEOUT_SECS, DEFAULT_MIN_SCORE, DEFAULT_OLLAMA_MODEL,
    DEFAULT_OLLAMA_URL,
};

/// Runtime configuration shared by the CLI and the API server
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Ollama base URL (OLLAMA_URL)
    pub ollama_url: String,
    /// Extraction model name (OLLAMA_MODEL)
    pub ollama_model: String,
    /// Timeout for one generation request (OLLAMA_TIMEOUT_SECS)
    pub llm_timeout: Duration,
    /// Minimum relevance score for the pre-filter (DECODER_MIN_SCORE)
    pub min_score: f64,
    /// Assessment cache TTL in seconds (DECODER_CACHE_TTL_SECS)
    pub cache_ttl_secs: u64,
}

impl DecoderConfig {
    /// Build configuration from the environment, falling back to the
    /// constants module for anything unset.
    pub fn from_env() -> Self {
        let ollama_url = std::env::var("OLLAMA_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        let ollama_model = std::env::var("OLLAMA_MODEL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string());

        let timeout_secs = std::env::var("OLLAMA_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS);

        let min_score = std::env::var("DECODER_MIN_SCORE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MIN_SCORE);

        let cache_ttl_secs = std::env::var("DECODER_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);

        Self {
            ollama_url,
            ollama_model,
            llm_timeout: Duration::from_secs(timeout_secs),
            min_score,
            cache_ttl_secs,
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            llm_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
            min_score: DEFAULT_MIN_SCORE,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = DecoderConfig::default();
        assert_eq!(cfg.ollama_url, DEFAULT_OLLAMA_URL);
        assert_eq!(cfg.ollama_model, DEFAULT_OLLAMA_MODEL);
        assert_eq!(cfg.llm_timeout, Duration::from_secs(180));
    }
}
