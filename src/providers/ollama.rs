//! Ollama API Client
//!
//! Gateway to the locally hosted LLM. One endpoint is used:
//! POST {base_url}/api/generate with streaming disabled.
//!
//! Sampling is pinned near-deterministic (temperature 0.05) because the
//! caller is extracting clauses, not writing prose. Transient failures
//! (connect, timeout, 429/5xx) are retried with jittered exponential
//! backoff; everything else surfaces immediately.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::config::DecoderConfig;
use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::{LLM_NUM_CTX, LLM_TEMPERATURE, LLM_TOP_P, USER_AGENT};

/// First retry delay
const BASE_RETRY_MS: u64 = 1_000;

/// Random jitter added to each retry delay
const MAX_JITTER_MS: u64 = 250;

/// Retries after the initial attempt
const MAX_RETRIES: u32 = 2;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
    num_ctx: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for a local Ollama server
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &DecoderConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.llm_timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            model: config.ollama_model.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    /// Run one generation and return the completion text.
    /// Retries transient failures up to [`MAX_RETRIES`] times.
    pub async fn generate(&self, prompt: &str) -> AppResult<String> {
        let mut attempt = 0u32;

        loop {
            match self.generate_once(prompt).await {
                Ok(text) => return Ok(text),
                Err((err, transient)) => {
                    if !transient || attempt >= MAX_RETRIES {
                        return Err(err);
                    }

                    let backoff = BASE_RETRY_MS * 2u64.pow(attempt);
                    let jitter = rand::thread_rng().gen_range(0..MAX_JITTER_MS);
                    warn!(
                        code = err.code_str(),
                        attempt = attempt + 1,
                        delay_ms = backoff + jitter,
                        "transient LLM failure, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Single request; the bool marks errors worth retrying
    async fn generate_once(&self, prompt: &str) -> Result<String, (AppError, bool)> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: LLM_TEMPERATURE,
                top_p: LLM_TOP_P,
                num_ctx: LLM_NUM_CTX,
            },
        };

        debug!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "sending generation request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    (AppError::llm_connection_failed(&self.base_url), true)
                } else if e.is_timeout() {
                    (AppError::llm_timeout(), true)
                } else {
                    (AppError::from(e), false)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let transient = status.as_u16() == 429 || status.is_server_error();
            return Err((AppError::llm_http_status(status.as_u16()), transient));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| (AppError::from(e), false))?;

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_normalizes_trailing_slash() {
        let config = DecoderConfig {
            ollama_url: "http://localhost:11434/".to_string(),
            ..Default::default()
        };
        let client = OllamaClient::new(&config);
        assert_eq!(client.endpoint(), "http://localhost:11434/api/generate");
    }

    #[test]
    fn test_request_serialization() {
        let body = GenerateRequest {
            model: "llama3",
            prompt: "hello",
            stream: false,
            options: GenerateOptions {
                temperature: LLM_TEMPERATURE,
                top_p: LLM_TOP_P,
                num_ctx: LLM_NUM_CTX,
            },
        };
        let json = serde_json::to_value(&body).expect("serializes");
        assert_eq!(json["model"], "llama3");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_ctx"], 8192);
    }
}
