//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so production logs can be
//! grepped and monitored by category.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - DOC_xxx: Document ingestion errors
//! - LLM_xxx: Ollama / extraction errors
//! - API_xxx: API errors
//! - CFG_xxx: Configuration errors
//! - TERM_xxx: Policy term parsing errors

use std::fmt;

/// Application-wide error type. All failures flow through this type.
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Document Errors (1xx)
    // ============================================
    /// Empty document submitted
    DocEmpty,
    /// No readable text (scanned/image-only source)
    DocUnreadable,
    /// Unsupported document format
    DocUnsupportedFormat,

    // ============================================
    // LLM / Extraction Errors (2xx)
    // ============================================
    /// Cannot connect to Ollama
    LlmConnectionFailed,
    /// Generation request timed out
    LlmTimeout,
    /// Ollama returned a non-success HTTP status
    LlmHttpStatus,
    /// Response body was not the expected shape
    LlmInvalidResponse,
    /// No JSON object recoverable from the completion
    LlmNoJson,
    /// Extraction produced nothing usable across all calls
    LlmNoExtraction,

    // ============================================
    // API Errors (3xx)
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Unauthorized (invalid API key)
    ApiUnauthorized,
    /// Rate limit exceeded
    ApiRateLimited,
    /// Internal server error
    ApiInternalError,
    /// Resource not found
    ApiNotFound,

    // ============================================
    // Configuration Errors (4xx)
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Policy Term Errors (5xx)
    // ============================================
    /// Profile value out of range (age, income, sum insured)
    TermInvalidProfile,
    /// Policy terms inconsistent (e.g. negative deductible)
    TermInvalidValue,

    // ============================================
    // Generic Errors (9xx)
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            // Document Errors
            Self::DocEmpty => "DOC_EMPTY",
            Self::DocUnreadable => "DOC_UNREADABLE",
            Self::DocUnsupportedFormat => "DOC_UNSUPPORTED_FORMAT",

            // LLM / Extraction Errors
            Self::LlmConnectionFailed => "LLM_CONNECTION_FAILED",
            Self::LlmTimeout => "LLM_TIMEOUT",
            Self::LlmHttpStatus => "LLM_HTTP_STATUS",
            Self::LlmInvalidResponse => "LLM_INVALID_RESPONSE",
            Self::LlmNoJson => "LLM_NO_JSON",
            Self::LlmNoExtraction => "LLM_NO_EXTRACTION",

            // API Errors
            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiUnauthorized => "API_UNAUTHORIZED",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiInternalError => "API_INTERNAL_ERROR",
            Self::ApiNotFound => "API_NOT_FOUND",

            // Configuration Errors
            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            // Policy Term Errors
            Self::TermInvalidProfile => "TERM_INVALID_PROFILE",
            Self::TermInvalidValue => "TERM_INVALID_VALUE",

            // Generic
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest
            | Self::DocEmpty
            | Self::DocUnreadable
            | Self::DocUnsupportedFormat
            | Self::TermInvalidProfile
            | Self::TermInvalidValue
            | Self::ConfigInvalidValue => 400,
            Self::ApiUnauthorized => 401,
            Self::ApiNotFound => 404,
            Self::ApiRateLimited => 429,
            Self::LlmConnectionFailed | Self::LlmTimeout => 503,
            _ => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LlmTimeout | Self::LlmConnectionFailed | Self::LlmHttpStatus
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Empty document
    pub fn doc_empty() -> Self {
        Self::new(ErrorCode::DocEmpty, "Document is empty")
    }

    /// No readable text found
    pub fn doc_unreadable(chars: usize) -> Self {
        Self::new(
            ErrorCode::DocUnreadable,
            format!(
                "No readable text found ({} chars). This may be a scanned document; submit a text-based one.",
                chars
            ),
        )
    }

    /// Cannot connect to Ollama
    pub fn llm_connection_failed(base_url: &str) -> Self {
        Self::new(
            ErrorCode::LlmConnectionFailed,
            format!("Cannot connect to Ollama. Make sure it is running at {}", base_url),
        )
    }

    /// Generation timed out
    pub fn llm_timeout() -> Self {
        Self::new(
            ErrorCode::LlmTimeout,
            "LLM request timed out. The filtered text may still be too long; try a lower min_score.",
        )
    }

    /// Non-success HTTP status from Ollama
    pub fn llm_http_status(status: u16) -> Self {
        Self::new(
            ErrorCode::LlmHttpStatus,
            format!("Ollama returned HTTP {}", status),
        )
    }

    /// Nothing extractable across all calls
    pub fn llm_no_extraction() -> Self {
        Self::new(
            ErrorCode::LlmNoExtraction,
            "Could not extract data from the policy. Check that the document has readable text.",
        )
    }

    /// Invalid policyholder profile
    pub fn invalid_profile(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::TermInvalidProfile, msg)
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// API internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::llm_timeout()
        } else if err.is_connect() {
            Self::new(ErrorCode::LlmConnectionFailed, "Connection failed")
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::LlmInvalidResponse, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::llm_timeout();
        assert_eq!(err.code, ErrorCode::LlmTimeout);
        assert_eq!(err.code_str(), "LLM_TIMEOUT");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::LlmTimeout.is_retryable());
        assert!(ErrorCode::LlmConnectionFailed.is_retryable());
        assert!(!ErrorCode::DocUnreadable.is_retryable());
        assert!(!ErrorCode::LlmNoExtraction.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::ApiBadRequest.http_status(), 400);
        assert_eq!(ErrorCode::DocUnreadable.http_status(), 400);
        assert_eq!(ErrorCode::ApiRateLimited.http_status(), 429);
        assert_eq!(ErrorCode::LlmConnectionFailed.http_status(), 503);
        assert_eq!(ErrorCode::LlmNoExtraction.http_status(), 500);
    }

    #[test]
    fn test_display_includes_code() {
        let err = AppError::doc_empty();
        assert!(err.to_string().starts_with("[DOC_EMPTY]"));
    }
}
