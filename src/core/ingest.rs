//! Document Ingestion
//!
//! Turns an uploaded policy document into plain text for the
//! pre-filter. Plain text and Markdown pass through a lossy UTF-8
//! decode; HTML is rendered down to text. Anything that yields less
//! than the readability minimum is rejected as a scanned or image-only
//! source.

use tracing::debug;

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::MIN_READABLE_CHARS;

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Markdown,
    Html,
}

impl DocumentFormat {
    /// Guess the format from a filename hint
    pub fn from_filename(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.ends_with(".html") || lower.ends_with(".htm") {
            Self::Html
        } else if lower.ends_with(".md") || lower.ends_with(".markdown") {
            Self::Markdown
        } else {
            Self::PlainText
        }
    }

    /// Sniff HTML content when no filename hint is available
    pub fn sniff(content: &str) -> Self {
        let head = content.trim_start();
        let head_lower: String = head.chars().take(256).collect::<String>().to_lowercase();
        if head_lower.starts_with("<!doctype html") || head_lower.contains("<html") {
            Self::Html
        } else {
            Self::PlainText
        }
    }
}

/// Extract plain text from a policy document.
///
/// Returns the extracted text with normalized line endings, or an error
/// when the document is empty or has too little readable text.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> AppResult<String> {
    if bytes.is_empty() {
        return Err(AppError::doc_empty());
    }

    let text = match format {
        DocumentFormat::PlainText | DocumentFormat::Markdown => {
            String::from_utf8_lossy(bytes).into_owned()
        }
        // Wide render width keeps clause phrases on one line for the
        // keyword scorer
        DocumentFormat::Html => html2text::from_read(bytes, 10_000).map_err(|e| {
            AppError::with_source(ErrorCode::DocUnsupportedFormat, "Failed to render HTML", e)
        })?,
    };

    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = text.trim().to_string();

    let readable = text.chars().filter(|c| !c.is_whitespace()).count();
    if readable < MIN_READABLE_CHARS {
        return Err(AppError::doc_unreadable(readable));
    }

    debug!(
        format = ?format,
        chars = text.chars().count(),
        "document text extracted"
    );

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_clause() -> String {
        "The Company shall not be liable for any claim arising out of cosmetic surgery, \
         and a waiting period of two years shall apply to cataract treatment under this \
         policy. A co-payment of twenty percent applies to insured persons above sixty. "
            .repeat(2)
    }

    #[test]
    fn test_format_from_filename() {
        assert_eq!(DocumentFormat::from_filename("policy.html"), DocumentFormat::Html);
        assert_eq!(DocumentFormat::from_filename("POLICY.HTM"), DocumentFormat::Html);
        assert_eq!(DocumentFormat::from_filename("terms.md"), DocumentFormat::Markdown);
        assert_eq!(DocumentFormat::from_filename("policy.txt"), DocumentFormat::PlainText);
        assert_eq!(DocumentFormat::from_filename("policy"), DocumentFormat::PlainText);
    }

    #[test]
    fn test_sniff_html() {
        assert_eq!(
            DocumentFormat::sniff("<!DOCTYPE html><html><body>x</body></html>"),
            DocumentFormat::Html
        );
        assert_eq!(DocumentFormat::sniff("Plain policy text"), DocumentFormat::PlainText);
    }

    #[test]
    fn test_plain_text_roundtrip() {
        let body = long_clause();
        let text = extract_text(body.as_bytes(), DocumentFormat::PlainText).expect("extracted");
        assert!(text.contains("cosmetic surgery"));
    }

    #[test]
    fn test_html_rendered_to_text() {
        let html = format!("<html><body><p>{}</p></body></html>", long_clause());
        let text = extract_text(html.as_bytes(), DocumentFormat::Html).expect("extracted");
        assert!(text.contains("cosmetic surgery"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn test_empty_document_rejected() {
        let err = extract_text(b"", DocumentFormat::PlainText).unwrap_err();
        assert_eq!(err.code, ErrorCode::DocEmpty);
    }

    #[test]
    fn test_short_document_rejected() {
        let err = extract_text(b"too short", DocumentFormat::PlainText).unwrap_err();
        assert_eq!(err.code, ErrorCode::DocUnreadable);
    }

    #[test]
    fn test_line_endings_normalized() {
        let body = format!("{}\r\nSecond line of the policy.", long_clause());
        let text = extract_text(body.as_bytes(), DocumentFormat::PlainText).expect("extracted");
        assert!(!text.contains('\r'));
    }
}
