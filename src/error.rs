//! Error types for the studymate library.
//!
//! Every pipeline stage returns `Result<_, StudyError>` and the page
//! controller ([`crate::study::StudyMate`]) propagates with `?`. Nothing is
//! swallowed: each variant carries enough detail to be shown to the user as
//! is, and a failed action never disturbs session state beyond the artifact
//! it was trying to produce.
//!
//! The variants follow the pipeline from left to right:
//!
//! ```text
//! upload ──▶ extract ──▶ prompt ──▶ generate ──▶ parse
//! Unsupported ExtractionFailed      AuthError     MalformedResponse
//! FileNotFound EmptyDocument        NetworkError
//!                                   Timeout
//!                                   RemoteError
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Longest raw-payload excerpt carried by [`StudyError::MalformedResponse`].
pub const EXCERPT_CHARS: usize = 200;

/// All errors returned by the studymate library.
#[derive(Debug, Error)]
pub enum StudyError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The uploaded file is neither typed nor named as a PDF.
    #[error("'{file_name}' is not a PDF (content type: {content_type})\nPlease upload a .pdf file.")]
    UnsupportedUpload {
        file_name: String,
        content_type: String,
    },

    /// A user-supplied value (question, topic) was unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ── Document errors ───────────────────────────────────────────────────
    /// The bytes could not be parsed as a PDF.
    #[error("An error occurred while processing the PDF: {detail}")]
    ExtractionFailed { detail: String },

    /// The PDF parsed but carries no text layer.
    #[error(
        "The uploaded PDF appears to be empty or an image-based PDF (scanned document).\n\
Please upload a text-based PDF."
    )]
    EmptyDocument,

    /// A document-based task was requested before any upload.
    #[error("No document uploaded yet. Please upload a PDF first.")]
    MissingDocument,

    // ── Generation errors ─────────────────────────────────────────────────
    /// Credential missing, blank, or rejected by the service.
    #[error("Authentication error: {detail}\nSet GEMINI_API_KEY or pass --api-key.")]
    AuthError { detail: String },

    /// Transport-level failure before a response was received.
    #[error("Network error: {detail}\nCheck your internet connection.")]
    NetworkError { detail: String },

    /// The remote call exceeded its bound.
    #[error("Generation request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The service answered with an error status.
    #[error("API error {status}: {detail}")]
    RemoteError { status: u16, detail: String },

    /// The payload was not valid for the expected shape.
    #[error("Failed to parse the response: {detail}\nRaw payload (truncated): {excerpt:?}")]
    MalformedResponse { detail: String, excerpt: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StudyError {
    /// Build a [`StudyError::MalformedResponse`] with an excerpt of `raw`.
    pub fn malformed(detail: impl Into<String>, raw: &str) -> Self {
        StudyError::MalformedResponse {
            detail: detail.into(),
            excerpt: excerpt(raw, EXCERPT_CHARS),
        }
    }

    /// True for the errors that come back from the generation service.
    ///
    /// The CLI uses this to suggest a manual retry.
    pub fn is_generation_error(&self) -> bool {
        matches!(
            self,
            StudyError::NetworkError { .. }
                | StudyError::Timeout { .. }
                | StudyError::RemoteError { .. }
                | StudyError::MalformedResponse { .. }
        )
    }
}

/// Cut `s` to at most `max_chars` characters, marking the cut with `…`.
pub(crate) fn excerpt(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}\u{2026}", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display() {
        let e = StudyError::Timeout { timeout_ms: 5000 };
        assert!(e.to_string().contains("5000ms"), "got: {e}");
    }

    #[test]
    fn remote_error_display() {
        let e = StudyError::RemoteError {
            status: 503,
            detail: "The model is overloaded".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("overloaded"));
    }

    #[test]
    fn auth_error_display() {
        let e = StudyError::AuthError {
            detail: "API key is missing".into(),
        };
        assert!(e.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn malformed_truncates_payload() {
        let raw = "x".repeat(EXCERPT_CHARS + 50);
        match StudyError::malformed("expected a JSON array", &raw) {
            StudyError::MalformedResponse { excerpt, .. } => {
                assert_eq!(excerpt.chars().count(), EXCERPT_CHARS + 1);
                assert!(excerpt.ends_with('\u{2026}'));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("héllo", 2), "hé\u{2026}");
        assert_eq!(excerpt("short", 10), "short");
    }

    #[test]
    fn generation_errors_are_flagged() {
        assert!(StudyError::Timeout { timeout_ms: 1 }.is_generation_error());
        assert!(!StudyError::EmptyDocument.is_generation_error());
        assert!(!StudyError::AuthError { detail: String::new() }.is_generation_error());
    }
}
