//! PDF text extraction.
//!
//! Uses [`pdf_extract`] to pull the text layer out of an in-memory PDF.
//! `pdf_extract` can panic on malformed input rather than returning an error,
//! so every call is wrapped in [`std::panic::catch_unwind`] and a panic is
//! reported as [`StudyError::ExtractionFailed`].
//!
//! The result is all-or-nothing: either the full text of every page, an
//! empty string for a document without a text layer, or an error.

use crate::error::StudyError;
use crate::pipeline::input::Upload;
use crate::session::{Document, ExtractionStatus};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// Extract the text of every page, concatenated in page order.
///
/// Returns an empty string when the PDF parses but no page has any
/// non-whitespace text (scanned or image-only documents).
pub fn extract_text(bytes: &[u8]) -> Result<String, StudyError> {
    if find_header(bytes).is_none() {
        return Err(StudyError::ExtractionFailed {
            detail: format!("not a PDF file (no %PDF header in the first {HEADER_WINDOW} bytes)"),
        });
    }

    let pages = extract_pages(bytes)?;
    debug!("Extracted {} pages", pages.len());

    if pages.is_empty() {
        return Err(StudyError::ExtractionFailed {
            detail: "the document has no pages".into(),
        });
    }
    if pages.iter().all(|p| p.trim().is_empty()) {
        return Ok(String::new());
    }
    Ok(pages.concat())
}

/// Readers accept the `%PDF` header anywhere in the first 1024 bytes.
const HEADER_WINDOW: usize = 1024;

/// Offset of the `%PDF` header, if it sits inside [`HEADER_WINDOW`].
fn find_header(bytes: &[u8]) -> Option<usize> {
    bytes[..bytes.len().min(HEADER_WINDOW)]
        .windows(4)
        .position(|w| w == b"%PDF")
}

/// Run [`pdf_extract`] behind an unwind boundary.
fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, StudyError> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));
    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(StudyError::ExtractionFailed {
            detail: e.to_string(),
        }),
        Err(_) => Err(StudyError::ExtractionFailed {
            detail: "PDF parser panicked (malformed document)".into(),
        }),
    }
}

/// Turn an upload into a [`Document`].
///
/// Extraction is CPU-bound and runs on the blocking pool so the async
/// workers stay responsive. Failures are recorded in the document's status
/// rather than returned; the caller decides how to surface them.
pub async fn extract_document(upload: Upload) -> Result<Document, StudyError> {
    let file_name = upload.file_name.clone();
    info!("Extracting text from '{}' ({} bytes)", file_name, upload.bytes.len());

    let (bytes, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = extract_text(&upload.bytes);
        (upload.bytes, outcome)
    })
    .await
    .map_err(|e| StudyError::Internal(format!("Extraction task panicked: {e}")))?;

    let doc = match outcome {
        Ok(text) if text.trim().is_empty() => {
            warn!("'{}' has no extractable text layer", file_name);
            Document::new(file_name, bytes, String::new(), ExtractionStatus::Empty)
        }
        Ok(text) => {
            info!("Extracted {} chars from '{}'", text.chars().count(), file_name);
            Document::new(file_name, bytes, text, ExtractionStatus::Success)
        }
        Err(e) => {
            warn!("Extraction failed for '{}': {}", file_name, e);
            let reason = match e {
                StudyError::ExtractionFailed { detail } => detail,
                other => other.to_string(),
            };
            Document::new(
                file_name,
                bytes,
                String::new(),
                ExtractionStatus::Failed(reason),
            )
        }
    };
    Ok(doc)
}
