//! Post-processing: validate and decode raw model output.
//!
//! Even with `responseMimeType: application/json` the model occasionally
//! wraps its answer in a Markdown code fence or prefixes a byte-order mark.
//! This module removes exactly those artefacts and then decodes the payload
//! into the typed [`Artifact`] variant for the expected [`OutputShape`].
//!
//! ## Fence rule
//!
//! After trimming surrounding whitespace, a payload is unwrapped only if it
//! starts with three backticks, optionally followed by a language tag
//! (`[A-Za-z0-9_+.-]*`) and a line break, and ends with three backticks.
//! The closing fence may follow a line break or sit right after the payload
//! on the same line. Anything else is decoded as is.
//!
//! ## Failing closed
//!
//! A payload that does not decode, misses a required field, has a value of
//! the wrong type, or yields an empty list is rejected wholesale with
//! [`StudyError::MalformedResponse`]. Nothing is trimmed down to a
//! best-effort subset.

use crate::error::StudyError;
use crate::output::{Artifact, Flashcard, Summary};
use crate::task::OutputShape;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Decode `raw` according to `shape`.
///
/// `FreeText` is returned byte-for-byte; every other shape goes through
/// [`normalise_payload`], [`strip_code_fences`] and strict JSON decoding.
pub fn parse_response(raw: &str, shape: OutputShape) -> Result<Artifact, StudyError> {
    let artifact = match shape {
        OutputShape::FreeText => Artifact::Text(raw.to_string()),
        OutputShape::StringList => {
            let questions: Vec<String> = decode(raw, "a JSON array of strings")?;
            ensure_non_empty(&questions, raw)?;
            Artifact::Questions(questions)
        }
        OutputShape::QaPairList => {
            let cards: Vec<Flashcard> =
                decode(raw, "a JSON array of {question, answer} objects")?;
            ensure_non_empty(&cards, raw)?;
            Artifact::Flashcards(cards)
        }
        OutputShape::SummaryWithHighlights => {
            let summary: Summary = decode(raw, "a JSON object with 'summary' and 'highlights'")?;
            Artifact::Summary(summary)
        }
    };
    debug!("Decoded {} payload ({} bytes)", shape, raw.len());
    Ok(artifact)
}

fn decode<T: DeserializeOwned>(raw: &str, expected: &str) -> Result<T, StudyError> {
    let body = strip_code_fences(&normalise_payload(raw));
    serde_json::from_str(&body)
        .map_err(|e| StudyError::malformed(format!("expected {expected}: {e}"), raw))
}

fn ensure_non_empty<T>(items: &[T], raw: &str) -> Result<(), StudyError> {
    if items.is_empty() {
        return Err(StudyError::malformed("the response contained an empty list", raw));
    }
    Ok(())
}

// ── Rule 1: Normalise the payload edges ─────────────────────────────────────

/// Trim surrounding whitespace and a leading byte-order mark.
pub fn normalise_payload(input: &str) -> String {
    input.trim().trim_start_matches('\u{FEFF}').trim().to_string()
}

// ── Rule 2: Strip one surrounding code fence ────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A```[A-Za-z0-9_+.\-]*[ \t]*\r?\n(.*?)\s*```\z")
        .expect("fence pattern is valid")
});

/// Remove a single surrounding ```` ```lang ```` … ```` ``` ```` fence.
pub fn strip_code_fences(input: &str) -> String {
    let trimmed = input.trim();
    match RE_OUTER_FENCE.captures(trimmed) {
        Some(caps) => caps[1].trim().to_string(),
        None => trimmed.to_string(),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
