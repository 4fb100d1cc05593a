//! Generated artifacts and their Markdown rendering.

use crate::task::{OutputShape, TaskKind};
use serde::{Deserialize, Serialize};

/// One flashcard. Both fields are required when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

/// Summary plus key highlights. Both fields are required when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
    pub highlights: Vec<String>,
}

/// A decoded response, one variant per [`OutputShape`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "value", rename_all = "snake_case")]
pub enum Artifact {
    Text(String),
    Questions(Vec<String>),
    Flashcards(Vec<Flashcard>),
    Summary(Summary),
}

impl Artifact {
    pub fn shape(&self) -> OutputShape {
        match self {
            Artifact::Text(_) => OutputShape::FreeText,
            Artifact::Questions(_) => OutputShape::StringList,
            Artifact::Flashcards(_) => OutputShape::QaPairList,
            Artifact::Summary(_) => OutputShape::SummaryWithHighlights,
        }
    }

    /// Render for display. Quiz questions and flashcards are numbered.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        match self {
            Artifact::Text(text) => out.push_str(text.trim_end()),
            Artifact::Questions(questions) => {
                out.push_str("## Your Test Questions\n\n");
                for (i, q) in questions.iter().enumerate() {
                    out.push_str(&format!("{}. {}\n", i + 1, q));
                }
            }
            Artifact::Flashcards(cards) => {
                out.push_str("## Your Flashcards\n\n");
                for (i, card) in cards.iter().enumerate() {
                    out.push_str(&format!(
                        "{}. **{}**\n   *Answer:* {}\n",
                        i + 1,
                        card.question,
                        card.answer
                    ));
                }
            }
            Artifact::Summary(s) => {
                out.push_str("## Document Summary\n\n");
                out.push_str(s.summary.trim());
                out.push('\n');
                if !s.highlights.is_empty() {
                    out.push_str("\n## Key Highlights & Extracted Information\n\n");
                    for h in &s.highlights {
                        out.push_str(&format!("- {h}\n"));
                    }
                }
            }
        }
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

/// A successfully parsed generation, as stored in the session.
///
/// Only built from a parse that succeeded; a malformed payload never becomes
/// a `GenerationResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub kind: TaskKind,
    /// Text exactly as returned by the service.
    pub raw: String,
    pub artifact: Artifact,
}

impl GenerationResult {
    pub fn new(kind: TaskKind, raw: String, artifact: Artifact) -> Self {
        Self {
            kind,
            raw,
            artifact,
        }
    }
}
