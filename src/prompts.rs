//! Prompt templates and the prompt builder.
//!
//! Every prompt lives here so a wording change touches exactly one place and
//! unit tests can inspect prompts without a live model.
//!
//! [`build_prompt`] is a pure function of its inputs: same text and task in,
//! byte-identical prompt out. Structured tasks always spell the output format
//! out in the prompt *and* attach a `responseSchema`; the service does not
//! reliably infer the format from context alone.

use crate::task::{OutputShape, Task};
use serde::Serialize;
use serde_json::{json, Value};

/// Assistant persona used for chat.
pub const CHAT_PERSONA: &str = "You are StudyMate, an AI assistant. Your goal is to provide helpful, \
detailed, and conversational answers to user questions. Respond based on your general knowledge \
without referencing any document content.";

/// First message of every chat transcript.
pub const CHAT_GREETING: &str =
    "Hi! I'm StudyMate, your AI learning assistant. What would you like to learn about today?";

/// A fully rendered prompt plus the contract for its answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    /// Natural-language prompt sent as the single user turn.
    pub text: String,
    /// Shape the response parser will enforce.
    pub shape: OutputShape,
    /// Optional `responseSchema` descriptor (Gemini schema dialect).
    pub schema: Option<Value>,
}

/// Build the prompt for `task` over `input`.
///
/// For document tasks `input` is the extracted document text; for chat it is
/// the user's question.
pub fn build_prompt(input: &str, task: &Task) -> Prompt {
    let text = match task {
        Task::Chat => chat_prompt(input),
        Task::Quiz {
            difficulty,
            questions,
        } => format!(
            "You are an AI quiz generator. Based on the following document content, \
create a list of {questions} questions that are appropriate for a '{difficulty}' difficulty level. \
The output must be a valid JSON array of strings, where each string is a question.\n\n\
Document Content:\n{input}"
        ),
        Task::Flashcards {
            min_cards,
            max_cards,
        } => format!(
            "You are an AI flashcard generator. Given the following document content, \
create a list of {} flashcards. Each flashcard should be an object with a 'question' and an \
'answer' property. The questions should be direct and the answers should be concise. \
The output must be a valid JSON array.\n\n\
Document Content:\n{input}",
            count_phrase(*min_cards, *max_cards)
        ),
        Task::Summary {
            min_highlights,
            max_highlights,
        } => format!(
            "You are an AI assistant that summarizes documents and extracts key highlights. \
Given the following document content, provide a concise summary and a list of {} key highlights. \
The output must be a valid JSON object with two properties: 'summary' (a string) and \
'highlights' (an array of strings). Format each highlight clearly.\n\n\
Document Content:\n{input}",
            count_phrase(*min_highlights, *max_highlights)
        ),
    };

    let shape = task.shape();
    Prompt {
        text,
        shape,
        schema: response_schema(shape),
    }
}

fn chat_prompt(question: &str) -> String {
    format!("{CHAT_PERSONA}\n\nUser Question:\n{question}")
}

/// "5" when the bounds agree, "5-10" otherwise.
fn count_phrase(min: usize, max: usize) -> String {
    if min == max {
        min.to_string()
    } else {
        format!("{min}-{max}")
    }
}

/// `responseSchema` for a shape, or `None` for free text.
pub fn response_schema(shape: OutputShape) -> Option<Value> {
    match shape {
        OutputShape::FreeText => None,
        OutputShape::StringList => Some(json!({
            "type": "ARRAY",
            "items": { "type": "STRING" }
        })),
        OutputShape::QaPairList => Some(json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "question": { "type": "STRING" },
                    "answer": { "type": "STRING" }
                },
                "required": ["question", "answer"],
                "propertyOrdering": ["question", "answer"]
            }
        })),
        OutputShape::SummaryWithHighlights => Some(json!({
            "type": "OBJECT",
            "properties": {
                "summary": { "type": "STRING" },
                "highlights": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" }
                }
            },
            "required": ["summary", "highlights"],
            "propertyOrdering": ["summary", "highlights"]
        })),
    }
}
