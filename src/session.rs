//! Per-session state: the current document, the latest artifact of each
//! kind, and the chat transcript.
//!
//! A `SessionStore` belongs to exactly one interactive session and is passed
//! by `&mut` to every page method of [`crate::study::StudyMate`]. It has no
//! interior mutability; two sessions never share one.
//!
//! The transcript and the stored results have separate lifetimes. A new
//! document drops every result, the latest chat answer included, because
//! results are keyed to "the current document". The transcript is a running
//! conversation and survives uploads; only [`SessionStore::reset_chat`] and
//! [`SessionStore::clear`] shorten it.

use crate::output::GenerationResult;
use crate::prompts::CHAT_GREETING;
use crate::task::TaskKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of text extraction for a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionStatus {
    /// Text was extracted.
    Success,
    /// The PDF parsed but has no text layer.
    Empty,
    /// The bytes could not be parsed; carries the reason.
    Failed(String),
}

/// An uploaded file and its extracted text. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    file_name: String,
    bytes: Vec<u8>,
    text: String,
    status: ExtractionStatus,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("file_name", &self.file_name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("text_chars", &self.text.chars().count())
            .field("status", &self.status)
            .finish()
    }
}

impl Document {
    pub fn new(
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        text: String,
        status: ExtractionStatus,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            text,
            status,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> &ExtractionStatus {
        &self.status
    }

    pub fn is_usable(&self) -> bool {
        self.status == ExtractionStatus::Success
    }
}

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn greeting() -> Self {
        Self::assistant(CHAT_GREETING)
    }
}

/// State of one interactive session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    document: Option<Document>,
    results: HashMap<TaskKind, GenerationResult>,
    messages: Vec<ChatMessage>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self {
            document: None,
            results: HashMap::new(),
            messages: vec![ChatMessage::greeting()],
        }
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the document and drop every stored result.
    ///
    /// Results were derived from the previous document and are stale. The
    /// chat transcript is left as it is.
    pub fn set_document(&mut self, doc: Document) {
        self.document = Some(doc);
        self.results.clear();
    }

    /// Store `result` as the latest for its kind, replacing any earlier one.
    pub fn set_result(&mut self, result: GenerationResult) {
        self.results.insert(result.kind, result);
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn result(&self, kind: TaskKind) -> Option<&GenerationResult> {
        self.results.get(&kind)
    }

    /// Reset to the initial state: no document, no results, greeting only.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // ── Chat transcript ──────────────────────────────────────────────────

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Drop the conversation and the stored chat answer.
    pub fn reset_chat(&mut self) {
        self.messages = vec![ChatMessage::greeting()];
        self.results.remove(&TaskKind::Chat);
    }
}
