//! Task vocabulary shared by every pipeline stage.
//!
//! A [`GenerationRequest`] pairs a [`Task`] (what to produce, with its
//! parameters) with the input text (document content, or the question for
//! chat). The [`OutputShape`] the parser expects is derived from the task
//! kind, so the prompt, the request's MIME type and the decoder can never
//! disagree about the format.

use crate::error::StudyError;
use crate::prompts::{build_prompt, Prompt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four artifact kinds a session can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Chat,
    Quiz,
    Flashcards,
    Summary,
}

impl TaskKind {
    pub const ALL: [TaskKind; 4] = [
        TaskKind::Chat,
        TaskKind::Quiz,
        TaskKind::Flashcards,
        TaskKind::Summary,
    ];

    /// The response shape the parser must enforce for this kind.
    pub fn shape(self) -> OutputShape {
        match self {
            TaskKind::Chat => OutputShape::FreeText,
            TaskKind::Quiz => OutputShape::StringList,
            TaskKind::Flashcards => OutputShape::QaPairList,
            TaskKind::Summary => OutputShape::SummaryWithHighlights,
        }
    }

    /// True when the task reads the uploaded document.
    pub fn needs_document(self) -> bool {
        !matches!(self, TaskKind::Chat)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskKind::Chat => "chat",
            TaskKind::Quiz => "quiz",
            TaskKind::Flashcards => "flashcards",
            TaskKind::Summary => "summary",
        };
        f.write_str(s)
    }
}

impl FromStr for TaskKind {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" => Ok(TaskKind::Chat),
            "quiz" => Ok(TaskKind::Quiz),
            "flashcards" | "flashcard" => Ok(TaskKind::Flashcards),
            "summary" => Ok(TaskKind::Summary),
            other => Err(StudyError::InvalidInput(format!(
                "unknown task '{other}' (expected chat, quiz, flashcards or summary)"
            ))),
        }
    }
}

/// Quiz difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        f.write_str(s)
    }
}

impl FromStr for Difficulty {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(StudyError::InvalidInput(format!(
                "unknown difficulty '{other}' (expected Easy, Medium or Hard)"
            ))),
        }
    }
}

/// What to generate, with the task's parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    /// Conversational answer; the request input is the user's question.
    Chat,
    /// `questions` open questions pitched at `difficulty`.
    Quiz {
        difficulty: Difficulty,
        questions: usize,
    },
    /// Between `min_cards` and `max_cards` question/answer pairs.
    Flashcards { min_cards: usize, max_cards: usize },
    /// A concise summary plus `min_highlights`–`max_highlights` key points.
    Summary {
        min_highlights: usize,
        max_highlights: usize,
    },
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        match self {
            Task::Chat => TaskKind::Chat,
            Task::Quiz { .. } => TaskKind::Quiz,
            Task::Flashcards { .. } => TaskKind::Flashcards,
            Task::Summary { .. } => TaskKind::Summary,
        }
    }

    pub fn shape(&self) -> OutputShape {
        self.kind().shape()
    }
}

/// One user action's worth of generation input. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub task: Task,
    pub input: String,
}

impl GenerationRequest {
    pub fn new(task: Task, input: impl Into<String>) -> Self {
        Self {
            task,
            input: input.into(),
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.task.kind()
    }

    /// Render the prompt for this request.
    pub fn prompt(&self) -> Prompt {
        build_prompt(&self.input, &self.task)
    }
}

/// The structure a response must decode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputShape {
    FreeText,
    StringList,
    QaPairList,
    SummaryWithHighlights,
}

impl OutputShape {
    /// `responseMimeType` requested from the service.
    pub fn mime_type(self) -> &'static str {
        if self.is_structured() {
            "application/json"
        } else {
            "text/plain"
        }
    }

    pub fn is_structured(self) -> bool {
        !matches!(self, OutputShape::FreeText)
    }
}

impl fmt::Display for OutputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputShape::FreeText => "free_text",
            OutputShape::StringList => "string_list",
            OutputShape::QaPairList => "qa_pair_list",
            OutputShape::SummaryWithHighlights => "summary_with_highlights",
        };
        f.write_str(s)
    }
}
