//! Page controller: one method per user action.
//!
//! Each method runs its pipeline to completion against an explicitly passed
//! [`SessionStore`]:
//!
//! ```text
//! upload     ──▶ validate ──▶ extract ──▶ set_document
//! quiz/cards ──▶ document text ──▶ prompt ──▶ generate ──▶ parse ──▶ set_result
//! ask        ──▶ question ──▶ prompt ──▶ generate ──▶ transcript + set_result
//! links      ──▶ pure URL building
//! ```
//!
//! Errors are returned to the caller. A failed action leaves every piece of
//! session state it did not set out to change exactly as it was.

use crate::config::StudyConfig;
use crate::error::StudyError;
use crate::links::{self, LinkGroup};
use crate::output::GenerationResult;
use crate::pipeline::extract::extract_document;
use crate::pipeline::input::{validate_upload, Upload};
use crate::pipeline::llm::{GeminiClient, TextGenerator};
use crate::pipeline::postprocess::parse_response;
use crate::session::{ChatMessage, ExtractionStatus, SessionStore};
use crate::task::{Difficulty, GenerationRequest, Task};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The study assistant. Cheap to clone and safe to share across sessions.
#[derive(Clone)]
pub struct StudyMate {
    config: StudyConfig,
    generator: Arc<dyn TextGenerator>,
}

impl std::fmt::Debug for StudyMate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudyMate")
            .field("config", &self.config)
            .field("generator", &self.generator.name())
            .finish()
    }
}

impl StudyMate {
    /// Create the controller, resolving the generator from `config`.
    pub fn new(config: StudyConfig) -> Result<Self, StudyError> {
        let generator = resolve_generator(&config)?;
        debug!("Using generator '{}'", generator.name());
        Ok(Self { config, generator })
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Validate, extract and store an upload as the session's document.
    ///
    /// Returns the extraction status. An `Empty` document is stored and
    /// reported as `Ok(ExtractionStatus::Empty)`; document tasks will refuse
    /// it later. A document that fails to parse is stored too, then reported
    /// as [`StudyError::ExtractionFailed`].
    pub async fn upload(
        &self,
        session: &mut SessionStore,
        upload: Upload,
    ) -> Result<ExtractionStatus, StudyError> {
        validate_upload(&upload)?;

        let file_name = upload.file_name.clone();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_extraction_start(&file_name, upload.bytes.len());
        }

        let start = Instant::now();
        let doc = extract_document(upload).await?;
        debug!("Extraction of '{}' took {:?}", file_name, start.elapsed());

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_extraction_complete(&file_name, doc.text().chars().count());
        }

        let status = doc.status().clone();
        session.set_document(doc);
        info!("Stored '{}' as the current document", file_name);

        match status {
            ExtractionStatus::Failed(detail) => Err(StudyError::ExtractionFailed { detail }),
            other => Ok(other),
        }
    }

    /// Answer a free-form question from general knowledge.
    ///
    /// On success the question and answer are appended to the transcript and
    /// the answer is stored as the latest chat result.
    pub async fn ask(
        &self,
        session: &mut SessionStore,
        question: &str,
    ) -> Result<String, StudyError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(StudyError::InvalidInput(
                "Please type a question first.".into(),
            ));
        }

        let result = self
            .run(GenerationRequest::new(Task::Chat, question))
            .await?;
        let answer = result.raw.clone();

        session.push_message(ChatMessage::user(question));
        session.push_message(ChatMessage::assistant(answer.clone()));
        session.set_result(result);
        Ok(answer)
    }

    /// Generate open questions about the current document.
    pub async fn generate_quiz(
        &self,
        session: &mut SessionStore,
        difficulty: Difficulty,
    ) -> Result<GenerationResult, StudyError> {
        let task = Task::Quiz {
            difficulty,
            questions: self.config.quiz_questions,
        };
        self.run_on_document(session, task).await
    }

    /// Generate question/answer flashcards from the current document.
    pub async fn generate_flashcards(
        &self,
        session: &mut SessionStore,
    ) -> Result<GenerationResult, StudyError> {
        let task = Task::Flashcards {
            min_cards: self.config.min_flashcards,
            max_cards: self.config.max_flashcards,
        };
        self.run_on_document(session, task).await
    }

    /// Summarise the current document and extract its key highlights.
    pub async fn summarize(
        &self,
        session: &mut SessionStore,
    ) -> Result<GenerationResult, StudyError> {
        let task = Task::Summary {
            min_highlights: self.config.min_highlights,
            max_highlights: self.config.max_highlights,
        };
        self.run_on_document(session, task).await
    }

    /// Search and learning-resource links for `topic`.
    pub fn suggest_links(&self, topic: &str) -> Result<Vec<LinkGroup>, StudyError> {
        links::suggest_links(topic)
    }

    // ── Internals ────────────────────────────────────────────────────────

    async fn run_on_document(
        &self,
        session: &mut SessionStore,
        task: Task,
    ) -> Result<GenerationResult, StudyError> {
        let text = document_text(session)?;
        let result = self.run(GenerationRequest::new(task, text)).await?;
        session.set_result(result.clone());
        Ok(result)
    }

    /// Prompt, generate, parse. Notifies the progress callback either way.
    async fn run(&self, request: GenerationRequest) -> Result<GenerationResult, StudyError> {
        let kind = request.kind();
        info!("Generating {}", kind);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_generation_start(kind);
        }

        let start = Instant::now();
        let outcome = self.generate_and_parse(&request).await;

        match &outcome {
            Ok(result) => {
                info!("Generated {} in {:?}", kind, start.elapsed());
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_generation_complete(kind, result.raw.len());
                }
            }
            Err(e) => {
                warn!("Generating {} failed: {}", kind, e);
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_generation_error(kind, &e.to_string());
                }
            }
        }
        outcome
    }

    async fn generate_and_parse(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, StudyError> {
        let prompt = request.prompt();
        let raw = self
            .generator
            .generate(&prompt, self.config.api_timeout())
            .await?;
        let artifact = parse_response(&raw, prompt.shape)?;
        debug!("{} answered as {}", request.kind(), artifact.shape());
        Ok(GenerationResult::new(request.kind(), raw, artifact))
    }
}

/// The text a document task runs on, or the reason there is none.
fn document_text(session: &SessionStore) -> Result<String, StudyError> {
    let doc = session.document().ok_or(StudyError::MissingDocument)?;
    match doc.status() {
        ExtractionStatus::Success => Ok(doc.text().to_string()),
        ExtractionStatus::Empty => Err(StudyError::EmptyDocument),
        ExtractionStatus::Failed(detail) => Err(StudyError::ExtractionFailed {
            detail: detail.clone(),
        }),
    }
}

/// Use the configured generator if any, else a Gemini client.
fn resolve_generator(config: &StudyConfig) -> Result<Arc<dyn TextGenerator>, StudyError> {
    if let Some(ref generator) = config.generator {
        return Ok(Arc::clone(generator));
    }
    Ok(Arc::new(GeminiClient::from_config(config)?))
}
