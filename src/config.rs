//! Configuration for the study pipeline.
//!
//! All behaviour is controlled through [`StudyConfig`], built via
//! [`StudyConfigBuilder`] or loaded once at startup with
//! [`StudyConfig::from_env`]. The credential is never compiled in: it comes
//! from `GEMINI_API_KEY` (or an explicit builder call) and a missing key is
//! reported as [`StudyError::AuthError`] on the first generation call, not as
//! a configuration failure.

use crate::error::StudyError;
use crate::pipeline::llm::TextGenerator;
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

/// Default REST endpoint root.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Configuration for [`crate::study::StudyMate`].
///
/// # Example
/// ```rust
/// use studymate::StudyConfig;
///
/// let config = StudyConfig::builder()
///     .api_key("AIza-example")
///     .api_timeout_secs(30)
///     .quiz_questions(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.quiz_questions, 10);
/// ```
#[derive(Clone)]
pub struct StudyConfig {
    /// Gemini API key. `None` surfaces as an auth error when generating.
    pub api_key: Option<String>,

    /// Model identifier, e.g. "gemini-1.5-flash-latest".
    pub model: String,

    /// Endpoint root; overridden in tests to point at a mock server.
    pub api_base: String,

    /// Bound on each generation call, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Questions per quiz. Default: 5.
    pub quiz_questions: usize,

    /// Flashcard count range requested from the model. Default: 5–10.
    pub min_flashcards: usize,
    pub max_flashcards: usize,

    /// Highlight count range requested for summaries. Default: 4–5.
    pub min_highlights: usize,
    pub max_highlights: usize,

    /// Pre-constructed generator. Takes precedence over the Gemini settings.
    pub generator: Option<Arc<dyn TextGenerator>>,

    /// Receives pipeline events (extraction, generation start/end).
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_timeout_secs: 60,
            quiz_questions: 5,
            min_flashcards: 5,
            max_flashcards: 10,
            min_highlights: 4,
            max_highlights: 5,
            generator: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for StudyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudyConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("quiz_questions", &self.quiz_questions)
            .field("flashcards", &(self.min_flashcards..=self.max_flashcards))
            .field("highlights", &(self.min_highlights..=self.max_highlights))
            .field("generator", &self.generator.as_ref().map(|g| g.name().to_string()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ProgressCallback>"),
            )
            .finish()
    }
}

impl StudyConfig {
    /// Create a new builder for `StudyConfig`.
    pub fn builder() -> StudyConfigBuilder {
        StudyConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load settings from the environment.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `GEMINI_API_KEY` | `api_key` |
    /// | `STUDYMATE_MODEL` | `model` |
    /// | `STUDYMATE_API_BASE` | `api_base` |
    /// | `STUDYMATE_API_TIMEOUT` | `api_timeout_secs` |
    ///
    /// Empty variables are treated as unset.
    pub fn from_env() -> Result<Self, StudyError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StudyError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut builder = Self::builder();
        if let Some(key) = get("GEMINI_API_KEY") {
            builder = builder.api_key(key);
        }
        if let Some(model) = get("STUDYMATE_MODEL") {
            builder = builder.model(model);
        }
        if let Some(base) = get("STUDYMATE_API_BASE") {
            builder = builder.api_base(base);
        }
        if let Some(secs) = get("STUDYMATE_API_TIMEOUT") {
            let secs = secs.trim().parse::<u64>().map_err(|_| {
                StudyError::InvalidConfig(format!(
                    "STUDYMATE_API_TIMEOUT must be a whole number of seconds, got '{secs}'"
                ))
            })?;
            builder = builder.api_timeout_secs(secs);
        }
        builder.build()
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

/// Builder for [`StudyConfig`].
#[derive(Debug)]
pub struct StudyConfigBuilder {
    config: StudyConfig,
}

impl StudyConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn quiz_questions(mut self, n: usize) -> Self {
        self.config.quiz_questions = n;
        self
    }

    pub fn flashcards(mut self, min: usize, max: usize) -> Self {
        self.config.min_flashcards = min;
        self.config.max_flashcards = max;
        self
    }

    pub fn highlights(mut self, min: usize, max: usize) -> Self {
        self.config.min_highlights = min;
        self.config.max_highlights = max;
        self
    }

    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.config.generator = Some(generator);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<StudyConfig, StudyError> {
        let c = &self.config;
        if c.api_timeout_secs == 0 {
            return Err(StudyError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(StudyError::InvalidConfig("Model must not be empty".into()));
        }
        if !(c.api_base.starts_with("http://") || c.api_base.starts_with("https://")) {
            return Err(StudyError::InvalidConfig(format!(
                "API base must be an http(s) URL, got '{}'",
                c.api_base
            )));
        }
        if c.quiz_questions == 0 {
            return Err(StudyError::InvalidConfig(
                "A quiz needs at least one question".into(),
            ));
        }
        check_range("Flashcard", c.min_flashcards, c.max_flashcards)?;
        check_range("Highlight", c.min_highlights, c.max_highlights)?;
        Ok(self.config)
    }
}

fn check_range(what: &str, min: usize, max: usize) -> Result<(), StudyError> {
    if min == 0 || min > max {
        return Err(StudyError::InvalidConfig(format!(
            "{what} range must satisfy 1 ≤ min ≤ max, got {min}–{max}"
        )));
    }
    Ok(())
}
