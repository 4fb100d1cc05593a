//! # studymate
//!
//! An AI study assistant: upload a PDF, then generate test questions,
//! flashcards or a summary from its text, chat about anything, and get
//! search links for a topic.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Upload
//!  │
//!  ├─ 1. Input    accept application/pdf or *.pdf
//!  ├─ 2. Extract  text layer via pdf-extract (CPU-bound, spawn_blocking)
//!  ├─ 3. Prompt   deterministic template per task + response schema
//!  ├─ 4. Generate one bounded call to Gemini generateContent
//!  ├─ 5. Parse    strip fences, strict JSON decode into a typed artifact
//!  └─ 6. Store    latest artifact per kind in the caller's SessionStore
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use studymate::{Difficulty, SessionStore, StudyConfig, StudyMate, Upload};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY and the STUDYMATE_* overrides.
//!     let mate = StudyMate::new(StudyConfig::from_env()?)?;
//!     let mut session = SessionStore::new();
//!
//!     mate.upload(&mut session, Upload::from_path("biology.pdf").await?).await?;
//!     let quiz = mate.generate_quiz(&mut session, Difficulty::Easy).await?;
//!     println!("{}", quiz.artifact.to_markdown());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `studymate` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! studymate = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod links;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;
pub mod study;
pub mod task;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{StudyConfig, StudyConfigBuilder};
pub use error::StudyError;
pub use links::{render_links_markdown, suggest_links, Link, LinkGroup};
pub use output::{Artifact, Flashcard, GenerationResult, Summary};
pub use pipeline::input::Upload;
pub use pipeline::llm::{GeminiClient, TextGenerator};
pub use progress::{NoopProgressCallback, ProgressCallback, StudyProgressCallback};
pub use prompts::{build_prompt, Prompt};
pub use session::{ChatMessage, Document, ExtractionStatus, Role, SessionStore};
pub use study::StudyMate;
pub use task::{Difficulty, GenerationRequest, OutputShape, Task, TaskKind};
