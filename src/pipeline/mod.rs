//! Pipeline stages from uploaded PDF to typed artifact.
//!
//! Each submodule implements exactly one step and is tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ llm ──▶ postprocess
//! (upload)  (pdf text)  (HTTP)  (decode)
//! ```
//!
//! 1. [`input`]   — accept an upload typed or named as a PDF
//! 2. [`extract`] — pull the text layer; runs in `spawn_blocking` because
//!    parsing is CPU-bound
//! 3. [`llm`]     — one bounded generation call; the only stage with network
//!    I/O
//! 4. [`postprocess`] — strip code fences and decode into the expected shape
//!
//! Prompt construction sits between `extract` and `llm` in
//! [`crate::prompts`].

pub mod extract;
pub mod input;
pub mod llm;
pub mod postprocess;
