//! Generation client: send one prompt, get the first candidate's text back.
//!
//! The pipeline talks to the model through the [`TextGenerator`] trait so
//! callers (and tests) can inject their own implementation through
//! [`crate::config::StudyConfigBuilder::generator`]. The default
//! implementation, [`GeminiClient`], speaks the Gemini `generateContent`
//! REST API over `reqwest`.
//!
//! ## One attempt, bounded
//!
//! Each call makes exactly one HTTP request with a per-request timeout
//! covering connect, send and body download. There is no retry loop here; a
//! failed call is reported and the user decides whether to try again.
//!
//! ## Credential hygiene
//!
//! The API key travels as the `key` query parameter. `reqwest` includes the
//! request URL in its error messages, so every transport error is stripped of
//! its URL with [`reqwest::Error::without_url`] before it is formatted.

use crate::config::StudyConfig;
use crate::error::{excerpt, StudyError};
use crate::prompts::Prompt;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Anything that can turn a prompt into raw model text.
///
/// Implementations hold no per-call mutable state and must be safe to call
/// concurrently from independent sessions.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Send `prompt` once and return the raw text of the first candidate.
    async fn generate(&self, prompt: &Prompt, timeout: Duration) -> Result<String, StudyError>;
}

/// [`TextGenerator`] backed by the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GeminiClient {
    /// Create a client. A missing key is accepted here and reported as
    /// [`StudyError::AuthError`] on the first call.
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, StudyError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| StudyError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            model: model.into(),
            api_base: api_base.into(),
        })
    }

    pub fn from_config(config: &StudyConfig) -> Result<Self, StudyError> {
        Self::new(
            config.api_key.clone(),
            config.model.clone(),
            config.api_base.clone(),
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }

    fn credential(&self) -> Result<&str, StudyError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| StudyError::AuthError {
                detail: "API key not found".into(),
            })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &Prompt, timeout: Duration) -> Result<String, StudyError> {
        let api_key = self.credential()?;
        let body = GenerateContentRequest::from_prompt(prompt);

        info!(
            "Calling {} for {} output ({} prompt chars)",
            self.model,
            prompt.shape,
            prompt.text.chars().count()
        );
        let start = Instant::now();

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(e, timeout))?;
        debug!(
            "{} answered {} ({} bytes) in {:?}",
            self.model,
            status,
            text.len(),
            start.elapsed()
        );

        if !status.is_success() {
            let err = status_error(status, &text);
            warn!("Generation request failed: {}", err);
            return Err(err);
        }

        let envelope: GenerateContentResponse = serde_json::from_str(&text).map_err(|e| {
            StudyError::malformed(format!("unexpected generateContent body: {e}"), &text)
        })?;
        envelope.first_candidate_text(status)
    }
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_prompt(prompt: &'a Prompt) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: &prompt.text }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: prompt.shape.mime_type(),
                response_schema: prompt.schema.as_ref(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate.
    fn first_candidate_text(self, status: StatusCode) -> Result<String, StudyError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        let Some(candidate) = self.candidates.into_iter().next() else {
            let detail = match block_reason {
                Some(reason) => format!("no candidates returned (prompt blocked: {reason})"),
                None => "no candidates returned".to_string(),
            };
            return Err(StudyError::RemoteError {
                status: status.as_u16(),
                detail,
            });
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(StudyError::RemoteError {
                status: status.as_u16(),
                detail: format!(
                    "first candidate has no text (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ),
            });
        }
        Ok(text)
    }
}

// ── Error mapping ───────────────────────────────────────────────────────────

fn transport_error(e: reqwest::Error, timeout: Duration) -> StudyError {
    let e = e.without_url();
    if e.is_timeout() {
        return StudyError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        };
    }

    let mut detail = e.to_string();
    let mut source = std::error::Error::source(&e);
    while let Some(inner) = source {
        detail.push_str(": ");
        detail.push_str(&inner.to_string());
        source = inner.source();
    }
    StudyError::NetworkError { detail }
}

fn status_error(status: StatusCode, body: &str) -> StudyError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let detail = match &parsed {
        Some(env) if !env.error.message.is_empty() => match &env.error.status {
            Some(s) => format!("{} ({})", env.error.message, s),
            None => env.error.message.clone(),
        },
        _ => excerpt(body.trim(), 300),
    };

    let invalid_key = status == StatusCode::BAD_REQUEST
        && (body.contains("API_KEY_INVALID") || body.contains("API key not valid"));

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN || invalid_key {
        StudyError::AuthError { detail }
    } else {
        StudyError::RemoteError {
            status: status.as_u16(),
            detail,
        }
    }
}
