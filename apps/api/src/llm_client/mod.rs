//! LLM Client: the single point of entry for generative-service calls.
//!
//! ARCHITECTURAL RULE: No other module may call the Generative Language API directly.
//! Everything goes through `GenerativeService`, so the analyzer can be driven by a fake in tests.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const MAX_OUTPUT_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 0.2;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Call cancelled")]
    Cancelled,
}

/// Anything that can turn a prompt into free text. Output format is never guaranteed.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    async fn complete(&self, prompt: &str, model_id: &str) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini client
// ────────────────────────────────────────────────────────────────────────────

/// Wraps the Generative Language `generateContent` endpoint. One attempt per call;
/// retries live in `call_with_retries` so they apply to any backend.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
        })
    }
}

/// Accepts both `gemini-2.0-flash` and `models/gemini-2.0-flash`.
fn model_path(model_id: &str) -> String {
    if model_id.starts_with("models/") {
        model_id.to_string()
    } else {
        format!("models/{model_id}")
    }
}

#[async_trait]
impl GenerativeService for GeminiClient {
    async fn complete(&self, prompt: &str, model_id: &str) -> Result<String, LlmError> {
        let url = format!("{GEMINI_API_BASE}/{}:generateContent", model_path(model_id));
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini call succeeded: model={model_id}, prompt_tokens={:?}, output_tokens={:?}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        parsed.text().ok_or(LlmError::EmptyContent)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Retry + cancellation
// ────────────────────────────────────────────────────────────────────────────

/// Bounded retry with linear backoff: attempt N waits `backoff_step × N` first.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_step: Duration::from_millis(600),
        }
    }
}

/// Receiving side of a request-scoped cancel signal. `None` never fires.
#[derive(Clone)]
pub struct Cancellation(Option<watch::Receiver<bool>>);

/// Sending side. Signals cancellation when dropped, so tying it to a request scope
/// stops the pipeline when the request goes away.
pub struct CancelHandle(watch::Sender<bool>);

pub fn cancellation() -> (CancelHandle, Cancellation) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), Cancellation(Some(rx)))
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Cancellation {
    pub fn never() -> Self {
        Cancellation(None)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation is signalled.
    pub async fn cancelled(&mut self) {
        let fired = match self.0.as_mut() {
            Some(rx) => rx.wait_for(|cancelled| *cancelled).await.is_ok(),
            None => false,
        };
        if !fired {
            // Sender gone without cancelling, or a `never` signal.
            std::future::pending::<()>().await;
        }
    }
}

/// Calls `service` with up to `policy.max_retries` retries on any failure.
/// Stops before the next attempt once cancelled and abandons an in-flight call.
pub async fn call_with_retries(
    service: &dyn GenerativeService,
    prompt: &str,
    model_id: &str,
    policy: RetryPolicy,
    cancellation: &Cancellation,
) -> Result<String, LlmError> {
    let mut cancel = cancellation.clone();
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..=policy.max_retries {
        if cancel.is_cancelled() {
            return Err(LlmError::Cancelled);
        }

        if attempt > 0 {
            let delay = policy.backoff_step * attempt;
            warn!(
                "Model {model_id} attempt {attempt} failed, retrying after {}ms...",
                delay.as_millis()
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(LlmError::Cancelled),
            }
        }

        let outcome = tokio::select! {
            result = service.complete(prompt, model_id) => result,
            _ = cancel.cancelled() => return Err(LlmError::Cancelled),
        };

        match outcome {
            Ok(text) => return Ok(text),
            Err(e) => {
                warn!("Model {model_id} call failed: {e}");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(LlmError::EmptyContent))
}
