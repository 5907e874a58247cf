//! Text generation backends.
//!
//! The orchestrator only needs "prompt in, raw text out". [`TextGenerator`] is
//! that seam; [`LlamaServerClient`] implements it against a llama.cpp-style
//! completion server, and tests plug in stubs.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Model identifier used when `FITPLAN_LLM_MODEL` is unset.
pub const DEFAULT_MODEL_NAME: &str = "Meta-Llama-3.2-1B-Instruct-Q4_K_M.gguf";

/// Sampling controls passed with every generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    pub temperature: f64,
    pub stop: Vec<String>,
}

impl Default for SamplingParams {
    /// Low temperature and a bounded output favour a consistent JSON shape.
    fn default() -> Self {
        Self {
            max_tokens: 1400,
            temperature: 0.4,
            stop: vec!["</s>".to_string()],
        }
    }
}

/// Failure of a single generation call.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion server returned no text")]
    Empty,
}

/// A generative text model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Identifier recorded alongside each logged request.
    fn model_name(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<String, GenerationError>;
}

/// Client for a llama.cpp-compatible `/completion` endpoint.
#[derive(Clone)]
pub struct LlamaServerClient {
    client: reqwest::Client,
    base_url: String,
    model_name: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    temperature: f64,
    stop: &'a [String],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    content: String,
}

impl LlamaServerClient {
    /// Create a client for the server at `base_url` (e.g. "http://127.0.0.1:8080").
    pub fn new(base_url: &str, model_name: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_name: model_name.to_string(),
        })
    }

    /// Check that the server is up and has a model loaded.
    pub async fn probe(&self) -> anyhow::Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("health check returned {}", response.status());
        }
        Ok(())
    }
}

#[async_trait]
impl TextGenerator for LlamaServerClient {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/completion", self.base_url);
        let request = CompletionRequest {
            prompt,
            n_predict: params.max_tokens,
            temperature: params.temperature,
            stop: &params.stop,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, "Completion server error");
            return Err(GenerationError::Status { status, body });
        }

        let completion: CompletionResponse = response.json().await?;
        let text = completion.content.trim();
        if text.is_empty() {
            return Err(GenerationError::Empty);
        }

        debug!(chars = text.len(), "Completion received");
        Ok(text.to_string())
    }
}
