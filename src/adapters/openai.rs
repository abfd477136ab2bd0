//! Generation adapter for OpenAI-compatible chat completion endpoints.
//!
//! Requests use the strict `json_schema` response format, so the model's
//! message content is expected to be a JSON document matching the schema.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::timeout;
use tracing::debug;

use super::{GenerationError, Generator, Prompt, Schema};

/// Chat completion client with structured output
pub struct OpenAiGenerator {
    /// Base URL, without trailing slash (e.g. "https://api.openai.com/v1")
    api_base: String,
    api_key: Option<String>,
    model: String,
    /// Per-call timeout
    call_timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenAiGenerator {
    /// Create a generator for `model` at `api_base`
    pub fn new(
        api_base: &str,
        api_key: Option<String>,
        model: impl Into<String>,
        call_timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            call_timeout,
            client,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    fn request_body(&self, prompt: &Prompt, schema: &Schema) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "schema": schema.definition,
                    "strict": true,
                },
            },
        })
    }

    async fn send(&self, prompt: &Prompt, schema: &Schema) -> Result<Value, GenerationError> {
        let mut request = self
            .client
            .post(self.completions_url())
            .json(&self.request_body(prompt, schema));

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout {
                    after: self.call_timeout,
                }
            } else {
                GenerationError::Refused(format!("request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(refusal_for_status(status, response.json::<ErrorResponse>().await.ok()));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::malformed(format!("invalid completion body: {}", e)))?;

        parse_completion(completion)
    }
}

fn refusal_for_status(status: StatusCode, body: Option<ErrorResponse>) -> GenerationError {
    let detail = body
        .map(|b| b.error.message)
        .unwrap_or_else(|| status.to_string());
    GenerationError::Refused(format!("HTTP {}: {}", status.as_u16(), detail))
}

fn parse_completion(completion: CompletionResponse) -> Result<Value, GenerationError> {
    let message = completion
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| GenerationError::malformed("completion has no choices"))?;

    if let Some(refusal) = message.refusal.filter(|r| !r.trim().is_empty()) {
        return Err(GenerationError::Refused(refusal));
    }

    let content = message
        .content
        .ok_or_else(|| GenerationError::malformed("completion has no content"))?;

    serde_json::from_str(&content)
        .map_err(|e| GenerationError::malformed(format!("content is not JSON: {}", e)))
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &Prompt, schema: &Schema) -> Result<Value, GenerationError> {
        debug!(schema = %schema.name, model = %self.model, "Requesting structured completion");

        timeout(self.call_timeout, self.send(prompt, schema))
            .await
            .map_err(|_| GenerationError::Timeout {
                after: self.call_timeout,
            })?
    }
}
