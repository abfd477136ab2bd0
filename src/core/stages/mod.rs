//! Stage contracts.
//!
//! Each stage wraps exactly one generation call: it builds a prompt, names
//! the JSON schema the reply must satisfy, parses the reply into a wire
//! struct and validates it into a domain type. Any failure along the way is
//! reported as a [`StageFailure`] tagged with the stage that produced it.

pub mod analyzer;
pub mod classifier;
pub mod extractor;
pub mod router;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::adapters::{GenerationError, Generator, Prompt, Schema};
use crate::domain::{Sentiment, Stage};

pub use analyzer::{analyze, GeneratedAnalysis};
pub use classifier::classify;
pub use extractor::extract_details;
pub use router::route;

/// A generation failure attributed to a stage
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{stage} stage failed: {source}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub source: GenerationError,
}

impl StageFailure {
    pub fn new(stage: Stage, source: GenerationError) -> Self {
        Self { stage, source }
    }

    /// Terminal message reported to the caller
    pub fn message(&self) -> &'static str {
        self.stage.failure_message()
    }
}

/// Run one generation call and deserialize its output into `W`
async fn invoke<W: DeserializeOwned>(
    generator: &dyn Generator,
    stage: Stage,
    prompt: &Prompt,
    schema: &Schema,
) -> Result<W, StageFailure> {
    debug!(%stage, schema = %schema.name, backend = generator.name(), "Invoking generator");

    let value = generator
        .generate(prompt, schema)
        .await
        .map_err(|e| StageFailure::new(stage, e))?;

    decode(value).map_err(|e| StageFailure::new(stage, e))
}

fn decode<W: DeserializeOwned>(value: Value) -> Result<W, GenerationError> {
    serde_json::from_value(value)
        .map_err(|e| GenerationError::malformed(format!("output does not match schema: {}", e)))
}

/// Reject scores that are not finite or fall outside [0, 1]
fn unit_interval(field: &str, value: f64) -> Result<f64, GenerationError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(GenerationError::malformed(format!(
            "{} must be within [0, 1], got {}",
            field, value
        )))
    }
}

/// Reject blank strings, returning the trimmed value
fn non_blank(field: &str, value: &str) -> Result<String, GenerationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(GenerationError::malformed(format!("{} must not be blank", field)))
    } else {
        Ok(trimmed.to_string())
    }
}

fn sentiment_enum() -> Value {
    json!(Sentiment::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>())
}

fn string_array() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}
