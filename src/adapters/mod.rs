//! Adapter interfaces for the structured generation backend.
//!
//! Every stage reaches the model through the narrow [`Generator`] seam:
//! a prompt and a JSON schema go in, schema-shaped JSON or a typed
//! [`GenerationError`] comes out.

pub mod openai;
pub mod scripted;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use openai::OpenAiGenerator;
pub use scripted::ScriptedGenerator;

/// A two-part chat prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Role instruction
    pub system: String,

    /// Task content, including the feedback text
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Named JSON schema the generated output must satisfy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema name (e.g. "feedback_route"), also used to key scripted replies
    pub name: String,

    /// JSON Schema document
    pub definition: Value,
}

impl Schema {
    pub fn new(name: impl Into<String>, definition: Value) -> Self {
        Self {
            name: name.into(),
            definition,
        }
    }
}

/// Coarse classification of generation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    Timeout,
    Malformed,
    Refused,
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Malformed => "malformed",
            Self::Refused => "refused",
        };
        f.write_str(name)
    }
}

/// Failure of a single generation call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("Generation timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Generated output is malformed: {0}")]
    Malformed(String),

    #[error("Generation refused: {0}")]
    Refused(String),
}

impl GenerationError {
    pub fn kind(&self) -> GenerationErrorKind {
        match self {
            Self::Timeout { .. } => GenerationErrorKind::Timeout,
            Self::Malformed(_) => GenerationErrorKind::Malformed,
            Self::Refused(_) => GenerationErrorKind::Refused,
        }
    }

    pub fn malformed(detail: impl fmt::Display) -> Self {
        Self::Malformed(detail.to_string())
    }
}

/// Trait for structured generation backends
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Model identifier reported on the health surface
    fn model(&self) -> &str;

    /// Generate JSON conforming to `schema`
    async fn generate(&self, prompt: &Prompt, schema: &Schema) -> Result<Value, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let timeout = GenerationError::Timeout {
            after: Duration::from_secs(30),
        };
        assert_eq!(timeout.kind(), GenerationErrorKind::Timeout);
        assert_eq!(
            GenerationError::malformed("missing field").kind(),
            GenerationErrorKind::Malformed
        );
        assert_eq!(
            GenerationError::Refused("policy".to_string()).kind(),
            GenerationErrorKind::Refused
        );
    }

    #[test]
    fn test_error_messages() {
        let err = GenerationError::malformed("expected object");
        assert_eq!(err.to_string(), "Generated output is malformed: expected object");
    }
}
