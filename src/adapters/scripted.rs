//! In-memory generator that replays scripted replies.
//!
//! Replies are keyed by schema name and consumed in FIFO order; a standing
//! reply, if set, answers once the queue for that schema is empty. Every
//! call is recorded so callers can assert which stages ran.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::{GenerationError, Generator, Prompt, Schema};

type Reply = Result<Value, GenerationError>;

/// Scripted generation backend
#[derive(Default)]
pub struct ScriptedGenerator {
    model: String,
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    standing: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<ScriptedCall>>,
}

/// A recorded generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedCall {
    pub schema: String,
    pub prompt: Prompt,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            model: "scripted".to_string(),
            ..Default::default()
        }
    }

    /// Queue a successful reply for the next call with this schema
    pub fn reply(self, schema: &str, value: Value) -> Self {
        self.push(schema, Ok(value));
        self
    }

    /// Queue a failure for the next call with this schema
    pub fn fail(self, schema: &str, error: GenerationError) -> Self {
        self.push(schema, Err(error));
        self
    }

    /// Answer every call with this schema once its queue is drained
    pub fn always(self, schema: &str, value: Value) -> Self {
        self.standing.lock().insert(schema.to_string(), Ok(value));
        self
    }

    /// Queue a reply on a shared generator
    pub fn push(&self, schema: &str, reply: Reply) {
        self.queued
            .lock()
            .entry(schema.to_string())
            .or_default()
            .push_back(reply);
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<ScriptedCall> {
        self.calls.lock().clone()
    }

    /// Schema names of all calls made so far, in order
    pub fn call_schemas(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.schema.clone()).collect()
    }

    fn next_reply(&self, schema: &str) -> Reply {
        if let Some(reply) = self
            .queued
            .lock()
            .get_mut(schema)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }

        self.standing
            .lock()
            .get(schema)
            .cloned()
            .unwrap_or_else(|| {
                Err(GenerationError::Refused(format!(
                    "no scripted reply for schema '{}'",
                    schema
                )))
            })
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &Prompt, schema: &Schema) -> Result<Value, GenerationError> {
        self.calls.lock().push(ScriptedCall {
            schema: schema.name.clone(),
            prompt: prompt.clone(),
        });
        self.next_reply(&schema.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(name: &str) -> Schema {
        Schema::new(name, json!({}))
    }

    #[tokio::test]
    async fn test_replies_in_order_then_standing() {
        let generator = ScriptedGenerator::new()
            .reply("a", json!(1))
            .reply("a", json!(2))
            .always("a", json!(0));
        let prompt = Prompt::new("s", "u");

        assert_eq!(generator.generate(&prompt, &schema("a")).await.unwrap(), json!(1));
        assert_eq!(generator.generate(&prompt, &schema("a")).await.unwrap(), json!(2));
        assert_eq!(generator.generate(&prompt, &schema("a")).await.unwrap(), json!(0));
        assert_eq!(generator.call_schemas(), vec!["a", "a", "a"]);
    }

    #[tokio::test]
    async fn test_unscripted_schema_is_refused() {
        let generator = ScriptedGenerator::new();
        let result = generator
            .generate(&Prompt::new("s", "u"), &schema("missing"))
            .await;

        assert!(matches!(result, Err(GenerationError::Refused(_))));
    }
}
