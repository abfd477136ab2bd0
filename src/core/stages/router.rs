//! Router: is this feedback operational?

use serde::Deserialize;
use serde_json::json;

use super::{invoke, unit_interval, StageFailure};
use crate::adapters::{GenerationError, Generator, Prompt, Schema};
use crate::domain::{FeedbackItem, RoutingResult, Stage};

pub const SCHEMA_NAME: &str = "feedback_route";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FeedbackType {
    Operational,
    NonOperational,
}

#[derive(Debug, Deserialize)]
struct RouteWire {
    feedback_type: FeedbackType,
    confidence_score: f64,
    #[serde(default)]
    description: String,
}

pub fn prompt(item: &FeedbackItem) -> Prompt {
    Prompt::new(
        "Classify feedback as operational or non-operational.",
        format!(
            "Analyze the following text: '{}' from source '{}'.\n\
             Decide whether it reports an operational condition that an internal team must act on \
             (IT systems, arena operations, mobile apps, Wi-Fi, ticketing, scoreboards, concessions, \
             app usability) or is non-operational commentary (general opinions, praise, unrelated chatter).\n\
             Return a JSON object with:\n\
             - feedback_type: 'operational' or 'non_operational'.\n\
             - confidence_score: your confidence in this decision, from 0.0 to 1.0.\n\
             - description: a cleaned version of the feedback text.",
            item.text(),
            item.source()
        ),
    )
}

pub fn schema() -> Schema {
    Schema::new(
        SCHEMA_NAME,
        json!({
            "type": "object",
            "properties": {
                "feedback_type": { "type": "string", "enum": ["operational", "non_operational"] },
                "confidence_score": { "type": "number" },
                "description": { "type": "string" },
            },
            "required": ["feedback_type", "confidence_score", "description"],
            "additionalProperties": false,
        }),
    )
}

fn validate(wire: RouteWire, item: &FeedbackItem) -> Result<RoutingResult, GenerationError> {
    let confidence = unit_interval("confidence_score", wire.confidence_score)?;
    let description = if wire.description.trim().is_empty() {
        item.text().to_string()
    } else {
        wire.description.trim().to_string()
    };

    Ok(RoutingResult {
        is_operational: matches!(wire.feedback_type, FeedbackType::Operational),
        confidence,
        description,
    })
}

/// Decide whether an item is operational
pub async fn route(
    generator: &dyn Generator,
    item: &FeedbackItem,
) -> Result<RoutingResult, StageFailure> {
    let wire: RouteWire = invoke(generator, Stage::Routing, &prompt(item), &schema()).await?;
    validate(wire, item).map_err(|e| StageFailure::new(Stage::Routing, e))
}
