//! Classifier: category and overall sentiment of operational feedback.

use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::{invoke, non_blank, sentiment_enum, unit_interval, StageFailure};
use crate::adapters::{GenerationError, Generator, Prompt, Schema};
use crate::core::rules::RuleBook;
use crate::domain::{ClassificationResult, FeedbackItem, Sentiment, Stage};

pub const SCHEMA_NAME: &str = "feedback_classification";

#[derive(Debug, Deserialize)]
struct ClassificationWire {
    feedback_category: String,
    overall_sentiment: Sentiment,
    confidence_score: f64,
}

pub fn prompt(item: &FeedbackItem, rules: &RuleBook) -> Prompt {
    Prompt::new(
        "Classify operational feedback for IT, product, arena operations, or other areas.",
        format!(
            "Analyze the operational feedback: '{}' from source '{}'.\n\
             Return a JSON object with:\n\
             - raw_text: the original text.\n\
             - feedback_category: exactly one of [{}]. Choose the root cause, e.g. Wi-Fi for \
             connectivity problems that also break an app.\n\
             - overall_sentiment: positive, negative, mixed or neutral.\n\
             - confidence_score: your confidence in the classification, from 0.0 to 1.0.\n\
             - feedback_source: the source of the feedback.",
            item.text(),
            item.source(),
            rules.category_names().join(", ")
        ),
    )
}

pub fn schema(rules: &RuleBook) -> Schema {
    Schema::new(
        SCHEMA_NAME,
        json!({
            "type": "object",
            "properties": {
                "raw_text": { "type": "string" },
                "feedback_category": { "type": "string", "enum": rules.category_names() },
                "overall_sentiment": { "type": "string", "enum": sentiment_enum() },
                "confidence_score": { "type": "number" },
                "feedback_source": { "type": "string" },
            },
            "required": [
                "raw_text",
                "feedback_category",
                "overall_sentiment",
                "confidence_score",
                "feedback_source",
            ],
            "additionalProperties": false,
        }),
    )
}

fn validate(
    wire: ClassificationWire,
    item: &FeedbackItem,
    rules: &RuleBook,
) -> Result<ClassificationResult, GenerationError> {
    let category = non_blank("feedback_category", &wire.feedback_category)?;
    let confidence = unit_interval("confidence_score", wire.confidence_score)?;

    if !rules.is_known_category(&category) {
        warn!(
            %category,
            fallback_team = %rules.fallback_team,
            "Classifier returned a category outside the rule book"
        );
    }

    // The echoed text and source are replaced with the item's own values
    Ok(ClassificationResult {
        category,
        sentiment: wire.overall_sentiment,
        confidence,
        raw_text: item.text().to_string(),
        source: item.source().to_string(),
    })
}

/// Classify operational feedback into a rule-book category
pub async fn classify(
    generator: &dyn Generator,
    rules: &RuleBook,
    item: &FeedbackItem,
) -> Result<ClassificationResult, StageFailure> {
    let wire: ClassificationWire = invoke(
        generator,
        Stage::Classification,
        &prompt(item, rules),
        &schema(rules),
    )
    .await?;

    validate(wire, item, rules).map_err(|e| StageFailure::new(Stage::Classification, e))
}
