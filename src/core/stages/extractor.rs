//! Detail extractor: affected system, components, pros/cons and quotes.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::{invoke, non_blank, sentiment_enum, string_array, StageFailure};
use crate::adapters::{GenerationError, Generator, Prompt, Schema};
use crate::domain::{ClassificationResult, ComponentSentiment, DetailExtraction, FeedbackItem, Stage};

pub const SCHEMA_NAME: &str = "feedback_details";

#[derive(Debug, Deserialize)]
struct DetailsWire {
    system_or_area: String,
    #[serde(default)]
    mentioned_components: Vec<ComponentSentiment>,
    #[serde(default)]
    pros: Vec<String>,
    #[serde(default)]
    cons: Vec<String>,
    #[serde(default)]
    improvement_suggestions: Vec<String>,
    #[serde(default)]
    categorize_feedback: Vec<String>,
    #[serde(default)]
    key_quotes: Vec<String>,
}

pub fn prompt(item: &FeedbackItem, classification: &ClassificationResult) -> Prompt {
    Prompt::new(
        "Extract detailed insights from operational feedback.",
        format!(
            "Given the feedback: '{}',\n\
             classified as {} feedback with {} sentiment,\n\
             extract the following details in JSON format:\n\
             - system_or_area: the specific system or area affected (e.g. Arena Wi-Fi, Ticketing App), \
             choosing the root cause.\n\
             - mentioned_components: each component mentioned, with its own sentiment.\n\
             - pros: positive aspects mentioned.\n\
             - cons: negative aspects mentioned. Do not repeat improvement suggestions here.\n\
             - improvement_suggestions: suggested improvements, inferred if not explicit \
             (e.g. 'test hardware' for a frozen display).\n\
             - categorize_feedback: short tags (e.g. system outage, app usability issue, hardware failure).\n\
             - key_quotes: important excerpts copied verbatim from the feedback.",
            item.text(),
            classification.category,
            classification.sentiment
        ),
    )
}

pub fn schema() -> Schema {
    Schema::new(
        SCHEMA_NAME,
        json!({
            "type": "object",
            "properties": {
                "system_or_area": { "type": "string" },
                "mentioned_components": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "component": { "type": "string" },
                            "sentiment": { "type": "string", "enum": sentiment_enum() },
                        },
                        "required": ["component", "sentiment"],
                        "additionalProperties": false,
                    },
                },
                "pros": string_array(),
                "cons": string_array(),
                "improvement_suggestions": string_array(),
                "categorize_feedback": string_array(),
                "key_quotes": string_array(),
            },
            "required": [
                "system_or_area",
                "mentioned_components",
                "pros",
                "cons",
                "improvement_suggestions",
                "categorize_feedback",
                "key_quotes",
            ],
            "additionalProperties": false,
        }),
    )
}

/// Lowercased, whitespace-collapsed form used to detect duplicates
fn normalize(entry: &str) -> String {
    entry
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(|c: char| c == '.' || c == '!')
        .to_lowercase()
}

/// Trim entries and drop blanks and repeats, keeping first occurrences
fn clean(entries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty() && seen.insert(normalize(e)))
        .collect()
}

fn without(entries: Vec<String>, excluded: &[String]) -> Vec<String> {
    let excluded: HashSet<String> = excluded.iter().map(|e| normalize(e)).collect();
    entries
        .into_iter()
        .filter(|e| !excluded.contains(&normalize(e)))
        .collect()
}

/// Keep only quotes that occur verbatim in the text
fn verbatim_quotes(quotes: Vec<String>, text: &str) -> Vec<String> {
    clean(quotes)
        .into_iter()
        .map(|q| {
            q.trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”'))
                .trim()
                .to_string()
        })
        .filter(|q| {
            let found = !q.is_empty() && text.contains(q.as_str());
            if !found {
                warn!(quote = %q, "Dropping key quote not found verbatim in feedback");
            }
            found
        })
        .collect()
}

fn validate(wire: DetailsWire, item: &FeedbackItem) -> Result<DetailExtraction, GenerationError> {
    let affected_system = non_blank("system_or_area", &wire.system_or_area)?;

    let components = wire
        .mentioned_components
        .into_iter()
        .filter_map(|c| {
            let component = c.component.trim().to_string();
            (!component.is_empty()).then_some(ComponentSentiment {
                component,
                sentiment: c.sentiment,
            })
        })
        .collect();

    let improvement_suggestions = clean(wire.improvement_suggestions);
    let cons = without(clean(wire.cons), &improvement_suggestions);
    let pros = without(clean(wire.pros), &cons);

    Ok(DetailExtraction {
        affected_system,
        components,
        pros,
        cons,
        improvement_suggestions,
        tags: clean(wire.categorize_feedback),
        key_quotes: verbatim_quotes(wire.key_quotes, item.text()),
    })
}

/// Break operational feedback down into its affected system and components
pub async fn extract_details(
    generator: &dyn Generator,
    item: &FeedbackItem,
    classification: &ClassificationResult,
) -> Result<DetailExtraction, StageFailure> {
    let wire: DetailsWire = invoke(
        generator,
        Stage::Extraction,
        &prompt(item, classification),
        &schema(),
    )
    .await?;

    validate(wire, item).map_err(|e| StageFailure::new(Stage::Extraction, e))
}
