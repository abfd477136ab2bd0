//! Analyzer: generated insight plus deterministic ticket synthesis.
//!
//! The generator supplies the sentiment score, summary, recommended actions
//! and recurrence flag. Team, priority, due date and every ticket field are
//! derived from those by the rule book, never by the model.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::{invoke, non_blank, string_array, unit_interval, StageFailure};
use crate::adapters::{GenerationError, Generator, Prompt, Schema};
use crate::core::rules::RuleBook;
use crate::core::sequence::TicketSequencer;
use crate::domain::{
    AnalysisResult, ClassificationResult, DetailExtraction, FeedbackItem, Priority, Stage, Ticket,
    INITIAL_STATUS,
};

pub const SCHEMA_NAME: &str = "feedback_analysis";

const MAX_HEADLINE_CHARS: usize = 80;

/// The generative half of an analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAnalysis {
    pub sentiment_score: f64,
    pub summary: String,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
    #[serde(default)]
    pub similar_incidents_pattern: bool,
}

pub fn prompt(
    item: &FeedbackItem,
    classification: &ClassificationResult,
    details: &DetailExtraction,
) -> Prompt {
    let details_json = serde_json::to_string(details).unwrap_or_default();

    Prompt::new(
        "Generate actionable insights for operational feedback.",
        format!(
            "Feedback Text: {}\n\
             Classification: Category '{}', Sentiment '{}', Source '{}'.\n\
             Detailed Insights: {}\n\n\
             Evaluate urgency, impact on fan experience, operational disruption and source reliability. \
             Return a JSON object with:\n\
             - sentiment_score: 0.0 for critical, urgent feedback (system failures, major disruptions) \
             up to 1.0 for positive, non-urgent feedback. Below 0.3 is critical, 0.3 to 0.6 moderate, \
             0.6 and above minor.\n\
             - summary: a brief summary of the feedback.\n\
             - recommended_actions: actions that would address the feedback.\n\
             - similar_incidents_pattern: true if this looks like a recurring incident.",
            item.text(),
            classification.category,
            classification.sentiment,
            item.source(),
            details_json
        ),
    )
}

pub fn schema() -> Schema {
    Schema::new(
        SCHEMA_NAME,
        json!({
            "type": "object",
            "properties": {
                "sentiment_score": { "type": "number" },
                "summary": { "type": "string" },
                "recommended_actions": string_array(),
                "similar_incidents_pattern": { "type": "boolean" },
            },
            "required": [
                "sentiment_score",
                "summary",
                "recommended_actions",
                "similar_incidents_pattern",
            ],
            "additionalProperties": false,
        }),
    )
}

fn validate(wire: GeneratedAnalysis) -> Result<GeneratedAnalysis, GenerationError> {
    Ok(GeneratedAnalysis {
        sentiment_score: unit_interval("sentiment_score", wire.sentiment_score)?,
        summary: non_blank("summary", &wire.summary)?,
        recommended_actions: wire
            .recommended_actions
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect(),
        similar_incidents_pattern: wire.similar_incidents_pattern,
    })
}

/// End of the first sentence: a terminator followed by whitespace or the end
/// of the text, so decimals and version numbers stay intact
fn first_sentence(text: &str) -> &str {
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\n' {
            return &text[..i];
        }
        if matches!(c, '.' | '!' | '?') {
            match chars.peek() {
                None => return &text[..i],
                Some((_, next)) if next.is_whitespace() => return &text[..i],
                _ => {}
            }
        }
    }
    text
}

/// First sentence of a summary, capped at a readable length
fn headline(summary: &str) -> String {
    let trimmed = summary.trim();
    let first = first_sentence(trimmed).trim();
    let sentence = if first.is_empty() { trimmed } else { first };

    if sentence.chars().count() <= MAX_HEADLINE_CHARS {
        sentence.to_string()
    } else {
        let cut: String = sentence.chars().take(MAX_HEADLINE_CHARS - 3).collect();
        format!("{}...", cut.trim_end())
    }
}

fn bullet_section(out: &mut String, heading: &str, entries: &[String]) {
    if entries.is_empty() {
        return;
    }
    out.push_str(&format!("\n{}:\n", heading));
    for entry in entries {
        out.push_str(&format!("- {}\n", entry));
    }
}

fn ticket_description(summary: &str, details: &DetailExtraction, priority: Priority) -> String {
    let mut description = format!(
        "{}\n\nAffected system: {}\nPriority: {}\n",
        summary,
        details.affected_system,
        priority.label()
    );

    bullet_section(&mut description, "Reported issues", &details.cons);
    bullet_section(
        &mut description,
        "Suggested improvements",
        &details.improvement_suggestions,
    );

    let quotes: Vec<String> = details
        .key_quotes
        .iter()
        .map(|q| format!("\"{}\"", q))
        .collect();
    bullet_section(&mut description, "Key quotes", &quotes);

    description.trim_end().to_string()
}

/// Apply the rule book to a generated analysis and build the ticket
pub fn synthesize(
    rules: &RuleBook,
    sequencer: &TicketSequencer,
    item: &FeedbackItem,
    classification: &ClassificationResult,
    details: &DetailExtraction,
    generated: GeneratedAnalysis,
) -> AnalysisResult {
    let priority = rules.priority_for(generated.sentiment_score);
    let assignment = rules.assignment_for(&classification.category);
    if !assignment.matched {
        warn!(
            category = %classification.category,
            team = assignment.team,
            "No team owns this category, assigning to fallback team"
        );
    }
    let event_date = item.event_date();

    let ticket = Ticket {
        ticket_id: sequencer.next_id(&classification.category, event_date.year()),
        title: format!(
            "[{}] {}: {}",
            priority.label(),
            details.affected_system,
            headline(&generated.summary)
        ),
        description: ticket_description(&generated.summary, details, priority),
        status: INITIAL_STATUS.to_string(),
        assignee: assignment.assignee.to_string(),
        reporter: rules.reporter.clone(),
        priority,
        due_date: rules.due_date(event_date, priority),
        affected_system: details.affected_system.clone(),
    };

    AnalysisResult {
        sentiment_score: generated.sentiment_score,
        summary: generated.summary,
        priority_level: priority,
        recommended_actions: generated.recommended_actions,
        similar_incidents_pattern: generated.similar_incidents_pattern,
        team: assignment.team.to_string(),
        ticket: Some(ticket),
    }
}

/// Generate the analysis for fully classified and extracted feedback
pub async fn analyze(
    generator: &dyn Generator,
    rules: &RuleBook,
    sequencer: &TicketSequencer,
    item: &FeedbackItem,
    classification: &ClassificationResult,
    details: &DetailExtraction,
) -> Result<AnalysisResult, StageFailure> {
    let wire: GeneratedAnalysis = invoke(
        generator,
        Stage::Analysis,
        &prompt(item, classification, details),
        &schema(),
    )
    .await?;

    let generated = validate(wire).map_err(|e| StageFailure::new(Stage::Analysis, e))?;

    Ok(synthesize(
        rules,
        sequencer,
        item,
        classification,
        details,
        generated,
    ))
}
