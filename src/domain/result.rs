//! Pipeline outcomes.
//!
//! `PipelineResult` is the single record returned per feedback item. Detail
//! fields are `Some` only for operational feedback that completed all four
//! stages; they serialize as `null` (never omitted) otherwise.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::stages::{ClassificationResult, DetailExtraction, RoutingResult};
use super::ticket::{Priority, Ticket};

/// Message for results stopped by the confidence gate
pub const LOW_CONFIDENCE_MESSAGE: &str = "Feedback classification confidence too low";

/// Message for feedback routed as non-operational
pub const NON_OPERATIONAL_MESSAGE: &str =
    "Feedback is non-operational and does not require further action";

/// The four generation-backed stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Routing,
    Classification,
    Extraction,
    Analysis,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Routing,
        Stage::Classification,
        Stage::Extraction,
        Stage::Analysis,
    ];

    /// Terminal message reported when this stage fails
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Routing => "Feedback routing failed",
            Self::Classification => "Feedback classification failed",
            Self::Extraction => "Feedback details extraction failed",
            Self::Analysis => "Feedback analysis generation failed",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Routing => "routing",
            Self::Classification => "classification",
            Self::Extraction => "extraction",
            Self::Analysis => "analysis",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the analyzer: generated insight plus rule-engine decisions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 0.0 = critical, 1.0 = positive
    pub sentiment_score: f64,
    pub summary: String,
    pub priority_level: Priority,
    pub recommended_actions: Vec<String>,
    pub similar_incidents_pattern: bool,
    pub team: String,
    pub ticket: Option<Ticket>,
}

/// Top-level outcome for one feedback item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub success: bool,
    pub message: String,
    pub is_operational: Option<bool>,
    pub routing_confidence: Option<f64>,
    pub classification: Option<ClassificationResult>,
    pub details: Option<DetailExtraction>,
    pub sentiment_score: Option<f64>,
    pub summary: Option<String>,
    pub priority_level: Option<Priority>,
    pub recommended_actions: Option<Vec<String>>,
    pub similar_incidents_pattern: Option<bool>,
    pub team: Option<String>,
    pub ticket: Option<Ticket>,
}

impl PipelineResult {
    fn bare(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
            is_operational: None,
            routing_confidence: None,
            classification: None,
            details: None,
            sentiment_score: None,
            summary: None,
            priority_level: None,
            recommended_actions: None,
            similar_incidents_pattern: None,
            team: None,
            ticket: None,
        }
    }

    /// A failed result carrying only its explanation
    pub fn failed(message: impl Into<String>) -> Self {
        Self::bare(false, message)
    }

    /// Result for a stage that could not produce its output
    pub fn stage_failed(stage: Stage) -> Self {
        Self::failed(stage.failure_message())
    }

    /// Result for a routing decision below the confidence threshold
    pub fn low_confidence() -> Self {
        Self::failed(LOW_CONFIDENCE_MESSAGE)
    }

    /// Result for confidently non-operational feedback
    pub fn non_operational() -> Self {
        Self::bare(true, NON_OPERATIONAL_MESSAGE)
    }

    /// Fully analyzed operational feedback
    pub fn operational(
        routing: &RoutingResult,
        classification: ClassificationResult,
        details: DetailExtraction,
        analysis: AnalysisResult,
    ) -> Self {
        Self {
            success: true,
            message: format!(
                "Processed operational feedback for {}",
                classification.category
            ),
            is_operational: Some(routing.is_operational),
            routing_confidence: Some(routing.confidence),
            classification: Some(classification),
            details: Some(details),
            sentiment_score: Some(analysis.sentiment_score),
            summary: Some(analysis.summary),
            priority_level: Some(analysis.priority_level),
            recommended_actions: Some(analysis.recommended_actions),
            similar_incidents_pattern: Some(analysis.similar_incidents_pattern),
            team: Some(analysis.team),
            ticket: analysis.ticket,
        }
    }

    /// True if any stage-derived field is populated
    pub fn has_details(&self) -> bool {
        self.is_operational.is_some()
            || self.routing_confidence.is_some()
            || self.classification.is_some()
            || self.details.is_some()
            || self.sentiment_score.is_some()
            || self.summary.is_some()
            || self.priority_level.is_some()
            || self.recommended_actions.is_some()
            || self.similar_incidents_pattern.is_some()
            || self.team.is_some()
            || self.ticket.is_some()
    }
}

/// One line of batch output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Identifier the item was processed under (absent if it failed validation
    /// without declaring one)
    pub feedback_id: Option<String>,
    pub title: Option<String>,
    pub result: PipelineResult,
}
