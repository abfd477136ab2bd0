//! Outputs of the routing, classification and extraction stages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Router verdict on whether feedback is actionable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingResult {
    /// True if the feedback describes a fault reportable to an internal team
    pub is_operational: bool,

    /// Self-reported calibration score in [0, 1]
    pub confidence: f64,

    /// Cleaned version of the feedback text
    pub description: String,
}

/// Overall or per-component sentiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Mixed,
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 4] = [
        Sentiment::Positive,
        Sentiment::Negative,
        Sentiment::Mixed,
        Sentiment::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Mixed => "mixed",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category and sentiment of operational feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// One of the rule book's categories (e.g. "Wi-Fi")
    pub category: String,

    pub sentiment: Sentiment,

    /// Classifier confidence in [0, 1]
    pub confidence: f64,

    /// Original feedback text
    pub raw_text: String,

    /// Original feedback source
    pub source: String,
}

/// A component mentioned in the feedback with its own sentiment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSentiment {
    pub component: String,
    pub sentiment: Sentiment,
}

/// Fine-grained breakdown of operational feedback
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailExtraction {
    /// The specific affected system (e.g. "Arena Wi-Fi")
    pub affected_system: String,

    pub components: Vec<ComponentSentiment>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub improvement_suggestions: Vec<String>,
    pub tags: Vec<String>,

    /// Verbatim excerpts of the feedback text
    pub key_quotes: Vec<String>,
}
