//! Feedback items and the request shape they arrive in.
//!
//! A `FeedbackItem` is the validated, immutable unit of work handed to the
//! orchestrator. Collaborators (HTTP handler, batch loader) build one from a
//! `FeedbackRequest`, which carries the optional fields and their defaults.

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default source tag for feedback submitted over HTTP
pub const DEFAULT_API_SOURCE: &str = "api";

/// Default source tag for feedback read from a batch file
pub const DEFAULT_BATCH_SOURCE: &str = "batch";

/// Date format used on the wire (`YYYY-MM-DD`)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single piece of feedback, validated and immutable once created
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackItem {
    id: String,
    text: String,
    source: String,
    event_date: NaiveDate,
}

impl FeedbackItem {
    /// Create a validated feedback item
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        source: impl Into<String>,
        event_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        let text = text.into();
        let source = source.into();

        if id.trim().is_empty() {
            return Err(ValidationError::BlankId);
        }
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }

        Ok(Self {
            id,
            text,
            source,
            event_date,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn event_date(&self) -> NaiveDate {
        self.event_date
    }
}

/// Feedback as submitted by a collaborator, before defaults are applied
///
/// Matches both the HTTP request body and an entry of a batch file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackRequest {
    /// Caller-supplied identifier (generated if absent)
    #[serde(default, alias = "id")]
    pub feedback_id: Option<String>,

    /// Optional headline; carried through to batch output only
    #[serde(default)]
    pub title: Option<String>,

    /// The feedback text itself (required, non-empty)
    #[serde(default)]
    pub feedback_text: String,

    /// Origin tag (e.g. "fan_survey", "X_post")
    #[serde(default)]
    pub source: Option<String>,

    /// Date of the event the feedback refers to (`YYYY-MM-DD`)
    #[serde(default)]
    pub event_date: Option<String>,
}

impl FeedbackRequest {
    /// Build a request carrying only text
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            feedback_text: text.into(),
            ..Default::default()
        }
    }

    /// Identifier this request will be processed under, if the caller set one
    pub fn declared_id(&self) -> Option<&str> {
        self.feedback_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }

    /// Apply defaults and validate, using today's local date for a missing
    /// event date
    pub fn into_item(self, default_source: &str) -> Result<FeedbackItem, ValidationError> {
        self.into_item_on(default_source, Local::now().date_naive())
    }

    /// Apply defaults and validate against an explicit "today"
    pub fn into_item_on(
        self,
        default_source: &str,
        today: NaiveDate,
    ) -> Result<FeedbackItem, ValidationError> {
        let event_date = match self.event_date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_event_date(raw)?,
            _ => today,
        };

        let source = self
            .source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default_source.to_string());

        let id = self
            .feedback_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(generate_feedback_id);

        FeedbackItem::new(id, self.feedback_text, source, event_date)
    }
}

/// Parse a `YYYY-MM-DD` event date
pub fn parse_event_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| ValidationError::InvalidEventDate {
        value: raw.to_string(),
    })
}

/// Generate a timestamp-based feedback id: `fb-<UTC timestamp>-<8 hex>`
pub fn generate_feedback_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("fb-{}-{}", Utc::now().format("%Y%m%dT%H%M%S"), &suffix[..8])
}

/// Rejections raised before any stage runs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Feedback text must not be empty")]
    EmptyText,

    #[error("Feedback text is too large: {actual} bytes > {limit} bytes")]
    TextTooLarge { actual: usize, limit: usize },

    #[error("Invalid event date '{value}', expected YYYY-MM-DD")]
    InvalidEventDate { value: String },

    #[error("Feedback id must not be blank")]
    BlankId,
}
