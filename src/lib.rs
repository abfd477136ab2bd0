//! opsdesk - Operational feedback triage pipeline
//!
//! Turns free-text feedback from fans, staff and social posts into
//! structured triage records: operational or not, category and sentiment,
//! affected system and components, and for operational issues a complete
//! incident ticket with team, assignee, priority and due date.
//!
//! # Architecture
//!
//! Each item flows through four generation stages behind a confidence gate:
//! - Router decides whether the feedback is operational
//! - Items routed with confidence below 0.7 stop with a low-confidence result
//! - Classifier, detail extractor and analyzer run for operational items
//! - Team, priority, due date and ticket fields come from a deterministic
//!   rule book, never from the model
//!
//! # Modules
//!
//! - `adapters`: Structured generation backends (OpenAI-compatible, scripted)
//! - `core`: Orchestration logic (Stages, Rules, Orchestrator, Batch)
//! - `domain`: Data structures (FeedbackItem, PipelineResult, Ticket)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Process one item
//! opsdesk process --text "Wi-Fi was spotty during the game" --source fan_survey
//!
//! # Process a batch file
//! opsdesk batch feedback.json --output results.json
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{GenerationError, Generator, OpenAiGenerator, ScriptedGenerator};
pub use core::{Orchestrator, RuleBook};
pub use domain::{FeedbackItem, FeedbackRequest, PipelineResult, Priority, Ticket};
