//! Core orchestration logic.
//!
//! This module contains:
//! - Stages: One generation call per stage, with output validation
//! - Rules: Category, team, priority and due-date tables
//! - Sequence: Ticket identifier counters
//! - Limits: Input limits enforced before routing
//! - Orchestrator: Main pipeline engine
//! - Batch: File-driven processing of many items

pub mod batch;
pub mod limits;
pub mod orchestrator;
pub mod rules;
pub mod sequence;
pub mod stages;

// Re-export commonly used types
pub use batch::{load_batch, parse_batch, run_batch, BatchItem, BatchSummary};
pub use limits::FeedbackLimits;
pub use orchestrator::{
    gate, GateDecision, Orchestrator, PipelineRun, PipelineState, CONFIDENCE_THRESHOLD,
};
pub use rules::{Assignment, RuleBook, RuleBookError};
pub use sequence::{category_slug, TicketSequencer};
pub use stages::StageFailure;
