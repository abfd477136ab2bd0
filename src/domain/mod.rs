//! Domain types for the opsdesk pipeline.
//!
//! This module contains the core data structures:
//! - Feedback: Validated input items and the request shape they arrive in
//! - Stages: Routing, classification and extraction outputs
//! - Ticket: Synthesized incident records
//! - Result: Analysis and top-level pipeline outcomes

pub mod feedback;
pub mod result;
pub mod service;
pub mod stages;
pub mod ticket;

// Re-export commonly used types
pub use feedback::{
    FeedbackItem, FeedbackRequest, ValidationError, DEFAULT_API_SOURCE, DEFAULT_BATCH_SOURCE,
};
pub use result::{
    AnalysisResult, BatchEntry, PipelineResult, Stage, LOW_CONFIDENCE_MESSAGE,
    NON_OPERATIONAL_MESSAGE,
};
pub use service::ServiceDescriptor;
pub use stages::{
    ClassificationResult, ComponentSentiment, DetailExtraction, RoutingResult, Sentiment,
};
pub use ticket::{Priority, Ticket, INITIAL_STATUS};
