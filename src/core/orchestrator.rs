//! Pipeline orchestrator.
//!
//! Runs one feedback item through routing, the confidence gate,
//! classification, detail extraction and analysis. Every path ends in a
//! `PipelineResult`; stage failures are recorded, never propagated.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::adapters::{Generator, OpenAiGenerator};
use crate::config::ResolvedConfig;
use crate::domain::{
    FeedbackItem, FeedbackRequest, PipelineResult, RoutingResult, ServiceDescriptor, Stage,
    ValidationError,
};

use super::limits::FeedbackLimits;
use super::rules::RuleBook;
use super::sequence::TicketSequencer;
use super::stages::{self, StageFailure};

/// Routing decisions below this confidence are treated as unreliable
pub const CONFIDENCE_THRESHOLD: f64 = 0.7;

/// What the pipeline does with a routing decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Confidence below threshold; stop regardless of the verdict
    LowConfidence,
    /// Confident and non-operational; stop successfully
    NonOperational,
    /// Confident and operational; continue to classification
    Operational,
}

/// Apply the confidence gate and operational branch to a routing decision
pub fn gate(routing: &RoutingResult) -> GateDecision {
    if routing.confidence < CONFIDENCE_THRESHOLD {
        GateDecision::LowConfidence
    } else if routing.is_operational {
        GateDecision::Operational
    } else {
        GateDecision::NonOperational
    }
}

/// Position of a run in the pipeline state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum PipelineState {
    Start,
    /// Item rejected before routing
    Rejected,
    Routed,
    /// Stopped by the confidence gate
    GatedOut,
    Classifying,
    Extracting,
    Analyzing,
    Done,
    Failed { stage: Stage },
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Rejected => write!(f, "rejected"),
            Self::Routed => write!(f, "routed"),
            Self::GatedOut => write!(f, "gated-out"),
            Self::Classifying => write!(f, "classifying"),
            Self::Extracting => write!(f, "extracting"),
            Self::Analyzing => write!(f, "analyzing"),
            Self::Done => write!(f, "done"),
            Self::Failed { stage } => write!(f, "failed({})", stage),
        }
    }
}

/// A finished pipeline run: the states it passed through and its result
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub transitions: Vec<PipelineState>,
    pub result: PipelineResult,
}

impl PipelineRun {
    /// Terminal state of the run
    pub fn state(&self) -> PipelineState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(PipelineState::Start)
    }
}

/// Records state transitions while a run is in progress
struct Trace {
    transitions: Vec<PipelineState>,
}

impl Trace {
    fn start() -> Self {
        Self {
            transitions: vec![PipelineState::Start],
        }
    }

    fn advance(&mut self, state: PipelineState) {
        self.transitions.push(state);
    }

    fn finish(mut self, state: PipelineState, result: PipelineResult) -> PipelineRun {
        self.transitions.push(state);
        PipelineRun {
            transitions: self.transitions,
            result,
        }
    }

    fn fail(self, failure: StageFailure) -> PipelineRun {
        error!(
            stage = %failure.stage,
            kind = %failure.source.kind(),
            error = %failure.source,
            "{}",
            failure.message()
        );
        let stage = failure.stage;
        self.finish(
            PipelineState::Failed { stage },
            PipelineResult::stage_failed(stage),
        )
    }

    fn reject(self, error: ValidationError) -> PipelineRun {
        warn!(error = %error, "Feedback rejected");
        self.finish(PipelineState::Rejected, PipelineResult::failed(error.to_string()))
    }
}

/// Main pipeline orchestrator
pub struct Orchestrator {
    generator: Arc<dyn Generator>,
    rules: Arc<RuleBook>,
    sequencer: Arc<TicketSequencer>,
    limits: FeedbackLimits,
}

impl Orchestrator {
    /// Create an orchestrator around a generator and rule book
    pub fn new(generator: Arc<dyn Generator>, rules: RuleBook) -> Self {
        Self {
            generator,
            rules: Arc::new(rules),
            sequencer: Arc::new(TicketSequencer::new()),
            limits: FeedbackLimits::default(),
        }
    }

    /// Build the production orchestrator from resolved configuration
    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let generator = OpenAiGenerator::new(
            &config.generation.api_base,
            config.generation.api_key.clone(),
            config.generation.model.clone(),
            config.generation.timeout(),
        )?;
        let rules = config.load_rules()?;

        Ok(Self::new(Arc::new(generator), rules).with_limits(config.limits.clone()))
    }

    pub fn with_limits(mut self, limits: FeedbackLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Share a ticket sequencer with other orchestrators
    pub fn with_sequencer(mut self, sequencer: Arc<TicketSequencer>) -> Self {
        self.sequencer = sequencer;
        self
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    pub fn limits(&self) -> &FeedbackLimits {
        &self.limits
    }

    /// Static health descriptor
    pub fn descriptor(&self) -> ServiceDescriptor {
        ServiceDescriptor::new(self.generator.model())
    }

    /// Process one feedback item into exactly one result
    pub async fn process(&self, item: FeedbackItem) -> PipelineResult {
        self.run(&item).await.result
    }

    /// Apply request defaults, then process; validation failures become
    /// failed results before any stage runs
    pub async fn process_request(
        &self,
        request: FeedbackRequest,
        default_source: &str,
    ) -> PipelineResult {
        match request.into_item(default_source) {
            Ok(item) => self.process(item).await,
            Err(e) => Trace::start().reject(e).result,
        }
    }

    /// Process one item, keeping the state transitions
    #[instrument(skip(self, item), fields(feedback_id = %item.id()))]
    pub async fn run(&self, item: &FeedbackItem) -> PipelineRun {
        let mut trace = Trace::start();
        let generator = self.generator.as_ref();

        if let Err(e) = self.limits.validate(item) {
            return trace.reject(e);
        }

        info!(source = %item.source(), "Routing feedback");
        let routing = match stages::route(generator, item).await {
            Ok(routing) => routing,
            Err(failure) => return trace.fail(failure),
        };
        trace.advance(PipelineState::Routed);

        match gate(&routing) {
            GateDecision::LowConfidence => {
                warn!(confidence = routing.confidence, "Low confidence score");
                return trace.finish(PipelineState::GatedOut, PipelineResult::low_confidence());
            }
            GateDecision::NonOperational => {
                info!(confidence = routing.confidence, "Feedback routed as non-operational");
                return trace.finish(PipelineState::Done, PipelineResult::non_operational());
            }
            GateDecision::Operational => {
                info!(confidence = routing.confidence, "Feedback routed as operational");
            }
        }

        trace.advance(PipelineState::Classifying);
        let classification = match stages::classify(generator, &self.rules, item).await {
            Ok(classification) => classification,
            Err(failure) => return trace.fail(failure),
        };
        info!(
            category = %classification.category,
            sentiment = %classification.sentiment,
            "Feedback classified"
        );

        trace.advance(PipelineState::Extracting);
        let details = match stages::extract_details(generator, item, &classification).await {
            Ok(details) => details,
            Err(failure) => return trace.fail(failure),
        };
        info!(affected_system = %details.affected_system, "Feedback details extracted");

        trace.advance(PipelineState::Analyzing);
        let analysis = match stages::analyze(
            generator,
            &self.rules,
            &self.sequencer,
            item,
            &classification,
            &details,
        )
        .await
        {
            Ok(analysis) => analysis,
            Err(failure) => return trace.fail(failure),
        };
        info!(
            team = %analysis.team,
            priority = %analysis.priority_level,
            ticket_id = analysis.ticket.as_ref().map(|t| t.ticket_id.as_str()).unwrap_or_default(),
            "Feedback analysis generated"
        );

        trace.finish(
            PipelineState::Done,
            PipelineResult::operational(&routing, classification, details, analysis),
        )
    }
}
