//! Batch processing of feedback files.
//!
//! A batch file is a JSON array of feedback requests. Each entry is decoded
//! and processed independently through the orchestrator and reported in input order.

use std::path::Path;

use anyhow::{bail, Context, Result};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::limits::FeedbackLimits;
use super::orchestrator::Orchestrator;
use crate::domain::{BatchEntry, FeedbackRequest, PipelineResult, DEFAULT_BATCH_SOURCE};

/// One entry of a batch file
///
/// Entries are decoded one at a time so a malformed entry fails on its own
/// instead of rejecting the whole file.
#[derive(Debug, Clone)]
pub enum BatchItem {
    Request(FeedbackRequest),
    Undecodable {
        feedback_id: Option<String>,
        title: Option<String>,
        error: String,
    },
}

impl BatchItem {
    /// Decode a single batch file entry
    pub fn from_value(value: Value) -> Self {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };
        let feedback_id = field("feedback_id").or_else(|| field("id"));
        let title = field("title");

        match serde_json::from_value(value) {
            Ok(request) => Self::Request(request),
            Err(e) => Self::Undecodable {
                feedback_id,
                title,
                error: format!("Invalid feedback entry: {}", e),
            },
        }
    }

    /// The decoded request, if the entry was well-formed
    pub fn request(&self) -> Option<&FeedbackRequest> {
        match self {
            Self::Request(request) => Some(request),
            Self::Undecodable { .. } => None,
        }
    }
}

impl From<FeedbackRequest> for BatchItem {
    fn from(request: FeedbackRequest) -> Self {
        Self::Request(request)
    }
}

/// Read a batch file
pub fn load_batch(path: &Path, limits: &FeedbackLimits) -> Result<Vec<BatchItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {}", path.display()))?;

    parse_batch(&content, limits)
        .with_context(|| format!("Failed to load batch file: {}", path.display()))
}

/// Parse a JSON array of feedback entries
pub fn parse_batch(content: &str, limits: &FeedbackLimits) -> Result<Vec<BatchItem>> {
    let values: Vec<Value> =
        serde_json::from_str(content).context("Batch must be a JSON array of feedback objects")?;

    if values.len() > limits.max_batch_items {
        bail!(
            "Batch has {} items, limit is {}",
            values.len(),
            limits.max_batch_items
        );
    }

    Ok(values.into_iter().map(BatchItem::from_value).collect())
}

fn rejected(feedback_id: Option<String>, title: Option<String>, error: String) -> BatchEntry {
    warn!(feedback_id = ?feedback_id, error = %error, "Skipping invalid batch item");
    BatchEntry {
        feedback_id,
        title,
        result: PipelineResult::failed(error),
    }
}

/// Process one entry into its batch entry
async fn process_entry(orchestrator: &Orchestrator, item: BatchItem) -> BatchEntry {
    let request = match item {
        BatchItem::Request(request) => request,
        BatchItem::Undecodable {
            feedback_id,
            title,
            error,
        } => return rejected(feedback_id, title, error),
    };

    let declared_id = request.declared_id().map(str::to_string);
    let title = request.title.clone();

    match request.into_item(DEFAULT_BATCH_SOURCE) {
        Ok(item) => {
            let feedback_id = Some(item.id().to_string());
            BatchEntry {
                feedback_id,
                title,
                result: orchestrator.process(item).await,
            }
        }
        Err(e) => rejected(declared_id, title, e.to_string()),
    }
}

/// Process every entry, at most `concurrency` at a time, preserving order
pub async fn run_batch<I>(
    orchestrator: &Orchestrator,
    items: I,
    concurrency: usize,
) -> Vec<BatchEntry>
where
    I: IntoIterator,
    I::Item: Into<BatchItem>,
{
    let items: Vec<BatchItem> = items.into_iter().map(Into::into).collect();
    info!(total = items.len(), concurrency, "Starting batch");

    let entries: Vec<BatchEntry> = stream::iter(items)
        .map(|item| process_entry(orchestrator, item))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let summary = BatchSummary::from_entries(&entries);
    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        tickets = summary.tickets,
        "Batch complete"
    );

    entries
}

/// Counts over a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Entries that produced a ticket
    pub tickets: usize,
}

impl BatchSummary {
    pub fn from_entries(entries: &[BatchEntry]) -> Self {
        let succeeded = entries.iter().filter(|e| e.result.success).count();
        Self {
            total: entries.len(),
            succeeded,
            failed: entries.len() - succeeded,
            tickets: entries.iter().filter(|e| e.result.ticket.is_some()).count(),
        }
    }
}
