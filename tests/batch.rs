//! Batch Integration Tests
//!
//! Ordering, per-item failure isolation and file loading for batch runs.

use std::io::Write;
use std::sync::Arc;

use serde_json::json;
use tempfile::NamedTempFile;

use opsdesk::adapters::{GenerationError, ScriptedGenerator};
use opsdesk::core::stages::{analyzer, classifier, extractor, router};
use opsdesk::core::{
    load_batch, parse_batch, run_batch, BatchSummary, FeedbackLimits, Orchestrator, RuleBook,
};
use opsdesk::domain::FeedbackRequest;

fn request(id: &str, text: &str) -> FeedbackRequest {
    FeedbackRequest {
        feedback_id: Some(id.to_string()),
        title: Some(format!("Item {}", id)),
        event_date: Some("2025-11-16".to_string()),
        ..FeedbackRequest::from_text(text)
    }
}

fn operational_generator() -> ScriptedGenerator {
    ScriptedGenerator::new()
        .always(
            router::SCHEMA_NAME,
            json!({ "feedback_type": "operational", "confidence_score": 0.9, "description": "" }),
        )
        .always(
            extractor::SCHEMA_NAME,
            json!({
                "system_or_area": "Concourse Stands",
                "mentioned_components": [],
                "pros": [],
                "cons": ["Long lines"],
                "improvement_suggestions": ["Open more registers"],
                "categorize_feedback": [],
                "key_quotes": [],
            }),
        )
        .always(
            analyzer::SCHEMA_NAME,
            json!({
                "sentiment_score": 0.5,
                "summary": "Concession lines were long.",
                "recommended_actions": [],
                "similar_incidents_pattern": true,
            }),
        )
}

fn classification() -> serde_json::Value {
    json!({
        "raw_text": "",
        "feedback_category": "Concessions",
        "overall_sentiment": "negative",
        "confidence_score": 0.8,
        "feedback_source": "",
    })
}

#[tokio::test]
async fn test_failed_item_does_not_affect_neighbours() {
    let generator = operational_generator()
        .reply(classifier::SCHEMA_NAME, classification())
        .fail(
            classifier::SCHEMA_NAME,
            GenerationError::malformed("truncated output"),
        )
        .reply(classifier::SCHEMA_NAME, classification());
    let orchestrator = Orchestrator::new(Arc::new(generator), RuleBook::default());

    let requests = vec![
        request("one", "Lines at the taco stand took forever"),
        request("two", "Beer stand ran out of cups"),
        request("three", "Hot dogs were cold"),
    ];

    let entries = run_batch(&orchestrator, requests, 1).await;

    let ids: Vec<_> = entries
        .iter()
        .map(|e| e.feedback_id.as_deref().unwrap())
        .collect();
    assert_eq!(ids, vec!["one", "two", "three"]);

    assert!(entries[0].result.success);
    assert!(!entries[1].result.success);
    assert_eq!(entries[1].result.message, "Feedback classification failed");
    assert!(entries[2].result.success);
    assert_eq!(entries[2].title.as_deref(), Some("Item three"));

    assert_eq!(
        entries[0].result.ticket.as_ref().unwrap().ticket_id,
        "CONCESSIONS-2025-001"
    );
    assert_eq!(
        entries[2].result.ticket.as_ref().unwrap().ticket_id,
        "CONCESSIONS-2025-002"
    );

    let summary = BatchSummary::from_entries(&entries);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.tickets, 2);
}

#[tokio::test]
async fn test_malformed_entry_fails_alone() {
    let generator = operational_generator().always(classifier::SCHEMA_NAME, classification());
    let orchestrator = Orchestrator::new(Arc::new(generator), RuleBook::default());

    let items = parse_batch(
        &json!([
            { "feedback_id": "1", "feedback_text": "Lines at the taco stand took forever" },
            { "feedback_id": "2", "title": "Nothing", "feedback_text": null },
            { "feedback_id": "3", "feedback_text": "Hot dogs were cold", "event_date": 20251116 },
            { "feedback_id": "4", "feedback_text": "Beer stand ran out of cups" },
        ])
        .to_string(),
        &FeedbackLimits::default(),
    )
    .unwrap();

    let entries = run_batch(&orchestrator, items, 2).await;

    let ids: Vec<_> = entries
        .iter()
        .map(|e| e.feedback_id.as_deref().unwrap())
        .collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);

    assert!(entries[0].result.success);
    assert!(!entries[1].result.success);
    assert!(entries[1].result.message.starts_with("Invalid feedback entry"));
    assert_eq!(entries[1].title.as_deref(), Some("Nothing"));
    assert!(!entries[2].result.success);
    assert!(entries[3].result.success);

    let summary = BatchSummary::from_entries(&entries);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 2);
}

#[tokio::test]
async fn test_concurrent_batch_preserves_order() {
    let generator = ScriptedGenerator::new().always(
        router::SCHEMA_NAME,
        json!({ "feedback_type": "non_operational", "confidence_score": 0.9, "description": "" }),
    );
    let orchestrator = Orchestrator::new(Arc::new(generator), RuleBook::default());

    let requests: Vec<_> = (0..20)
        .map(|i| request(&format!("item-{}", i), "Great atmosphere"))
        .collect();

    let entries = run_batch(&orchestrator, requests, 8).await;

    assert_eq!(entries.len(), 20);
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.feedback_id.as_deref(), Some(format!("item-{}", i).as_str()));
        assert!(entry.result.success);
    }
}

#[test]
fn test_load_batch_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "{}",
        json!([
            { "feedback_id": "a", "feedback_text": "Scoreboard froze", "source": "X_post" },
            { "feedback_text": "Loved it" },
        ])
    )
    .unwrap();

    let items = load_batch(file.path(), &FeedbackLimits::default()).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].request().unwrap().declared_id(), Some("a"));

    let second = items[1].request().unwrap();
    assert!(second.declared_id().is_none());
    let item = second.clone().into_item("batch").unwrap();
    assert_eq!(item.source(), "batch");
}

#[test]
fn test_load_batch_reports_path_on_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();

    let err = load_batch(file.path(), &FeedbackLimits::default()).unwrap_err();
    assert!(format!("{:#}", err).contains(&file.path().display().to_string()));
}
