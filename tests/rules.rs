//! Rule Book Integration Tests
//!
//! Custom rule books loaded from YAML drive both the classifier's allowed
//! categories and every rule-derived ticket field.

use std::io::Write;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tempfile::NamedTempFile;

use opsdesk::adapters::ScriptedGenerator;
use opsdesk::core::stages::{analyzer, classifier, extractor, router};
use opsdesk::core::{Orchestrator, RuleBook};
use opsdesk::domain::{FeedbackItem, Priority};

const RULES_YAML: &str = r#"
categories:
  Parking: Facilities
  Security: Venue Security
teams:
  Facilities: Facilities Manager
  Venue Security: Head of Security
  Customer Support: Customer Support Lead
reporter: Duty Manager
priority_bands:
  high_below: 0.2
  medium_below: 0.5
due_offsets_days:
  high: 1
  medium: 2
  low: 5
"#;

fn rules_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", RULES_YAML).unwrap();
    file
}

fn script(category: &str, score: f64) -> ScriptedGenerator {
    ScriptedGenerator::new()
        .reply(
            router::SCHEMA_NAME,
            json!({ "feedback_type": "operational", "confidence_score": 0.88, "description": "" }),
        )
        .reply(
            classifier::SCHEMA_NAME,
            json!({
                "raw_text": "",
                "feedback_category": category,
                "overall_sentiment": "negative",
                "confidence_score": 0.8,
                "feedback_source": "",
            }),
        )
        .reply(
            extractor::SCHEMA_NAME,
            json!({
                "system_or_area": "North Lot",
                "mentioned_components": [],
                "pros": [],
                "cons": ["Gate closed early"],
                "improvement_suggestions": [],
                "categorize_feedback": [],
                "key_quotes": [],
            }),
        )
        .reply(
            analyzer::SCHEMA_NAME,
            json!({
                "sentiment_score": score,
                "summary": "The north lot gate closed before the game ended.",
                "recommended_actions": [],
                "similar_incidents_pattern": false,
            }),
        )
}

fn item() -> FeedbackItem {
    FeedbackItem::new(
        "fb-lot",
        "North lot gate closed before the game ended",
        "staff_report",
        NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_custom_rule_book_drives_ticket() {
    let file = rules_file();
    let rules = RuleBook::from_file(file.path()).unwrap();
    let generator = Arc::new(script("Parking", 0.3));
    let orchestrator = Orchestrator::new(generator.clone(), rules);

    let result = orchestrator.process(item()).await;

    assert!(result.success);
    assert_eq!(result.team.as_deref(), Some("Facilities"));
    assert_eq!(result.priority_level, Some(Priority::Medium));

    let ticket = result.ticket.unwrap();
    assert_eq!(ticket.ticket_id, "PARKING-2025-001");
    assert_eq!(ticket.assignee, "Facilities Manager");
    assert_eq!(ticket.reporter, "Duty Manager");
    assert_eq!(ticket.due_date, NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());

    // Classifier schema offers exactly the rule book's categories
    let calls = generator.calls();
    let classify_call = calls
        .iter()
        .find(|c| c.schema == classifier::SCHEMA_NAME)
        .unwrap();
    assert!(classify_call.prompt.user.contains("[Parking, Security]"));
}

#[tokio::test]
async fn test_unknown_category_falls_back_to_customer_support() {
    let rules = RuleBook::from_yaml(RULES_YAML).unwrap();
    let orchestrator = Orchestrator::new(Arc::new(script("Weather", 0.1)), rules);

    let result = orchestrator.process(item()).await;

    assert!(result.success);
    assert_eq!(result.team.as_deref(), Some("Customer Support"));
    let ticket = result.ticket.unwrap();
    assert_eq!(ticket.assignee, "Customer Support Lead");
    assert_eq!(ticket.priority, Priority::High);
    assert_eq!(ticket.due_date, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
}

#[test]
fn test_invalid_rule_book_file_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "categories:\n  Parking: Valet\nteams:\n  Customer Support: Customer Support Lead\n"
    )
    .unwrap();

    let err = RuleBook::from_file(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("Valet"));
}

#[test]
fn test_built_in_rule_book_round_trips_through_yaml() {
    let yaml = serde_yaml::to_string(&RuleBook::default()).unwrap();
    let parsed = RuleBook::from_yaml(&yaml).unwrap();
    assert_eq!(parsed, RuleBook::default());
}
