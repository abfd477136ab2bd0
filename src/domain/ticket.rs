//! Incident tickets and priority levels.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Initial status of every synthesized ticket
pub const INITIAL_STATUS: &str = "To Do";

/// Urgency of an operational issue
///
/// Serialized lowercase (`"high"`) as `priority_level`; tickets carry the
/// title-case form (`"High"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Title-case label used on tickets
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A synthesized incident ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// e.g. "WI-FI-2025-001"
    pub ticket_id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub assignee: String,
    pub reporter: String,
    #[serde(with = "ticket_priority")]
    pub priority: Priority,
    pub due_date: NaiveDate,
    pub affected_system: String,
}

mod ticket_priority {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::Priority;

    pub fn serialize<S: Serializer>(priority: &Priority, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(priority.label())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Priority, D::Error> {
        let label = String::deserialize(deserializer)?;
        Priority::from_label(&label)
            .ok_or_else(|| de::Error::custom(format!("unknown priority '{}'", label)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_uses_title_case_priority() {
        let ticket = Ticket {
            ticket_id: "WI-FI-2025-001".to_string(),
            title: "Arena Wi-Fi outage".to_string(),
            description: "Spotty Wi-Fi".to_string(),
            status: INITIAL_STATUS.to_string(),
            assignee: "IT Lead".to_string(),
            reporter: "Ops Manager".to_string(),
            priority: Priority::High,
            due_date: NaiveDate::from_ymd_opt(2025, 11, 19).unwrap(),
            affected_system: "Arena Wi-Fi".to_string(),
        };

        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["priority"], "High");
        assert_eq!(json["due_date"], "2025-11-19");
        assert_eq!(json["status"], "To Do");

        let parsed: Ticket = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.priority, Priority::High);
    }

    #[test]
    fn test_priority_level_is_lowercase() {
        assert_eq!(serde_json::to_string(&Priority::Medium).unwrap(), "\"medium\"");
    }
}
