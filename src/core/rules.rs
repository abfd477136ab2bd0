//! Deterministic team, priority and due-date rules.
//!
//! The rule book is plain data, loadable from YAML, and is handed to the
//! analyzer explicitly. Its category keys are also the classifier's allowed
//! categories, so the two cannot drift apart.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Priority;

/// Category, team and priority rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBook {
    /// Category -> owning team
    pub categories: BTreeMap<String, String>,

    /// Team -> assignee role
    pub teams: BTreeMap<String, String>,

    /// Team for categories missing from `categories`
    #[serde(default = "default_fallback_team")]
    pub fallback_team: String,

    /// Reporter recorded on every ticket
    #[serde(default = "default_reporter")]
    pub reporter: String,

    #[serde(default)]
    pub priority_bands: PriorityBands,

    #[serde(default)]
    pub due_offsets_days: DueOffsets,
}

/// Upper bounds (exclusive) of the high and medium sentiment bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityBands {
    #[serde(default = "default_high_below")]
    pub high_below: f64,

    #[serde(default = "default_medium_below")]
    pub medium_below: f64,
}

/// Days from the event date until a ticket is due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueOffsets {
    #[serde(default = "default_high_days")]
    pub high: u64,

    #[serde(default = "default_medium_days")]
    pub medium: u64,

    #[serde(default = "default_low_days")]
    pub low: u64,
}

/// Team and assignee resolved for a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment<'a> {
    pub team: &'a str,
    pub assignee: &'a str,
    /// False if the category was unknown and the fallback team was used
    pub matched: bool,
}

fn default_fallback_team() -> String {
    "Customer Support".to_string()
}
fn default_reporter() -> String {
    "Ops Manager".to_string()
}
fn default_high_below() -> f64 {
    0.3
}
fn default_medium_below() -> f64 {
    0.6
}
fn default_high_days() -> u64 {
    3
}
fn default_medium_days() -> u64 {
    7
}
fn default_low_days() -> u64 {
    14
}

impl Default for PriorityBands {
    fn default() -> Self {
        Self {
            high_below: default_high_below(),
            medium_below: default_medium_below(),
        }
    }
}

impl Default for DueOffsets {
    fn default() -> Self {
        Self {
            high: default_high_days(),
            medium: default_medium_days(),
            low: default_low_days(),
        }
    }
}

impl DueOffsets {
    pub fn days_for(&self, priority: Priority) -> u64 {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }
}

impl Default for RuleBook {
    fn default() -> Self {
        let categories = [
            ("Wi-Fi", "IT"),
            ("Infrastructure", "IT"),
            ("Mobile App", "Product Team"),
            ("Ticketing", "Product Team"),
            ("Scoreboard", "Arena Operations"),
            ("Concessions", "Arena Operations"),
            ("Fan Experience", "Customer Support"),
            ("Facilities", "Facilities"),
            ("Marketing", "Marketing"),
        ];
        let teams = [
            ("IT", "IT Lead"),
            ("Product Team", "Product Manager"),
            ("Arena Operations", "Arena Ops Manager"),
            ("Customer Support", "Customer Support Lead"),
            ("Facilities", "Facilities Manager"),
            ("Marketing", "Marketing Lead"),
        ];

        Self {
            categories: categories
                .iter()
                .map(|(c, t)| (c.to_string(), t.to_string()))
                .collect(),
            teams: teams
                .iter()
                .map(|(t, a)| (t.to_string(), a.to_string()))
                .collect(),
            fallback_team: default_fallback_team(),
            reporter: default_reporter(),
            priority_bands: PriorityBands::default(),
            due_offsets_days: DueOffsets::default(),
        }
    }
}

impl RuleBook {
    /// Load a rule book from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule book: {}", path.display()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Invalid rule book: {}", path.display()))
    }

    /// Parse and validate a rule book from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        let rules: Self = serde_yaml::from_str(content).context("Failed to parse rule book YAML")?;
        rules.validate()?;
        Ok(rules)
    }

    /// Check the tables are internally consistent
    pub fn validate(&self) -> Result<(), RuleBookError> {
        if self.categories.is_empty() {
            return Err(RuleBookError::NoCategories);
        }

        for (category, team) in &self.categories {
            if category.trim().is_empty() {
                return Err(RuleBookError::BlankCategory);
            }
            if !self.teams.contains_key(team) {
                return Err(RuleBookError::TeamWithoutAssignee { team: team.clone() });
            }
        }

        if !self.teams.contains_key(&self.fallback_team) {
            return Err(RuleBookError::TeamWithoutAssignee {
                team: self.fallback_team.clone(),
            });
        }

        let PriorityBands {
            high_below,
            medium_below,
        } = self.priority_bands;
        let ordered = 0.0 <= high_below && high_below <= medium_below && medium_below <= 1.0;
        if !ordered {
            return Err(RuleBookError::InvalidBands {
                high_below,
                medium_below,
            });
        }

        Ok(())
    }

    /// Categories the classifier may choose from
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    pub fn is_known_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    /// Team owning a category, falling back for unknown categories
    pub fn team_for(&self, category: &str) -> &str {
        self.categories
            .get(category)
            .map(String::as_str)
            .unwrap_or(&self.fallback_team)
    }

    /// Team and assignee for a category
    pub fn assignment_for(&self, category: &str) -> Assignment<'_> {
        let matched = self.is_known_category(category);
        let team = self.team_for(category);
        let assignee = self
            .teams
            .get(team)
            .map(String::as_str)
            .unwrap_or("Unassigned");

        Assignment {
            team,
            assignee,
            matched,
        }
    }

    /// Priority band for a sentiment score (lower bound of each band inclusive)
    pub fn priority_for(&self, sentiment_score: f64) -> Priority {
        if sentiment_score < self.priority_bands.high_below {
            Priority::High
        } else if sentiment_score < self.priority_bands.medium_below {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    /// Due date for a ticket raised against an event
    pub fn due_date(&self, event_date: NaiveDate, priority: Priority) -> NaiveDate {
        let days = self.due_offsets_days.days_for(priority);
        event_date
            .checked_add_days(Days::new(days))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// Rule book consistency errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleBookError {
    #[error("Rule book must define at least one category")]
    NoCategories,

    #[error("Rule book contains a blank category name")]
    BlankCategory,

    #[error("Team '{team}' has no assignee")]
    TeamWithoutAssignee { team: String },

    #[error("Priority bands must satisfy 0 <= high_below ({high_below}) <= medium_below ({medium_below}) <= 1")]
    InvalidBands { high_below: f64, medium_below: f64 },
}
