//! Threat Report Model
//!
//! Reports of suspicious messages or links submitted by users, together with
//! the classifier verdict attached at submission time.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use url::Url;

use super::validation::{check_length, ValidationErrors};

pub const MAX_CONTENT_LENGTH: usize = 10_000;
pub const MAX_TITLE_LENGTH: usize = 200;

/// Threat categories recognized by the classifier and by reports
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ThreatCategory {
    Phishing,
    Malware,
    Scam,
    Predator,
    Cyberbullying,
    Other,
}

impl ThreatCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            ThreatCategory::Phishing => "Phishing",
            ThreatCategory::Malware => "Malware",
            ThreatCategory::Scam => "Scam",
            ThreatCategory::Predator => "Online Predator",
            ThreatCategory::Cyberbullying => "Cyberbullying",
            ThreatCategory::Other => "Other",
        }
    }
}

/// Severity label, ordered from least to most severe
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Map a confidence in `[0, 1]` onto a severity label
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.8 {
            Severity::Critical
        } else if confidence >= 0.6 {
            Severity::High
        } else if confidence >= 0.3 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Review state of a report
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ThreatStatus {
    Reported,
    Investigating,
    Resolved,
    Dismissed,
}

impl ThreatStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ThreatStatus::Resolved | ThreatStatus::Dismissed)
    }

    pub fn can_transition_to(&self, next: ThreatStatus) -> bool {
        match self {
            ThreatStatus::Reported => matches!(
                next,
                ThreatStatus::Investigating | ThreatStatus::Resolved | ThreatStatus::Dismissed
            ),
            ThreatStatus::Investigating => {
                matches!(next, ThreatStatus::Resolved | ThreatStatus::Dismissed)
            }
            ThreatStatus::Resolved | ThreatStatus::Dismissed => false,
        }
    }
}

/// Where an indicator came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IndicatorKind {
    Keyword,
    Pattern,
    Link,
}

/// Evidence that contributed to a verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    pub kind: IndicatorKind,
    pub category: ThreatCategory,
    pub detail: String,
}

/// Persisted threat report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Threat {
    pub id: String,
    pub reporter_id: String,
    pub category: ThreatCategory,
    pub severity: Severity,
    pub status: ThreatStatus,
    pub title: String,
    pub content: String,
    pub source_url: Option<String>,
    pub confidence: f64,
    pub indicators: Vec<Indicator>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Incoming report submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewThreatReport {
    pub title: String,
    pub content: String,
    pub source_url: Option<String>,
    /// Reporter-chosen category; the classifier decides when absent
    pub category: Option<ThreatCategory>,
}

impl NewThreatReport {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_length(&mut errors, "title", &self.title, 1, MAX_TITLE_LENGTH);
        check_length(&mut errors, "content", &self.content, 1, MAX_CONTENT_LENGTH);

        if let Some(ref source_url) = self.source_url {
            match Url::parse(source_url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                Ok(_) => errors.add("source_url", "must use http or https"),
                Err(_) => errors.add("source_url", "is not a valid URL"),
            }
        }

        errors.into_result()
    }
}

/// Status change request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatStatusUpdate {
    pub status: ThreatStatus,
}

/// Listing filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreatFilter {
    pub category: Option<ThreatCategory>,
    pub status: Option<ThreatStatus>,
}

/// Per-user report counts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreatSummary {
    pub total: i64,
    pub by_category: Vec<CountEntry>,
    pub by_severity: Vec<CountEntry>,
    pub open: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountEntry {
    pub key: String,
    pub count: i64,
}

/// Threat model errors
#[derive(Debug, thiserror::Error)]
pub enum ThreatError {
    #[error("Invalid stored value for {field}: {value}")]
    CorruptRecord { field: &'static str, value: String },

    #[error("Cannot move report from {from} to {to}")]
    InvalidTransition { from: ThreatStatus, to: ThreatStatus },
}
