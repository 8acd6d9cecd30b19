use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Outcome of a single crisis classification pass over one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisVerdict {
    pub has_crisis_content: bool,
    pub is_emergency: bool,
    pub matched_keywords: Vec<String>,
    pub severity: Severity,
}

impl CrisisVerdict {
    /// Severity is derived here and nowhere else: emergency wins over any
    /// number of plain crisis matches.
    pub fn from_matches(matched_keywords: Vec<String>, is_emergency: bool) -> Self {
        let has_crisis_content = !matched_keywords.is_empty();
        let severity = if is_emergency {
            Severity::High
        } else if has_crisis_content {
            Severity::Medium
        } else {
            Severity::Low
        };

        Self {
            has_crisis_content,
            is_emergency,
            matched_keywords,
            severity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    Emergency,
    Support,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpResource {
    pub name: String,
    pub contact: String,
    pub available: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBundle {
    pub title: String,
    pub message: String,
    pub entries: Vec<HelpResource>,
}

/// Fixed response attached to a crisis-flagged chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub kind: EnvelopeKind,
    pub message: String,
    pub resources: ResourceBundle,
    pub bypass_generator: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub allowed: bool,
    pub reason: Option<String>,
    pub suggestion: Option<String>,
}

impl PolicyDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            suggestion: None,
        }
    }

    pub fn reject(reason: &str, suggestion: &str) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.to_string()),
            suggestion: Some(suggestion.to_string()),
        }
    }
}

/// A community wall post. Created once, never mutated, gone after its TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallPost {
    pub id: String,
    pub message: String,
    pub mood: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Read-time aggregate over the current wall snapshot. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallStats {
    pub total_posts: u64,
    pub mood_distribution: BTreeMap<String, u64>,
    pub time_distribution: TimeDistribution,
}

/// Cumulative buckets: a ten-minute-old post counts in all three.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeDistribution {
    #[serde(rename = "last15min")]
    pub last_15_min: u64,
    #[serde(rename = "last30min")]
    pub last_30_min: u64,
    #[serde(rename = "last60min")]
    pub last_60_min: u64,
}

/// Result of one end-to-end chat turn. `degraded` marks a turn where the
/// external responder failed and the fixed fallback reply was substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub reply: String,
    pub crisis: bool,
    pub emergency: bool,
    pub resources: Option<ResourceBundle>,
    pub degraded: bool,
}
