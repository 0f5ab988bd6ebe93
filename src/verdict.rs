use crate::features::Finding;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Bands are closed at the bottom: `score >= high` is High,
    /// `medium <= score < high` is Medium, anything lower is Low.
    pub fn from_score(score: f64, medium_threshold: f64, high_threshold: f64) -> Self {
        if score >= high_threshold {
            RiskLevel::High
        } else if score >= medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn recommended_action(self) -> RecommendedAction {
        match self {
            RiskLevel::High => RecommendedAction::BlockAndReport,
            RiskLevel::Medium => RecommendedAction::FlagForReview,
            RiskLevel::Low => RecommendedAction::Deliver,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    /// Block the message, report the sender and log the incident.
    BlockAndReport,
    /// Hold for manual review and keep monitoring the sender.
    FlagForReview,
    /// Normal processing.
    Deliver,
}

impl RecommendedAction {
    pub fn description(self) -> &'static str {
        match self {
            RecommendedAction::BlockAndReport => {
                "Block this message immediately, report the sender and log the incident"
            }
            RecommendedAction::FlagForReview => {
                "Flag for review before taking any action and monitor the sender"
            }
            RecommendedAction::Deliver => {
                "Process normally; message appears to be legitimate but always exercise caution"
            }
        }
    }
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Result of one analysis. Owned by the caller; nothing is retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Normalized score in [0.0, 1.0].
    pub score: f64,
    /// Sum of finding weights before normalization.
    pub raw_score: f64,
    pub risk_level: RiskLevel,
    /// Keyword findings, then URL findings, then header findings.
    pub findings: Vec<Finding>,
    pub recommended_action: RecommendedAction,
}

impl Verdict {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.findings.iter().any(|f| f.category == category)
    }
}
