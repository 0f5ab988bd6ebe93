pub mod keyword_analyzer;
pub mod link_analyzer;
pub mod sender_alignment;

use crate::message::Message;
use serde::{Deserialize, Serialize};

pub use keyword_analyzer::KeywordAnalyzer;
pub use link_analyzer::LinkAnalyzer;
pub use sender_alignment::SenderAlignmentAnalyzer;

/// Category tags emitted by the URL and header analyzers. Keyword findings
/// use the category names of the configured keyword table.
pub mod category {
    pub const IP_BASED_URL: &str = "ip_based_url";
    pub const OBFUSCATED_URL: &str = "obfuscated_url";
    pub const SUSPICIOUS_TLD: &str = "suspicious_tld";
    pub const DECEPTIVE_SUBDOMAIN: &str = "deceptive_subdomain";

    pub const DOMAIN_MISMATCH: &str = "domain_mismatch";
    pub const REPLY_TO_MISMATCH: &str = "reply_to_mismatch";
    pub const MISSING_AUTHENTICATION: &str = "missing_authentication";
    pub const AUTHENTICATION_FAILURE: &str = "authentication_failure";
    pub const DISPLAY_NAME_IMPERSONATION: &str = "display_name_impersonation";
    pub const SUSPICIOUS_SENDER: &str = "suspicious_sender";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Keyword,
    Url,
    Header,
}

/// One piece of evidence produced by an analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub source: Source,
    pub category: String,
    pub weight: f64,
    pub description: String,
    /// What matched: the phrase, the URL rule tags, or the offending domains.
    pub indicators: Vec<String>,
}

impl Finding {
    pub fn new(
        source: Source,
        category: impl Into<String>,
        weight: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            source,
            category: category.into(),
            weight,
            description: description.into(),
            indicators: Vec::new(),
        }
    }

    pub fn with_indicator(mut self, indicator: impl Into<String>) -> Self {
        self.indicators.push(indicator.into());
        self
    }

    pub fn has_indicator(&self, indicator: &str) -> bool {
        self.indicators.iter().any(|i| i == indicator)
    }
}

/// Shared capability of every detector: inspect one message, report
/// findings. Implementations hold only read-only configuration.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, message: &Message<'_>) -> Vec<Finding>;
    fn name(&self) -> &str;
}
