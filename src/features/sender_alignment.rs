use super::keyword_analyzer::phrase_pattern;
use super::{category, Analyzer, Finding, Source};
use crate::config::{HeaderConfig, HeaderWeights, MatchMode};
use crate::domain_utils::DomainUtils;
use crate::error::{ConfigError, Result};
use crate::message::Message;
use regex::{Regex, RegexBuilder};

const AUTH_RESULT_PATTERN: &str = r"(?i)\b(spf|dkim|dmarc)\s*=\s*([a-z]+)";

/// Checks sender headers for mismatches and impersonation of the platform.
///
/// A message without headers produces no findings at all: whether headers
/// are available depends on the transport, not on the sender.
pub struct SenderAlignmentAnalyzer {
    platform_name: String,
    platform_domains: Vec<String>,
    platform_name_regex: Option<Regex>,
    identity_claims: Vec<Regex>,
    display_name_patterns: Vec<(String, Regex)>,
    sender_patterns: Vec<(String, Regex)>,
    auth_result_regex: Regex,
    weights: HeaderWeights,
}

struct SenderInfo {
    address: Option<String>,
    domain: Option<String>,
    display_name: Option<String>,
}

impl SenderAlignmentAnalyzer {
    pub fn new(config: &HeaderConfig) -> Result<Self> {
        let platform_name = config.platform_name.trim().to_string();
        let platform_name_regex = if platform_name.is_empty() {
            None
        } else {
            Some(build_case_insensitive(&phrase_pattern(
                &platform_name,
                MatchMode::WordBoundary,
            ))?)
        };

        let identity_claims = config
            .identity_claims
            .iter()
            .filter(|claim| !claim.trim().is_empty())
            .map(|claim| build_case_insensitive(&phrase_pattern(claim, MatchMode::WordBoundary)))
            .collect::<Result<Vec<_>>>()?;

        let display_name_patterns = config
            .impersonation_display_names
            .iter()
            .map(|p| build_case_insensitive(p).map(|regex| (p.clone(), regex)))
            .collect::<Result<Vec<_>>>()?;

        let sender_patterns = config
            .suspicious_sender_patterns
            .iter()
            .map(|p| build_case_insensitive(p).map(|regex| (p.clone(), regex)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            platform_name,
            platform_domains: config
                .platform_domains
                .iter()
                .map(|d| d.trim().to_lowercase())
                .collect(),
            platform_name_regex,
            identity_claims,
            display_name_patterns,
            sender_patterns,
            auth_result_regex: build_case_insensitive(AUTH_RESULT_PATTERN)?,
            weights: config.weights.clone(),
        })
    }

    fn extract_sender_info(&self, message: &Message<'_>) -> SenderInfo {
        let from = message.header("from").unwrap_or_default();
        SenderInfo {
            address: DomainUtils::extract_address(from),
            domain: DomainUtils::extract_domain(from),
            display_name: DomainUtils::extract_display_name(from),
        }
    }

    fn is_platform_domain(&self, domain: &str) -> bool {
        DomainUtils::matches_domain_list(domain, &self.platform_domains)
    }

    /// Body text or display name presents the message as coming from the
    /// platform itself.
    fn claims_platform_identity(&self, message: &Message<'_>, sender: &SenderInfo) -> bool {
        if self.identity_claims.iter().any(|r| r.is_match(message.body)) {
            return true;
        }

        match (&self.platform_name_regex, &sender.display_name) {
            (Some(regex), Some(name)) => regex.is_match(name),
            _ => false,
        }
    }

    fn check_domain_mismatch(&self, sender: &SenderInfo, claims_identity: bool) -> Option<Finding> {
        let domain = sender.domain.as_deref()?;
        if !claims_identity || self.is_platform_domain(domain) {
            return None;
        }

        Some(
            Finding::new(
                Source::Header,
                category::DOMAIN_MISMATCH,
                self.weights.domain_mismatch,
                format!(
                    "Message claims to be from {} but sender domain is {}",
                    self.platform_name, domain
                ),
            )
            .with_indicator(domain),
        )
    }

    fn check_reply_to(&self, message: &Message<'_>, sender: &SenderInfo) -> Option<Finding> {
        let from_domain = sender.domain.as_deref()?;
        let reply_domain = DomainUtils::extract_domain(message.header("reply-to")?)?;

        if DomainUtils::same_organization(from_domain, &reply_domain) {
            return None;
        }

        Some(
            Finding::new(
                Source::Header,
                category::REPLY_TO_MISMATCH,
                self.weights.reply_to_mismatch,
                format!(
                    "Reply-To domain {} differs from From domain {}",
                    reply_domain, from_domain
                ),
            )
            .with_indicator(from_domain)
            .with_indicator(reply_domain),
        )
    }

    fn check_authentication(&self, message: &Message<'_>) -> Option<Finding> {
        let mut failed = Vec::new();
        let mut passed = false;

        if let Some(results) = message.header("authentication-results") {
            for caps in self.auth_result_regex.captures_iter(results) {
                let mechanism = caps[1].to_lowercase();
                match caps[2].to_lowercase().as_str() {
                    "pass" => passed = true,
                    "fail" | "softfail" | "permerror" => {
                        if !failed.contains(&mechanism) {
                            failed.push(mechanism);
                        }
                    }
                    _ => {}
                }
            }
        }

        if let Some(received_spf) = message.header("received-spf") {
            let verdict = received_spf.trim_start().to_lowercase();
            if verdict.starts_with("fail") || verdict.starts_with("softfail") {
                if !failed.iter().any(|m| m == "spf") {
                    failed.push("spf".to_string());
                }
            } else if verdict.starts_with("pass") {
                passed = true;
            }
        }

        if !failed.is_empty() {
            let mut finding = Finding::new(
                Source::Header,
                category::AUTHENTICATION_FAILURE,
                self.weights.authentication_failure,
                format!(
                    "Claims to be {} support but failed {} authentication",
                    self.platform_name,
                    failed.join("/").to_uppercase()
                ),
            );
            for mechanism in failed {
                finding = finding.with_indicator(mechanism);
            }
            return Some(finding);
        }

        if !passed {
            return Some(Finding::new(
                Source::Header,
                category::MISSING_AUTHENTICATION,
                self.weights.missing_authentication,
                format!(
                    "Claims to be {} support but carries no passing authentication result",
                    self.platform_name
                ),
            ));
        }

        None
    }

    fn check_display_name(&self, sender: &SenderInfo) -> Option<Finding> {
        let name = sender.display_name.as_deref()?;
        let domain = sender.domain.as_deref()?;
        if self.is_platform_domain(domain) {
            return None;
        }

        let matched: Vec<&str> = self
            .display_name_patterns
            .iter()
            .filter(|(_, regex)| regex.is_match(name))
            .map(|(pattern, _)| pattern.as_str())
            .collect();
        if matched.is_empty() {
            return None;
        }

        let mut finding = Finding::new(
            Source::Header,
            category::DISPLAY_NAME_IMPERSONATION,
            self.weights.display_name_impersonation,
            format!(
                "Display name '{}' impersonates staff while sending from external domain {}",
                name, domain
            ),
        );
        for pattern in matched {
            finding = finding.with_indicator(pattern);
        }
        Some(finding)
    }

    fn check_sender_patterns(&self, sender: &SenderInfo) -> Vec<Finding> {
        let (Some(address), Some(domain)) = (sender.address.as_deref(), sender.domain.as_deref())
        else {
            return Vec::new();
        };
        if self.is_platform_domain(domain) {
            return Vec::new();
        }

        self.sender_patterns
            .iter()
            .filter(|(_, regex)| regex.is_match(address))
            .map(|(pattern, _)| {
                Finding::new(
                    Source::Header,
                    category::SUSPICIOUS_SENDER,
                    self.weights.suspicious_sender,
                    format!("Suspicious sender pattern {} in {}", pattern, address),
                )
                .with_indicator(pattern.clone())
            })
            .collect()
    }
}

fn build_case_insensitive(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ConfigError::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}

impl Analyzer for SenderAlignmentAnalyzer {
    fn analyze(&self, message: &Message<'_>) -> Vec<Finding> {
        if !message.has_headers() {
            return Vec::new();
        }

        let sender = self.extract_sender_info(message);
        let from_platform = sender
            .domain
            .as_deref()
            .is_some_and(|d| self.is_platform_domain(d));
        let claims_identity = self.claims_platform_identity(message, &sender);

        let mut findings = Vec::new();
        findings.extend(self.check_domain_mismatch(&sender, claims_identity));
        findings.extend(self.check_reply_to(message, &sender));
        if claims_identity || from_platform {
            findings.extend(self.check_authentication(message));
        }
        findings.extend(self.check_display_name(&sender));
        findings.extend(self.check_sender_patterns(&sender));

        for finding in &findings {
            log::debug!("Header finding: {}", finding.description);
        }
        findings
    }

    fn name(&self) -> &str {
        "sender_alignment"
    }
}
