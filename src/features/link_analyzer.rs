use super::{category, Analyzer, Finding, Source};
use crate::config::{UrlConfig, UrlWeights};
use crate::domain_utils::DomainUtils;
use crate::error::{ConfigError, Result};
use crate::message::Message;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use url::{Host, Url};

const URL_PATTERN: &str = r#"(?i)\b(?:https?|ftp)://[^\s<>"'`{}|\\^]+"#;
const AUTHORITY_ESCAPE_PATTERN: &str = r"%[0-9A-Fa-f]{2}";
/// Encoded `.`, `/`, `:`, `@` and `\` anywhere in the URL.
const ENCODED_DELIMITER_PATTERN: &str = r"(?i)%(2e|2f|3a|40|5c)";

struct FiredRule {
    tag: &'static str,
    weight: f64,
    reason: String,
}

/// Finds URLs in free text and scores each one on its structure alone.
/// Nothing is resolved or fetched.
pub struct LinkAnalyzer {
    link_regex: Regex,
    authority_escape_regex: Regex,
    encoded_delimiter_regex: Regex,
    suspicious_tlds: HashSet<String>,
    protected_brands: BTreeMap<String, Vec<String>>,
    max_subdomain_dots: usize,
    weights: UrlWeights,
}

impl LinkAnalyzer {
    pub fn new(config: &UrlConfig) -> Result<Self> {
        let suspicious_tlds = config
            .suspicious_tlds
            .iter()
            .map(|tld| tld.trim().trim_start_matches('.').to_lowercase())
            .filter(|tld| !tld.is_empty())
            .collect();

        let protected_brands = config
            .protected_brands
            .iter()
            .map(|(brand, domains)| {
                (
                    brand.trim().to_lowercase(),
                    domains.iter().map(|d| d.trim().to_lowercase()).collect(),
                )
            })
            .collect();

        Ok(Self {
            link_regex: compile(URL_PATTERN)?,
            authority_escape_regex: compile(AUTHORITY_ESCAPE_PATTERN)?,
            encoded_delimiter_regex: compile(ENCODED_DELIMITER_PATTERN)?,
            suspicious_tlds,
            protected_brands,
            max_subdomain_dots: config.max_subdomain_dots,
            weights: config.weights.clone(),
        })
    }

    /// Distinct URLs in order of first appearance, trailing punctuation
    /// stripped.
    pub fn extract_urls<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut seen = HashSet::new();
        self.link_regex
            .find_iter(text)
            .map(|m| trim_url_tail(m.as_str()))
            .filter(|url| seen.insert(*url))
            .collect()
    }

    /// Score one URL. Returns `None` when no rule fires or the URL does not
    /// parse.
    pub fn inspect_url(&self, raw: &str) -> Option<Finding> {
        let parsed = match Url::parse(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::debug!("Skipping unparseable URL '{}': {}", raw, e);
                return None;
            }
        };

        let mut fired = Vec::new();

        match parsed.host() {
            Some(Host::Ipv4(ip)) => fired.push(FiredRule {
                tag: category::IP_BASED_URL,
                weight: self.weights.ip_literal,
                reason: format!("IP address {} used instead of domain name", ip),
            }),
            Some(Host::Ipv6(ip)) => fired.push(FiredRule {
                tag: category::IP_BASED_URL,
                weight: self.weights.ip_literal,
                reason: format!("IP address [{}] used instead of domain name", ip),
            }),
            _ => {}
        }

        if let Some(reason) = self.obfuscation_reason(raw, &parsed) {
            fired.push(FiredRule {
                tag: category::OBFUSCATED_URL,
                weight: self.weights.obfuscation,
                reason,
            });
        }

        if let Some(Host::Domain(domain)) = parsed.host() {
            let domain = domain.trim_end_matches('.').to_lowercase();

            if let Some(tld) = domain.rsplit('.').next() {
                if domain.contains('.') && self.suspicious_tlds.contains(tld) {
                    fired.push(FiredRule {
                        tag: category::SUSPICIOUS_TLD,
                        weight: self.weights.suspicious_tld,
                        reason: format!("Suspicious TLD: .{}", tld),
                    });
                }
            }

            if let Some(reason) = self.deceptive_subdomain_reason(&domain) {
                fired.push(FiredRule {
                    tag: category::DECEPTIVE_SUBDOMAIN,
                    weight: self.weights.deceptive_subdomain,
                    reason,
                });
            }
        }

        if fired.is_empty() {
            return None;
        }

        let mut heaviest = &fired[0];
        for rule in &fired[1..] {
            if rule.weight > heaviest.weight {
                heaviest = rule;
            }
        }

        let weight: f64 = fired.iter().map(|r| r.weight).sum();
        let reasons: Vec<&str> = fired.iter().map(|r| r.reason.as_str()).collect();
        let mut finding = Finding::new(
            Source::Url,
            heaviest.tag,
            weight,
            format!("Suspicious URL {}: {}", raw, reasons.join("; ")),
        );
        for rule in &fired {
            finding = finding.with_indicator(rule.tag);
        }

        log::debug!("{}", finding.description);
        Some(finding)
    }

    fn obfuscation_reason(&self, raw: &str, parsed: &Url) -> Option<String> {
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Some(format!(
                "'@' userinfo hides real host {}",
                parsed.host_str().unwrap_or("unknown")
            ));
        }

        if self.authority_escape_regex.is_match(raw_authority(raw)) {
            return Some("Host contains percent-encoded characters".to_string());
        }

        if self.encoded_delimiter_regex.is_match(raw) {
            return Some("URL contains percent-encoded delimiters".to_string());
        }

        if let Some(Host::Domain(domain)) = parsed.host() {
            if domain.split('.').any(|label| label.starts_with("xn--")) {
                return Some(format!("Internationalized lookalike host {}", domain));
            }
        }

        None
    }

    fn deceptive_subdomain_reason(&self, domain: &str) -> Option<String> {
        let canonical = DomainUtils::canonicalize_domain(domain);
        let dots = canonical.matches('.').count();
        if dots > self.max_subdomain_dots {
            return Some(format!(
                "Excessive subdomain nesting ({} levels) in {}",
                dots + 1,
                domain
            ));
        }

        for (brand, official_domains) in &self.protected_brands {
            if canonical.contains(brand.as_str())
                && !DomainUtils::matches_domain_list(&canonical, official_domains)
            {
                return Some(format!(
                    "Brand '{}' embedded in unrelated domain {}",
                    brand, domain
                ));
            }
        }

        None
    }
}

/// Strip sentence punctuation glued to the end of a URL. A closing
/// parenthesis stays when it balances one inside the URL.
fn trim_url_tail(url: &str) -> &str {
    let mut current = url;
    loop {
        let trimmed = current.trim_end_matches(['.', ',', ';', ':', '!', '?', '\'', '"']);
        let trimmed = match trimmed.strip_suffix(')') {
            Some(inner) if trimmed.matches('(').count() < trimmed.matches(')').count() => inner,
            _ => trimmed,
        };
        if trimmed.len() == current.len() {
            return trimmed;
        }
        current = trimmed;
    }
}

/// The `user:pass@host:port` part of a URL exactly as written.
fn raw_authority(raw: &str) -> &str {
    let rest = match raw.find("://") {
        Some(idx) => &raw[idx + 3..],
        None => raw,
    };
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| ConfigError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

impl Analyzer for LinkAnalyzer {
    fn analyze(&self, message: &Message<'_>) -> Vec<Finding> {
        let urls = self.extract_urls(message.body);
        log::trace!("Link analyzer extracted {} URLs", urls.len());

        urls.into_iter()
            .filter_map(|url| self.inspect_url(url))
            .collect()
    }

    fn name(&self) -> &str {
        "link_analyzer"
    }
}
