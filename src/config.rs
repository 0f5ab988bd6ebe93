use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Static reference data driving every analyzer.
///
/// Loaded once, validated by `PhishingDetector::new`, read-only afterwards.
/// Every section falls back to its defaults so a partial YAML file only
/// overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub keywords: KeywordConfig,
    pub urls: UrlConfig,
    pub headers: HeaderConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Phrase must start and end on a word boundary.
    #[default]
    WordBoundary,
    /// Plain case-insensitive substring search.
    Substring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub match_mode: MatchMode,
    /// category -> phrase -> weight
    pub categories: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlConfig {
    pub suspicious_tlds: Vec<String>,
    /// brand -> official domains
    pub protected_brands: BTreeMap<String, Vec<String>>,
    /// Dots allowed in a host (after dropping `www.`) before it counts as
    /// excessive nesting.
    pub max_subdomain_dots: usize,
    pub weights: UrlWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlWeights {
    pub ip_literal: f64,
    pub suspicious_tld: f64,
    pub deceptive_subdomain: f64,
    pub obfuscation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    pub platform_name: String,
    pub platform_domains: Vec<String>,
    /// Phrases by which a message claims to come from the platform itself.
    pub identity_claims: Vec<String>,
    /// Case-insensitive regexes over the From display name.
    pub impersonation_display_names: Vec<String>,
    /// Case-insensitive regexes over the From address.
    pub suspicious_sender_patterns: Vec<String>,
    pub weights: HeaderWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderWeights {
    pub domain_mismatch: f64,
    pub reply_to_mismatch: f64,
    pub missing_authentication: f64,
    pub authentication_failure: f64,
    pub display_name_impersonation: f64,
    pub suspicious_sender: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Raw weight sum that maps to a score of 1.0.
    pub normalization_constant: f64,
    pub medium_threshold: f64,
    pub high_threshold: f64,
}

fn phrase_table(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries
        .iter()
        .map(|(phrase, weight)| (phrase.to_string(), *weight))
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for KeywordConfig {
    fn default() -> Self {
        let mut categories = BTreeMap::new();

        categories.insert(
            "external_payment".to_string(),
            phrase_table(&[
                ("external payment", 0.8),
                ("paypal only", 0.7),
                ("western union", 0.8),
                ("direct payment", 0.7),
                ("pay through paypal", 0.7),
                ("paypal directly", 0.6),
                ("pay me directly", 0.7),
                ("bank transfer", 0.5),
                ("cryptocurrency", 0.7),
                ("bitcoin payment", 0.8),
                ("bitcoin wallet", 0.7),
            ]),
        );

        categories.insert(
            "off_platform_contact".to_string(),
            phrase_table(&[
                ("contact outside", 0.6),
                ("outside fiverr", 0.6),
                ("outside of fiverr", 0.6),
                ("whatsapp", 0.5),
                ("telegram", 0.5),
                ("skype chat", 0.5),
                ("private email", 0.6),
            ]),
        );

        categories.insert(
            "urgent_language".to_string(),
            phrase_table(&[
                ("urgent", 0.3),
                ("click here", 0.2),
                ("limited time", 0.2),
                ("act now", 0.3),
                ("immediately", 0.2),
                ("within 24 hours", 0.3),
            ]),
        );

        categories.insert(
            "impersonation".to_string(),
            phrase_table(&[
                ("fiverr support team", 0.5),
                ("fiverr security team", 0.5),
                ("fiverr payments team", 0.5),
                ("fiverr trust and safety", 0.5),
                ("official fiverr", 0.4),
            ]),
        );

        categories.insert(
            "account_verification".to_string(),
            phrase_table(&[
                ("verify your account", 0.4),
                ("account verification required", 0.6),
                ("needs verification", 0.4),
                ("account suspended", 0.4),
                ("account closure", 0.4),
                ("confirm identity", 0.4),
                ("confirm your identity", 0.4),
                ("password expired", 0.4),
                ("login attempt", 0.3),
                ("unusual login", 0.3),
                ("unusual activity", 0.3),
                ("suspicious activity", 0.4),
                ("security alert", 0.3),
            ]),
        );

        categories.insert(
            "promotional_scam".to_string(),
            phrase_table(&[
                ("bonus offer", 0.4),
                ("special promotion", 0.4),
                ("better deal", 0.3),
                ("you have won", 0.5),
                ("claim your reward", 0.5),
            ]),
        );

        categories.insert(
            "payment_pressure".to_string(),
            phrase_table(&[
                ("order completed", 0.4),
                ("payment pending", 0.4),
                ("urgent payment", 0.6),
                ("receive payment", 0.4),
                ("release your payment", 0.5),
                ("refund processing", 0.5),
                ("additional fee", 0.5),
            ]),
        );

        Self {
            match_mode: MatchMode::WordBoundary,
            categories,
        }
    }
}

impl Default for UrlConfig {
    fn default() -> Self {
        let mut protected_brands = BTreeMap::new();
        protected_brands.insert("fiverr".to_string(), strings(&["fiverr.com"]));
        protected_brands.insert("paypal".to_string(), strings(&["paypal.com", "paypal.me"]));
        protected_brands.insert("payoneer".to_string(), strings(&["payoneer.com"]));
        protected_brands.insert("upwork".to_string(), strings(&["upwork.com"]));

        Self {
            suspicious_tlds: strings(&[
                "tk", "ml", "ga", "cf", "gq", "zip", "review", "country", "kim", "science",
                "work", "party", "gdn", "stream", "download",
            ]),
            protected_brands,
            max_subdomain_dots: 2,
            weights: UrlWeights::default(),
        }
    }
}

impl Default for UrlWeights {
    fn default() -> Self {
        Self {
            ip_literal: 0.5,
            suspicious_tld: 0.4,
            deceptive_subdomain: 0.45,
            obfuscation: 0.5,
        }
    }
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            platform_name: "Fiverr".to_string(),
            platform_domains: strings(&["fiverr.com"]),
            identity_claims: strings(&[
                "fiverr support",
                "fiverr team",
                "fiverr security",
                "fiverr trust",
                "fiverr payments",
                "fiverr customer",
                "fiverr admin",
                "official fiverr",
                "from fiverr",
            ]),
            impersonation_display_names: strings(&[
                r"support\s*team",
                r"security\s*team",
                r"verification\s*team",
                r"payments?\s*team",
                r"trust\s*(and|&)\s*safety",
                r"customer\s*(service|care)",
                r"\bfiverr\b",
            ]),
            suspicious_sender_patterns: strings(&[
                r"^\d+@",
                r"[a-zA-Z0-9]+\d{4,}@",
                r"security[_-]?alert",
                r"account[_-]?verify",
                r"support[_-]?\d+",
                r"fiverr[._-]?support\d*@",
                r"fiverr[._-]?security@",
                r"fiverr[._-]?payment@",
                r"fiverr[._-]?verify@",
                r"fiverr[._-]?team@",
                r"admin[._-]?fiverr@",
                r"support[._-]?team[._-]?\d*@",
                r"verification[._-]?team@",
                r"payment[._-]?support@",
                r"account[._-]?security@",
            ]),
            weights: HeaderWeights::default(),
        }
    }
}

impl Default for HeaderWeights {
    fn default() -> Self {
        Self {
            domain_mismatch: 0.5,
            reply_to_mismatch: 0.4,
            missing_authentication: 0.3,
            authentication_failure: 0.5,
            display_name_impersonation: 0.5,
            suspicious_sender: 0.3,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            normalization_constant: 1.5,
            medium_threshold: 0.4,
            high_threshold: 0.7,
        }
    }
}

impl DetectionConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: DetectionConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_yaml_string()?)?;
        Ok(())
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject tables that would make scores meaningless: negative or
    /// non-finite weights, blank entries, and inconsistent thresholds.
    /// Pattern compilation is checked when the analyzers are built.
    pub fn validate(&self) -> Result<()> {
        for (category, phrases) in &self.keywords.categories {
            if category.trim().is_empty() {
                return Err(ConfigError::EmptyEntry("keyword category name".to_string()));
            }
            for (phrase, weight) in phrases {
                if phrase.trim().is_empty() {
                    return Err(ConfigError::EmptyEntry(format!(
                        "keyword category '{}'",
                        category
                    )));
                }
                check_weight(&format!("keywords.{}.{}", category, phrase), *weight)?;
            }
        }

        if self.urls.suspicious_tlds.iter().any(|t| t.trim_start_matches('.').trim().is_empty()) {
            return Err(ConfigError::EmptyEntry("urls.suspicious_tlds".to_string()));
        }
        for (brand, domains) in &self.urls.protected_brands {
            if brand.trim().is_empty() || domains.iter().any(|d| d.trim().is_empty()) {
                return Err(ConfigError::EmptyEntry("urls.protected_brands".to_string()));
            }
        }
        let url_weights = &self.urls.weights;
        check_weight("urls.weights.ip_literal", url_weights.ip_literal)?;
        check_weight("urls.weights.suspicious_tld", url_weights.suspicious_tld)?;
        check_weight(
            "urls.weights.deceptive_subdomain",
            url_weights.deceptive_subdomain,
        )?;
        check_weight("urls.weights.obfuscation", url_weights.obfuscation)?;

        if self.headers.platform_domains.iter().any(|d| d.trim().is_empty()) {
            return Err(ConfigError::EmptyEntry("headers.platform_domains".to_string()));
        }
        if self.headers.identity_claims.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::EmptyEntry("headers.identity_claims".to_string()));
        }
        let header_weights = &self.headers.weights;
        check_weight("headers.weights.domain_mismatch", header_weights.domain_mismatch)?;
        check_weight(
            "headers.weights.reply_to_mismatch",
            header_weights.reply_to_mismatch,
        )?;
        check_weight(
            "headers.weights.missing_authentication",
            header_weights.missing_authentication,
        )?;
        check_weight(
            "headers.weights.authentication_failure",
            header_weights.authentication_failure,
        )?;
        check_weight(
            "headers.weights.display_name_impersonation",
            header_weights.display_name_impersonation,
        )?;
        check_weight(
            "headers.weights.suspicious_sender",
            header_weights.suspicious_sender,
        )?;

        let scoring = &self.scoring;
        if !scoring.normalization_constant.is_finite() || scoring.normalization_constant <= 0.0 {
            return Err(ConfigError::InvalidNormalization(
                scoring.normalization_constant,
            ));
        }
        let thresholds_ok = scoring.medium_threshold.is_finite()
            && scoring.high_threshold.is_finite()
            && scoring.medium_threshold > 0.0
            && scoring.medium_threshold < scoring.high_threshold
            && scoring.high_threshold <= 1.0;
        if !thresholds_ok {
            return Err(ConfigError::InvalidThreshold {
                medium: scoring.medium_threshold,
                high: scoring.high_threshold,
            });
        }

        Ok(())
    }

    pub fn keyword_count(&self) -> usize {
        self.keywords.categories.values().map(|p| p.len()).sum()
    }
}

fn check_weight(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeight {
            field: field.to_string(),
            value,
        })
    }
}
