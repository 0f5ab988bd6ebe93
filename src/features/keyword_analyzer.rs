use super::{Analyzer, Finding, Source};
use crate::config::{KeywordConfig, MatchMode};
use crate::error::{ConfigError, Result};
use crate::message::Message;
use regex::{Regex, RegexBuilder};

struct PhraseMatcher {
    category: String,
    phrase: String,
    weight: f64,
    regex: Regex,
}

/// Scans message text against the categorized phrase table.
///
/// Matching is case-insensitive and, in the default word-boundary mode, a
/// phrase only matches when it starts and ends on a word boundary, so
/// "urgent" does not fire inside "insurgent". Any run of whitespace in a
/// configured phrase matches any run of whitespace in the text.
///
/// Each distinct phrase found yields one finding carrying that phrase's
/// weight; several phrases from the same category all count.
pub struct KeywordAnalyzer {
    matchers: Vec<PhraseMatcher>,
}

impl KeywordAnalyzer {
    pub fn new(config: &KeywordConfig) -> Result<Self> {
        let mut matchers = Vec::new();

        for (category, phrases) in &config.categories {
            for (phrase, weight) in phrases {
                if phrase.trim().is_empty() {
                    return Err(ConfigError::EmptyEntry(format!(
                        "keyword category '{}'",
                        category
                    )));
                }

                let pattern = phrase_pattern(phrase, config.match_mode);
                let regex = RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| ConfigError::Pattern {
                        pattern: pattern.clone(),
                        source,
                    })?;

                matchers.push(PhraseMatcher {
                    category: category.clone(),
                    phrase: phrase.trim().to_string(),
                    weight: *weight,
                    regex,
                });
            }
        }

        log::trace!("Keyword analyzer compiled {} phrases", matchers.len());
        Ok(Self { matchers })
    }
}

pub(crate) fn phrase_pattern(phrase: &str, mode: MatchMode) -> String {
    let phrase = phrase.trim();
    let body = phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");

    match mode {
        MatchMode::Substring => body,
        MatchMode::WordBoundary => {
            let is_word = |c: char| c.is_alphanumeric() || c == '_';
            let start = if phrase.chars().next().is_some_and(is_word) {
                r"\b"
            } else {
                ""
            };
            let end = if phrase.chars().last().is_some_and(is_word) {
                r"\b"
            } else {
                ""
            };
            format!("{}{}{}", start, body, end)
        }
    }
}

impl Analyzer for KeywordAnalyzer {
    fn analyze(&self, message: &Message<'_>) -> Vec<Finding> {
        let text = message.body;
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut findings = Vec::new();
        for matcher in &self.matchers {
            let occurrences = matcher.regex.find_iter(text).count();
            if occurrences == 0 {
                continue;
            }

            let mut description = format!(
                "Suspicious phrase '{}' ({})",
                matcher.phrase,
                matcher.category.replace('_', " ")
            );
            if occurrences > 1 {
                description.push_str(&format!(", {} occurrences", occurrences));
            }

            log::debug!("Keyword match: {}", description);
            findings.push(
                Finding::new(
                    Source::Keyword,
                    matcher.category.clone(),
                    matcher.weight,
                    description,
                )
                .with_indicator(matcher.phrase.clone()),
            );
        }

        findings
    }

    fn name(&self) -> &str {
        "keyword_analyzer"
    }
}
