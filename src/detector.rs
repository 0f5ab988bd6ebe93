use crate::config::{DetectionConfig, ScoringConfig};
use crate::error::Result;
use crate::features::{Analyzer, KeywordAnalyzer, LinkAnalyzer, SenderAlignmentAnalyzer};
use crate::message::{Headers, Message};
use crate::verdict::{RiskLevel, Verdict};

/// Entry point of the engine: runs every analyzer over a message and folds
/// their findings into one `Verdict`.
///
/// Holds only configuration compiled at construction, so one instance can
/// be shared across threads and called concurrently without locking.
pub struct PhishingDetector {
    scoring: ScoringConfig,
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl PhishingDetector {
    /// Validate the configuration and compile every analyzer. This is the
    /// only fallible step; analysis itself cannot fail.
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;

        let analyzers: Vec<Box<dyn Analyzer>> = vec![
            Box::new(KeywordAnalyzer::new(&config.keywords)?),
            Box::new(LinkAnalyzer::new(&config.urls)?),
            Box::new(SenderAlignmentAnalyzer::new(&config.headers)?),
        ];

        log::debug!(
            "Phishing detector ready: {} keyword phrases, {} suspicious TLDs, normalization {}",
            config.keyword_count(),
            config.urls.suspicious_tlds.len(),
            config.scoring.normalization_constant
        );

        Ok(Self {
            scoring: config.scoring,
            analyzers,
        })
    }

    /// Append an analyzer. Its findings are reported after the built-in
    /// keyword, URL and header findings.
    pub fn with_analyzer(mut self, analyzer: Box<dyn Analyzer>) -> Self {
        self.analyzers.push(analyzer);
        self
    }

    pub fn analyzer_names(&self) -> Vec<&str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    pub fn analyze(&self, text: &str, headers: Option<&Headers>) -> Verdict {
        self.analyze_message(&Message::new(text, headers))
    }

    pub fn analyze_message(&self, message: &Message<'_>) -> Verdict {
        let mut findings = Vec::new();
        for analyzer in &self.analyzers {
            let found = analyzer.analyze(message);
            log::trace!("{} produced {} findings", analyzer.name(), found.len());
            findings.extend(found);
        }

        let raw_score: f64 = findings.iter().map(|f| f.weight).sum();
        let score = self.normalize(raw_score);
        let risk_level = RiskLevel::from_score(
            score,
            self.scoring.medium_threshold,
            self.scoring.high_threshold,
        );
        let recommended_action = risk_level.recommended_action();

        if risk_level != RiskLevel::Low {
            log::info!(
                "{} risk message: score {:.2} from {} findings",
                risk_level,
                score,
                findings.len()
            );
        }

        Verdict {
            score,
            raw_score,
            risk_level,
            findings,
            recommended_action,
        }
    }

    /// Saturating map from raw weight sum onto [0.0, 1.0].
    fn normalize(&self, raw_score: f64) -> f64 {
        (raw_score / self.scoring.normalization_constant).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::features::{Finding, Source};
    use crate::verdict::RecommendedAction;
    use std::collections::BTreeMap;

    struct FixedAnalyzer {
        weights: Vec<f64>,
    }

    impl Analyzer for FixedAnalyzer {
        fn analyze(&self, _message: &Message<'_>) -> Vec<Finding> {
            self.weights
                .iter()
                .map(|w| Finding::new(Source::Keyword, "fixed", *w, "fixed weight"))
                .collect()
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    /// Built-in analyzers with nothing to match, so only the fixed
    /// analyzer contributes.
    fn detector_with_weights(weights: Vec<f64>, normalization_constant: f64) -> PhishingDetector {
        let mut config = DetectionConfig::default();
        config.keywords.categories = BTreeMap::new();
        config.scoring.normalization_constant = normalization_constant;
        PhishingDetector::new(config)
            .unwrap()
            .with_analyzer(Box::new(FixedAnalyzer { weights }))
    }

    #[test]
    fn test_detector_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PhishingDetector>();
    }

    #[test]
    fn test_analyzer_order() {
        let detector = detector_with_weights(vec![], 1.0);
        assert_eq!(
            detector.analyzer_names(),
            vec!["keyword_analyzer", "link_analyzer", "sender_alignment", "fixed"]
        );
    }

    #[test]
    fn test_normalization_saturates() {
        let detector = detector_with_weights(vec![0.9, 0.9, 0.9, 0.9], 1.5);
        let verdict = detector.analyze("anything", None);

        assert!((verdict.raw_score - 3.6).abs() < 1e-9);
        assert_eq!(verdict.score, 1.0);
        assert_eq!(verdict.risk_level, RiskLevel::High);
        assert_eq!(verdict.recommended_action, RecommendedAction::BlockAndReport);
    }

    #[test]
    fn test_normalization_constant_is_tunable() {
        let verdict = detector_with_weights(vec![0.6], 1.0).analyze("x", None);
        assert!((verdict.score - 0.6).abs() < 1e-9);
        assert_eq!(verdict.risk_level, RiskLevel::Medium);

        let verdict = detector_with_weights(vec![0.6], 2.0).analyze("x", None);
        assert!((verdict.score - 0.3).abs() < 1e-9);
        assert_eq!(verdict.risk_level, RiskLevel::Low);
        assert_eq!(verdict.recommended_action, RecommendedAction::Deliver);
    }

    #[test]
    fn test_threshold_edges() {
        let verdict = detector_with_weights(vec![0.4], 1.0).analyze("x", None);
        assert_eq!(verdict.risk_level, RiskLevel::Medium);
        assert_eq!(verdict.recommended_action, RecommendedAction::FlagForReview);

        let verdict = detector_with_weights(vec![0.7], 1.0).analyze("x", None);
        assert_eq!(verdict.risk_level, RiskLevel::High);

        let verdict = detector_with_weights(vec![0.39], 1.0).analyze("x", None);
        assert_eq!(verdict.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_custom_thresholds() {
        let mut config = DetectionConfig::default();
        config.keywords.categories = BTreeMap::new();
        config.scoring.normalization_constant = 1.0;
        config.scoring.medium_threshold = 0.2;
        config.scoring.high_threshold = 0.5;
        let detector = PhishingDetector::new(config)
            .unwrap()
            .with_analyzer(Box::new(FixedAnalyzer { weights: vec![0.3] }));

        assert_eq!(detector.analyze("x", None).risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_invalid_config_fails_at_construction() {
        let mut config = DetectionConfig::default();
        config.scoring.normalization_constant = -1.0;
        assert!(matches!(
            PhishingDetector::new(config),
            Err(ConfigError::InvalidNormalization(_))
        ));

        let mut config = DetectionConfig::default();
        config.headers.impersonation_display_names = vec!["(unclosed".to_string()];
        assert!(matches!(
            PhishingDetector::new(config),
            Err(ConfigError::Pattern { .. })
        ));
    }
}
