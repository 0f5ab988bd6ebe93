//! End-to-end behaviour of the detector with the default configuration.

use phishscan::features::category;
use phishscan::{DetectionConfig, Headers, PhishingDetector, RecommendedAction, RiskLevel, Source};
use serde_json::json;

fn detector() -> PhishingDetector {
    PhishingDetector::new(DetectionConfig::default()).unwrap()
}

fn headers(pairs: &[(&str, &str)]) -> Headers {
    pairs.iter().copied().collect()
}

const CORPUS: &[&str] = &[
    "",
    "Hi! Thanks for the order, the first draft is attached.",
    "Hi! I can offer you a better deal if you pay through PayPal directly. Contact me: example@payment.com",
    "URGENT: Your order #12345 is completed. Click here to receive payment: http://fiverr-payments.tk/claim",
    "Fiverr Support Team: Your account needs verification. Contact: whatsapp +1234567890",
    "Login here http://203.0.113.9/fiverr/login and verify your account within 24 hours",
    "Special promotion! Bonus offer for top sellers, pay with bitcoin wallet or western union",
    "see https://docs.example.com/guide and https://www.fiverr.com/inbox",
];

// =============================================================================
// Documented scenarios
// =============================================================================

#[test]
fn empty_input_is_clean() {
    let verdict = detector().analyze("", None);

    assert_eq!(verdict.score, 0.0);
    assert_eq!(verdict.raw_score, 0.0);
    assert_eq!(verdict.risk_level, RiskLevel::Low);
    assert_eq!(verdict.recommended_action, RecommendedAction::Deliver);
    assert!(verdict.findings.is_empty());
}

#[test]
fn whitespace_input_with_empty_headers_is_clean() {
    let empty = Headers::new();
    let verdict = detector().analyze("  \n\t ", Some(&empty));

    assert_eq!(verdict.score, 0.0);
    assert!(verdict.is_clean());
}

#[test]
fn external_payment_solicitation() {
    let verdict = detector().analyze(
        "Hi! I can offer you a better deal if you pay through PayPal directly. Contact me: example@payment.com",
        None,
    );

    assert!(verdict.has_category("external_payment"));
    assert!(matches!(
        verdict.risk_level,
        RiskLevel::Medium | RiskLevel::High
    ));
    // an email address is not a URL
    assert!(verdict.findings.iter().all(|f| f.source != Source::Url));
}

#[test]
fn urgent_payment_claim_with_free_tld_link() {
    let verdict = detector().analyze(
        "URGENT: Your order #12345 is completed. Click here to receive payment: http://fiverr-payments.tk/claim",
        None,
    );

    assert!(verdict
        .findings
        .iter()
        .any(|f| f.source == Source::Url && f.has_indicator(category::SUSPICIOUS_TLD)));
    assert!(verdict.has_category("urgent_language"));
    assert_eq!(verdict.risk_level, RiskLevel::High);
    assert_eq!(verdict.recommended_action, RecommendedAction::BlockAndReport);
}

#[test]
fn support_impersonation_from_external_domain() {
    let headers = headers(&[("from", "support@external-domain.com")]);
    let verdict = detector().analyze(
        "Fiverr Support Team: Your account needs verification. Contact: whatsapp +1234567890",
        Some(&headers),
    );

    assert!(verdict.has_category("impersonation"));
    assert!(verdict.has_category(category::DOMAIN_MISMATCH));
    assert_eq!(verdict.risk_level, RiskLevel::High);
}

#[test]
fn full_phishing_message_with_headers() {
    let body = "URGENT: Fiverr Payment Issue Detected!\n\n\
                Please verify your account immediately by clicking here: \
                http://fiverr-secure-payments.tk/verify\n\
                Contact our support team on WhatsApp: +1234567890 or make a direct \
                payment through our secure Bitcoin wallet.\n\
                Best regards,\nFiverr Support Team";
    let headers = headers(&[
        ("From", "fiverr-support-team@fiverr-secure-payments.tk"),
        ("Reply-To", "support-team@payment-verify.ml"),
        ("Subject", "Urgent: Fiverr Payment Verification Required"),
    ]);
    let verdict = detector().analyze(body, Some(&headers));

    assert_eq!(verdict.score, 1.0);
    assert_eq!(verdict.risk_level, RiskLevel::High);
    assert!(verdict.has_category(category::REPLY_TO_MISMATCH));
    assert!(verdict.has_category(category::SUSPICIOUS_SENDER));
    assert!(verdict.has_category(category::MISSING_AUTHENTICATION));
}

#[test]
fn legitimate_order_update_is_low() {
    let verdict = detector().analyze(
        "Hi Sarah, thanks for the order! I've uploaded the revised logo files to the order page: \
         https://www.fiverr.com/orders/FO12345. Let me know if you need any changes.",
        Some(&headers(&[("From", "Designer <designer@gmail.com>")])),
    );

    assert_eq!(verdict.risk_level, RiskLevel::Low);
    assert!(verdict.is_clean());
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn score_is_bounded_and_tier_consistent() {
    let detector = detector();
    let with_headers = headers(&[
        ("From", "\"Fiverr Support Team\" <alerts@gig-helpdesk.ml>"),
        ("Reply-To", "collect@payments-now.tk"),
    ]);

    for text in CORPUS {
        for hdrs in [None, Some(&with_headers)] {
            let verdict = detector.analyze(text, hdrs);
            let score = verdict.score;

            assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
            assert_eq!(score >= 0.7, verdict.risk_level == RiskLevel::High);
            assert_eq!(
                (0.4..0.7).contains(&score),
                verdict.risk_level == RiskLevel::Medium
            );
            assert_eq!(score < 0.4, verdict.risk_level == RiskLevel::Low);
            assert_eq!(
                verdict.recommended_action,
                verdict.risk_level.recommended_action()
            );
        }
    }
}

#[test]
fn analysis_is_idempotent() {
    let detector = detector();
    let hdrs = headers(&[("from", "support@external-domain.com")]);

    for text in CORPUS {
        assert_eq!(detector.analyze(text, Some(&hdrs)), detector.analyze(text, Some(&hdrs)));
    }

    // separately constructed detectors agree as well
    let other = PhishingDetector::new(DetectionConfig::default()).unwrap();
    for text in CORPUS {
        assert_eq!(detector.analyze(text, None), other.analyze(text, None));
    }
}

#[test]
fn adding_red_flags_never_lowers_the_score() {
    let detector = detector();
    let base = "Hello, I can start on your project tomorrow.";

    let additions = [
        " It is urgent.",
        " Message me on telegram.",
        " Details: http://198.51.100.4/offer",
        " Details: https://promo.fiverr-bonus.gq/x",
        " https://example.com/r?u=https%3A%2F%2Fevil.example",
    ];

    let base_verdict = detector.analyze(base, None);
    for addition in additions {
        let text = format!("{}{}", base, addition);
        let verdict = detector.analyze(&text, None);
        assert!(
            verdict.score >= base_verdict.score,
            "adding {:?} lowered the score",
            addition
        );
        assert!(verdict.raw_score > base_verdict.raw_score);
    }

    let plain = headers(&[("From", "seller@designstudio.com")]);
    let flagged = headers(&[
        ("From", "seller@designstudio.com"),
        ("Reply-To", "pay@elsewhere.tk"),
    ]);
    let without = detector.analyze(base, Some(&plain));
    let with = detector.analyze(base, Some(&flagged));
    assert!(with.raw_score > without.raw_score);
    assert!(with.score >= without.score);
}

#[test]
fn missing_headers_are_not_penalized() {
    let detector = detector();
    let text = "Fiverr Support Team: please confirm your identity";
    let empty = Headers::new();

    let none = detector.analyze(text, None);
    let blank = detector.analyze(text, Some(&empty));

    assert_eq!(none, blank);
    assert!(none.findings.iter().all(|f| f.source != Source::Header));
}

#[test]
fn findings_are_ordered_by_source() {
    let hdrs = headers(&[
        ("From", "\"Fiverr Support Team\" <alerts@gig-helpdesk.com>"),
        ("Reply-To", "x@other.org"),
    ]);
    let verdict = detector().analyze(
        "Urgent: verify your account at http://192.0.2.1/login or via telegram",
        Some(&hdrs),
    );

    let rank = |s: Source| match s {
        Source::Keyword => 0,
        Source::Url => 1,
        Source::Header => 2,
    };
    let ranks: Vec<u8> = verdict.findings.iter().map(|f| rank(f.source)).collect();

    assert!(ranks.contains(&0) && ranks.contains(&1) && ranks.contains(&2));
    assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn loosely_typed_headers_do_not_break_analysis() {
    let hdrs = Headers::from_json(&json!({
        "From": ["support@external-domain.com"],
        "Authentication-Results": 42,
        "Reply-To": null,
        "X-Meta": {"nested": true}
    }));
    let verdict = detector().analyze("Fiverr Support Team here", Some(&hdrs));

    assert!(verdict.has_category(category::DOMAIN_MISMATCH));
    assert!(verdict.has_category(category::MISSING_AUTHENTICATION));
    assert!(!verdict.has_category(category::REPLY_TO_MISMATCH));
}

#[test]
fn concurrent_calls_match_sequential_results() {
    let detector = detector();
    let expected: Vec<_> = CORPUS.iter().map(|t| detector.analyze(t, None)).collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    CORPUS
                        .iter()
                        .map(|t| detector.analyze(t, None))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn alternate_configuration_changes_behaviour() {
    let yaml = r#"
keywords:
  categories:
    external_payment:
      "venmo": 0.9
headers:
  platform_name: "Etsy"
  platform_domains: ["etsy.com"]
  identity_claims: ["etsy support"]
scoring:
  normalization_constant: 1.0
"#;
    let config = DetectionConfig::from_yaml_str(yaml).unwrap();
    let detector = PhishingDetector::new(config).unwrap();

    let verdict = detector.analyze("Just send it by Venmo please", None);
    assert!(verdict.has_category("external_payment"));
    assert_eq!(verdict.risk_level, RiskLevel::High);

    // default phrases are gone
    let verdict = detector.analyze("pay through paypal", None);
    assert!(verdict.is_clean());

    let hdrs = headers(&[("from", "help@etsy-helpdesk.net")]);
    let verdict = detector.analyze("Etsy Support: your shop is suspended", Some(&hdrs));
    assert!(verdict.has_category(category::DOMAIN_MISMATCH));
}
