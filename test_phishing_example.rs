#![allow(clippy::uninlined_format_args)]

use phishscan::{DetectionConfig, Headers, PhishingDetector, Source};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Testing the fake Fiverr payment-verification message...");

    let message = r#"
    URGENT: Fiverr Payment Issue Detected!

    Dear Seller,

    We have detected an issue with your recent payment. To prevent any delays, please verify your account immediately
    by clicking here: http://fiverr-secure-payments.tk/verify

    Additionally, you can expedite the process by contacting our support team on WhatsApp: +1234567890
    or make a direct payment through our secure Bitcoin wallet: 1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa

    If you don't confirm within 24 hours, your pending payments will be cancelled.

    Best regards,
    Fiverr Support Team
    "#;

    let mut headers = Headers::new();
    headers.insert("From", "fiverr-support-team@fiverr-secure-payments.tk");
    headers.insert("Reply-To", "support-team@payment-verify.ml");
    headers.insert("Subject", "Urgent: Fiverr Payment Verification Required");

    let detector = PhishingDetector::new(DetectionConfig::default())?;
    let verdict = detector.analyze(message, Some(&headers));

    println!();
    println!("Phishing Detection Results:");
    println!("{}", "-".repeat(50));
    println!("Risk Level: {}", verdict.risk_level);
    println!(
        "Overall Risk Score: {:.2} (raw {:.2})",
        verdict.score, verdict.raw_score
    );

    for (title, source) in [
        ("Detected Keywords", Source::Keyword),
        ("Suspicious URLs", Source::Url),
        ("Header Issues", Source::Header),
    ] {
        println!();
        println!("{}:", title);
        for finding in verdict.findings.iter().filter(|f| f.source == source) {
            println!("- [{}] {} ({:.2})", finding.category, finding.description, finding.weight);
        }
    }

    println!();
    println!("Recommendation: {}", verdict.recommended_action);

    Ok(())
}
