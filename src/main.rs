use anyhow::{bail, Context};
use clap::{Arg, ArgMatches, Command};
use log::LevelFilter;
use phishscan::message::split_raw_message;
use phishscan::{DetectionConfig, Headers, PhishingDetector, RiskLevel, Verdict};
use std::path::Path;
use std::process;

fn main() {
    let matches = Command::new("phishscan")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Scores marketplace messages for phishing and off-platform payment scams")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Detection configuration file path")
                .default_value("phishscan.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the configuration and compile every pattern")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("test-message")
                .long("test-message")
                .value_name("FILE")
                .help("Analyze a raw message file (headers, blank line, body)")
                .action(clap::ArgAction::Set)
                .conflicts_with("text"),
        )
        .arg(
            Arg::new("text")
                .long("text")
                .value_name("TEXT")
                .help("Analyze a literal message body")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("headers-json")
                .long("headers-json")
                .value_name("FILE")
                .help("JSON object of headers to analyze alongside --text")
                .requires("text")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the verdict as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging of every finding")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Err(e) = run(&matches) {
        eprintln!("❌ {e:#}");
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        DetectionConfig::default()
            .to_file(generate_path)
            .with_context(|| format!("writing configuration to {generate_path}"))?;
        println!("Default configuration written to: {generate_path}");
        println!("Please edit the configuration file to suit your needs.");
        return Ok(());
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("phishscan.yaml");
    let config = load_config(config_path)?;

    if matches.get_flag("test-config") {
        return test_config(config);
    }

    let detector = PhishingDetector::new(config).context("building detector")?;
    let as_json = matches.get_flag("json");

    if let Some(message_file) = matches.get_one::<String>("test-message") {
        let raw = std::fs::read_to_string(message_file)
            .with_context(|| format!("reading message file {message_file}"))?;
        let (headers, body) = split_raw_message(&raw);
        let headers = (!headers.is_empty()).then_some(headers);
        let verdict = detector.analyze(&body, headers.as_ref());
        return emit(&verdict, &body, headers.as_ref(), as_json);
    }

    if let Some(text) = matches.get_one::<String>("text") {
        let headers = match matches.get_one::<String>("headers-json") {
            Some(path) => Some(load_headers(path)?),
            None => None,
        };
        let verdict = detector.analyze(text, headers.as_ref());
        return emit(&verdict, text, headers.as_ref(), as_json);
    }

    bail!("nothing to analyze: pass --test-message FILE or --text TEXT")
}

fn load_config(path: &str) -> anyhow::Result<DetectionConfig> {
    if Path::new(path).exists() {
        DetectionConfig::from_file(path).with_context(|| format!("loading configuration {path}"))
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(DetectionConfig::default())
    }
}

fn load_headers(path: &str) -> anyhow::Result<Headers> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading headers file {path}"))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("parsing headers JSON {path}"))?;
    Ok(Headers::from_json(&value))
}

fn test_config(config: DetectionConfig) -> anyhow::Result<()> {
    println!("🔍 Testing configuration...");
    println!();
    println!("Keyword categories: {}", config.keywords.categories.len());
    for (category, phrases) in &config.keywords.categories {
        println!("  {}: {} phrases", category, phrases.len());
    }
    println!("Suspicious TLDs: {}", config.urls.suspicious_tlds.len());
    println!("Protected brands: {}", config.urls.protected_brands.len());
    println!(
        "Platform: {} ({})",
        config.headers.platform_name,
        config.headers.platform_domains.join(", ")
    );
    println!(
        "Scoring: normalization {}, medium >= {}, high >= {}",
        config.scoring.normalization_constant,
        config.scoring.medium_threshold,
        config.scoring.high_threshold
    );

    let detector = PhishingDetector::new(config).context("configuration validation failed")?;
    println!(
        "All patterns compiled successfully ({} analyzers).",
        detector.analyzer_names().len()
    );
    println!("✅ Configuration is valid");
    Ok(())
}

fn emit(
    verdict: &Verdict,
    body: &str,
    headers: Option<&Headers>,
    as_json: bool,
) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(verdict)?);
    } else {
        print_report(verdict, body, headers);
    }
    Ok(())
}

fn print_report(verdict: &Verdict, body: &str, headers: Option<&Headers>) {
    println!("📧 Message Details:");
    match headers {
        Some(headers) => {
            for name in ["from", "reply-to", "subject"] {
                if let Some(value) = headers.get(name) {
                    println!("   {}: {}", name, truncate_string(value, 100));
                }
            }
        }
        None => println!("   (no headers)"),
    }
    println!("   Body: {}", truncate_string(body.trim(), 100));
    println!();

    let icon = match verdict.risk_level {
        RiskLevel::High => "🚨",
        RiskLevel::Medium => "⚠️",
        RiskLevel::Low => "✅",
    };
    println!(
        "{} Risk level: {} (score {:.2}, raw {:.2})",
        icon, verdict.risk_level, verdict.score, verdict.raw_score
    );

    if verdict.findings.is_empty() {
        println!("   No suspicious indicators found");
    } else {
        println!("   Findings:");
        for finding in &verdict.findings {
            println!(
                "   • [{}] {} (+{:.2})",
                finding.category, finding.description, finding.weight
            );
        }
    }
    println!();
    println!("💡 Recommended action: {}", verdict.recommended_action);
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
