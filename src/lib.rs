pub mod config;
pub mod detector;
pub mod domain_utils;
pub mod error;
pub mod features;
pub mod message;
pub mod verdict;

pub use config::DetectionConfig;
pub use detector::PhishingDetector;
pub use error::ConfigError;
pub use features::{Analyzer, Finding, Source};
pub use message::{Headers, Message};
pub use verdict::{RecommendedAction, RiskLevel, Verdict};
