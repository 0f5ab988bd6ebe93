use thiserror::Error;

/// Errors raised while loading or validating a `DetectionConfig`.
///
/// Message analysis itself never fails; everything here happens once, at
/// construction time.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid weight {value} for {field}")]
    InvalidWeight { field: String, value: f64 },

    #[error("Empty entry in {0}")]
    EmptyEntry(String),

    #[error("Invalid thresholds: medium={medium}, high={high}")]
    InvalidThreshold { medium: f64, high: f64 },

    #[error("Invalid normalization constant: {0}")]
    InvalidNormalization(f64),

    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
