use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading negotiation data or configuration.
///
/// Request negotiation itself never fails; these only surface while reading
/// term records, alias lists, or environment settings.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// A data file could not be read
    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A data file is not valid JSON for the expected records
    #[error("Failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A configuration value could not be interpreted
    #[error("Invalid value for {key}: {value:?}")]
    InvalidConfig { key: &'static str, value: String },
}

/// Result type for negotiation data loading
pub type NegotiationResult<T> = Result<T, NegotiationError>;
