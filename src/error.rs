//! Error types for rule activation and configuration loading.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    /// The activation mechanism handed this rule another rule's configuration.
    #[error("configuration mismatch: expected '{expected}' rule configuration, got '{found}'")]
    ConfigMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("invalid value for '{field}': {message}")]
    InvalidConfig {
        field: &'static str,
        message: String,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
