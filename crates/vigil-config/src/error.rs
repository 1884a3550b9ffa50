//! Configuration errors.

use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the config file failed.
    #[error("config file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid YAML or uses an unknown alert type.
    #[error("config parse failed: {0}")]
    Yaml(#[from] serde_yml::Error),

    /// Missed-block band boundaries are not monotonic.
    #[error("validator '{validator}': invalid missed-block bands: {reason}")]
    InvalidBands {
        /// Validator name from configuration.
        validator: String,
        /// What is wrong with the boundaries.
        reason: String,
    },

    /// A writeback referenced a validator that is not configured.
    #[error("unknown validator: {0}")]
    UnknownValidator(String),
}
