//! Error types for configuration loading.

use thiserror::Error;

/// Primary error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required credential was absent or blank.
    #[error("{variable} environment variable is not set.")]
    MissingApiKey {
        /// Name of the environment variable that was consulted.
        variable: &'static str,
    },
    /// The API endpoint override was not an absolute URL.
    #[error("invalid {variable} '{value}'")]
    InvalidApiUrl {
        /// Name of the environment variable that was consulted.
        variable: &'static str,
        /// Offending value.
        value: String,
        /// Underlying parse error.
        source: url::ParseError,
    },
    /// The timeout override was not a positive integer.
    #[error("invalid {variable} '{value}': {reason}")]
    InvalidTimeout {
        /// Name of the environment variable that was consulted.
        variable: &'static str,
        /// Offending value.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
