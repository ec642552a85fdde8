//! Logging initialisation and configuration.
//!
//! # Design
//! - Single entry point that installs a stderr `fmt` subscriber.
//! - `RUST_LOG` wins over the configured level so operators can dig in
//!   without new flags.
//! - Stdout is left to command output.

use std::io;

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;

use crate::error::{Result, TelemetryError};

/// Default logging level when `RUST_LOG` is not provided.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

static BUILD_VERSION: OnceCell<String> = OnceCell::new();

/// Configure and install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the level cannot be parsed or the subscriber cannot be
/// installed (for example, because another subscriber is already set).
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = config
        .level
        .parse::<LevelFilter>()
        .map_err(|_| TelemetryError::InvalidLevel {
            level: config.level.to_string(),
        })?;
    let _ = BUILD_VERSION.set(config.version.to_string());

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let builder = fmt::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    installed.map_err(|source| TelemetryError::SubscriberInstall { source })
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Fallback level directive (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: &'a str,
    /// Output format.
    pub format: LogFormat,
    /// Version recorded for diagnostics.
    pub version: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::default(),
            version: "dev",
        }
    }
}

impl<'a> LoggingConfig<'a> {
    /// Pick a level from a `-v` repetition count.
    #[must_use]
    pub const fn with_verbosity(mut self, occurrences: u8) -> Self {
        self.level = match occurrences {
            0 => DEFAULT_LOG_LEVEL,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        self
    }

    /// Override the output format.
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Record the running version.
    #[must_use]
    pub const fn with_version(mut self, version: &'a str) -> Self {
        self.version = version;
        self
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line human-readable records.
    #[default]
    Compact,
    /// Multi-line human-readable records.
    Pretty,
    /// Newline-delimited JSON.
    Json,
}

/// Access the version recorded during logging initialisation.
#[must_use]
pub fn build_version() -> &'static str {
    BUILD_VERSION.get().map_or("dev", String::as_str)
}
