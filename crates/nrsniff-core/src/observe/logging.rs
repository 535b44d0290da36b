//! Structured logging setup.
//!
//! Thin wrapper over `tracing-subscriber`: pick a level, a format and an
//! optional module filter, then call [`init_logging`] once at startup.
//! `RUST_LOG` overrides the configured level when set.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One event per line.
    #[default]
    Compact,
    /// Multi-line, human-oriented.
    Pretty,
    /// Machine-readable JSON.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level to emit.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Optional module filter, e.g. `"nrsniff_core=debug,nrsniff_rx=trace"`.
    pub filter: Option<String>,
    /// Include file and line of the emitting call site.
    pub source_location: bool,
}

impl LogConfig {
    /// Verbose development preset.
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            source_location: true,
            ..Default::default()
        }
    }

    /// Errors only.
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            format: LogFormat::Compact,
            ..Default::default()
        }
    }
}

/// Initialize the global subscriber. Call once at startup; later calls
/// are silently ignored.
pub fn init_logging(config: &LogConfig) {
    let filter = match &config.filter {
        Some(custom) => EnvFilter::try_new(custom)
            .unwrap_or_else(|_| EnvFilter::new(config.level.to_string())),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.to_string())),
    };

    let result = match config.format {
        LogFormat::Compact => tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .compact()
                    .with_file(config.source_location)
                    .with_line_number(config.source_location),
            ),
        ),
        LogFormat::Pretty => tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .pretty()
                    .with_file(config.source_location)
                    .with_line_number(config.source_location),
            ),
        ),
        LogFormat::Json => tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .json()
                    .with_file(config.source_location)
                    .with_line_number(config.source_location),
            ),
        ),
    };

    // A subscriber set earlier (by the application or another library)
    // wins; that is not an error worth surfacing here.
    let _ = result;
}
