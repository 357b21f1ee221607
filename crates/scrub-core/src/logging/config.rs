//! Logging configuration.
//!
//! Supports configuration via:
//! - The `[log]` table of the config file
//! - Environment variables (SCRUB_LOG, RUST_LOG, SCRUB_LOG_FORMAT)
//! - CLI flags (--log-level, --log-format)

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

/// Environment variable for the log level.
pub const ENV_LOG_LEVEL: &str = "SCRUB_LOG";

/// Environment variable for the log format.
pub const ENV_LOG_FORMAT: &str = "SCRUB_LOG_FORMAT";

/// Where capture entries and warnings go on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Readable lines (default)
    #[default]
    Human,

    /// One JSON object per event
    Jsonl,
}

/// Minimum level that reaches the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,

    /// Captured payloads are logged at this level
    Debug,

    #[default]
    Info,

    /// Redaction warnings are logged at this level
    Warn,

    Error,

    Off,
}

/// Case-insensitive parse through the clap value names.
fn parse_value<T: ValueEnum>(s: &str, what: &str) -> Result<T, String> {
    T::from_str(s, true).map_err(|_| format!("unknown log {}: {}", what, s))
}

fn write_value<T: ValueEnum>(value: &T, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match value.to_possible_value() {
        Some(possible) => f.write_str(possible.get_name()),
        None => Ok(()),
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_value(s, "format")
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_value(self, f)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_value(s, "level")
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_value(self, f)
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Output format.
    pub format: LogFormat,
    /// Minimum log level.
    pub level: LogLevel,
    /// Whether to include timestamps in human output.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Create config from environment and CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        LogConfig::default().overridden(cli_level, cli_format)
    }

    /// Apply environment variables, then CLI overrides, on top of `self`.
    pub fn overridden(self, cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        self.overridden_with(|name| std::env::var(name).ok(), cli_level, cli_format)
    }

    /// Same as [`overridden`](Self::overridden) with an explicit variable lookup.
    pub fn overridden_with<F>(
        mut self,
        lookup: F,
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // SCRUB_LOG takes precedence over RUST_LOG
        if let Some(val) = lookup(ENV_LOG_LEVEL) {
            if let Ok(level) = val.parse::<LogLevel>() {
                self.level = level;
            }
        } else if let Some(val) = lookup("RUST_LOG") {
            // Loudest level named anywhere in the directives.
            let named = [LogLevel::Trace, LogLevel::Debug, LogLevel::Warn, LogLevel::Error]
                .into_iter()
                .find(|level| val.contains(level.to_string().as_str()));
            if let Some(level) = named {
                self.level = level;
            }
        }

        if let Some(val) = lookup(ENV_LOG_FORMAT) {
            if let Ok(format) = val.parse::<LogFormat>() {
                self.format = format;
            }
        }

        if let Some(level) = cli_level {
            self.level = level;
        }
        if let Some(format) = cli_format {
            self.format = format;
        }

        self
    }
}
