//! Structured logging foundation for scrub.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for log shippers
//!
//! # Usage
//!
//! ```ignore
//! use scrub_core::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config);
//! tracing::info!("ready");
//! ```
//!
//! # Design Notes
//!
//! - stdout is reserved for command payloads (redacted text)
//! - stderr receives all log output (human or JSONL)
//! - Captured payloads only reach the log after redaction; see [`crate::capture`]

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use scrub_redact::Redactor;
use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static REDACTOR: OnceLock<Redactor> = OnceLock::new();

/// Get the process-wide redactor.
///
/// Initializes with the default policy if not already set.
pub fn get_redactor() -> &'static Redactor {
    REDACTOR.get_or_init(Redactor::default)
}

/// Install the process-wide redactor.
///
/// Returns `false` if one was already in place (set earlier, or created by
/// a call to [`get_redactor`]); the existing one is kept.
pub fn set_redactor(redactor: Redactor) -> bool {
    if REDACTOR.set(redactor).is_err() {
        tracing::warn!("redactor already initialized; custom policy ignored for logs");
        return false;
    }
    true
}

/// Directives used when RUST_LOG is not set.
pub fn default_directives(level: LogLevel) -> String {
    format!("scrub={level},scrub_core={level},scrub_redact={level}")
}

/// Initialize the logging subsystem.
///
/// Should be called once at startup; later calls leave the first
/// subscriber in place and return `false`.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config.level)));

    let result = match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .flatten_event(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
        }
    };

    result.is_ok()
}

/// Initialize logging with defaults (for tests and simple cases).
pub fn init_default_logging() -> bool {
    init_logging(&LogConfig::from_env(None, None))
}
