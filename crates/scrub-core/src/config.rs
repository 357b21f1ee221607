//! Configuration loading and resolution.
//!
//! Resolution order: CLI path → `SCRUB_CONFIG` → `$SCRUB_CONFIG_DIR/config.toml`
//! → `<user config dir>/scrub/config.toml` → built-in defaults.
//!
//! ```toml
//! [redaction]
//! enabled = true
//! policy_file = "policy.json"   # relative to this file
//!
//! [policy]
//! registry_capacity = 1024
//!
//! [log]
//! level = "debug"
//! format = "jsonl"
//! ```

use crate::logging::LogConfig;
use scrub_redact::{RedactionError, RedactionPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Explicit config file path.
pub const ENV_CONFIG_PATH: &str = "SCRUB_CONFIG";

/// Directory holding `config.toml`.
pub const ENV_CONFIG_DIR: &str = "SCRUB_CONFIG_DIR";

/// Turns redaction on or off regardless of the file.
pub const ENV_REDACT: &str = "SCRUB_REDACT";

/// Standard config file name.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Application name for the user config directory.
const APP_NAME: &str = "scrub";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid TOML in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Cannot load policy file {path}: {source}")]
    PolicyError {
        path: PathBuf,
        #[source]
        source: RedactionError,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(String),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in the user config directory.
    UserConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::UserConfig => write!(f, "user config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// `[redaction]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionSettings {
    /// Whether masking is applied at all.
    pub enabled: bool,

    /// Policy file replacing the inline `[policy]` table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_file: Option<PathBuf>,
}

impl Default for RedactionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            policy_file: None,
        }
    }
}

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrubConfig {
    pub redaction: RedactionSettings,
    pub policy: RedactionPolicy,
    pub log: LogConfig,
}

impl ScrubConfig {
    /// Parse from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Configuration resolution options.
#[derive(Debug, Default, Clone)]
pub struct ConfigOptions {
    /// Explicit config file path (highest priority).
    pub config_path: Option<PathBuf>,

    /// Force redaction off.
    pub no_redact: bool,
}

/// Resolved configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The file contents (or defaults).
    pub config: ScrubConfig,

    /// The policy in effect, from `policy_file` or the inline table.
    pub policy: RedactionPolicy,

    /// Whether redaction ends up enabled after env and CLI overrides.
    pub redaction_enabled: bool,

    /// Path to the config file (None if using defaults).
    pub path: Option<PathBuf>,

    /// Where the config file came from.
    pub source: ConfigSource,

    /// Path to the policy file, if one was used.
    pub policy_path: Option<PathBuf>,
}

/// Load configuration with the standard resolution order.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    load_config_with(options, |name| std::env::var(name).ok(), dirs::config_dir())
}

/// Load configuration with an explicit variable lookup and user config dir.
pub fn load_config_with<F>(
    options: &ConfigOptions,
    lookup: F,
    user_config_dir: Option<PathBuf>,
) -> Result<ResolvedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let (path, source) =
        resolve_config_path(options.config_path.as_deref(), &lookup, user_config_dir)?;

    let config = match &path {
        Some(path) => read_config_file(path)?,
        None => ScrubConfig::default(),
    };

    let (policy, policy_path) = match &config.redaction.policy_file {
        Some(file) => {
            let policy_path = relative_to_config(file, path.as_deref());
            let policy = RedactionPolicy::load(&policy_path).map_err(|source| {
                ConfigError::PolicyError {
                    path: policy_path.clone(),
                    source,
                }
            })?;
            (policy, Some(policy_path))
        }
        None => (config.policy.clone(), None),
    };

    policy
        .validate()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    let mut redaction_enabled = config.redaction.enabled;
    if let Some(val) = lookup(ENV_REDACT) {
        match parse_switch(&val) {
            Some(enabled) => redaction_enabled = enabled,
            None => {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be one of 0/1, false/true, off/on; got '{}'",
                    ENV_REDACT, val
                )))
            }
        }
    }
    if options.no_redact {
        redaction_enabled = false;
    }

    Ok(ResolvedConfig {
        config,
        policy,
        redaction_enabled,
        path,
        source,
        policy_path,
    })
}

/// Find the config file to use.
///
/// Paths named on the command line or in `SCRUB_CONFIG` must exist; the
/// directory-based locations are only used if the file is there.
pub fn resolve_config_path<F>(
    cli_path: Option<&Path>,
    lookup: &F,
    user_config_dir: Option<PathBuf>,
) -> Result<(Option<PathBuf>, ConfigSource), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // 1. CLI argument
    if let Some(path) = cli_path {
        return existing(path.to_path_buf(), ConfigSource::CliArgument);
    }

    // 2. Environment variable (direct path)
    if let Some(path) = lookup(ENV_CONFIG_PATH).filter(|p| !p.is_empty()) {
        return existing(PathBuf::from(path), ConfigSource::Environment);
    }

    // 3. Environment variable (config dir)
    if let Some(dir) = lookup(ENV_CONFIG_DIR).filter(|p| !p.is_empty()) {
        let path = PathBuf::from(dir).join(CONFIG_FILENAME);
        if path.exists() {
            return Ok((Some(path), ConfigSource::Environment));
        }
    }

    // 4. User config directory
    if let Some(dir) = user_config_dir {
        let path = dir.join(APP_NAME).join(CONFIG_FILENAME);
        if path.exists() {
            return Ok((Some(path), ConfigSource::UserConfig));
        }
    }

    // 5. Built-in defaults
    Ok((None, ConfigSource::BuiltinDefault))
}

fn existing(
    path: PathBuf,
    source: ConfigSource,
) -> Result<(Option<PathBuf>, ConfigSource), ConfigError> {
    if path.exists() {
        Ok((Some(path), source))
    } else {
        Err(ConfigError::NotFound { path })
    }
}

fn read_config_file(path: &Path) -> Result<ScrubConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    ScrubConfig::from_toml(&content).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

fn relative_to_config(file: &Path, config_path: Option<&Path>) -> PathBuf {
    if file.is_absolute() {
        return file.to_path_buf();
    }
    match config_path.and_then(Path::parent) {
        Some(dir) => dir.join(file),
        None => file.to_path_buf(),
    }
}

/// Parse an on/off switch value.
pub fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
