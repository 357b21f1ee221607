//! Error types for the redaction engine.

use crate::mask::MaskPolicy;
use crate::tree::NodeKind;
use thiserror::Error;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Errors raised while loading or validating a redaction policy.
///
/// Redacting a payload never returns one of these; problems found during a
/// redaction pass are reported as [`RedactionIssue`]s instead.
#[derive(Error, Debug)]
pub enum RedactionError {
    /// The policy is structurally valid but semantically unusable.
    #[error("policy error: {0}")]
    PolicyError(String),

    /// The policy file has an extension we do not know how to read.
    #[error("unsupported policy format: {0}")]
    UnsupportedFormat(String),

    /// I/O error during policy file operations.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("toml error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("toml error: {0}")]
    TomlSerError(#[from] toml::ser::Error),
}

/// A non-fatal problem met during a redaction pass.
///
/// The pass keeps going after recording one of these; the payload is
/// returned redacted as far as the engine could take it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RedactionIssue {
    /// A masked field held something other than a string.
    #[error("field '{key}' expected a string for {policy}, found {found}")]
    TypeMismatch {
        key: String,
        policy: MaskPolicy,
        found: NodeKind,
    },

    /// The tree nests deeper than the engine is willing to walk.
    #[error("tree nesting exceeds {limit} levels; deeper nodes left unredacted")]
    DepthExceeded { limit: usize },

    /// Registered identifiers could not be compiled into a matcher.
    #[error("identifier matcher unavailable: {0}")]
    MatcherUnavailable(String),
}
