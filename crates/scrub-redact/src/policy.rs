//! Redaction policy configuration.
//!
//! Defines which field names trigger which masking policy, where sensitive
//! identifiers are harvested from, and how the identifier registry is bounded.

use crate::error::{RedactionError, Result};
use crate::mask::MaskPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Schema version for the policy file.
pub const POLICY_SCHEMA_VERSION: &str = "1.0.0";

/// Key whose mapping value lists account/card identifiers.
pub const DEFAULT_IDENTIFIER_SOURCE_KEY: &str = "summary";

/// Default bound on the identifier registry.
pub const DEFAULT_REGISTRY_CAPACITY: usize = 4096;

/// Redaction policy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionPolicy {
    /// Schema version.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Mapping key whose (mapping) value holds identifiers to register.
    #[serde(default = "default_identifier_source_key")]
    pub identifier_source_key: String,

    /// Maximum number of identifiers remembered; oldest are evicted first.
    #[serde(default = "default_registry_capacity")]
    pub registry_capacity: usize,

    /// Also mask registered identifiers inside string values, not just keys.
    #[serde(default = "default_true")]
    pub mask_identifiers_in_values: bool,

    /// Field name → masking policy, matched case-insensitively.
    #[serde(default = "default_rules")]
    pub rules: Vec<MaskingRule>,
}

fn default_schema_version() -> String {
    POLICY_SCHEMA_VERSION.to_string()
}

fn default_identifier_source_key() -> String {
    DEFAULT_IDENTIFIER_SOURCE_KEY.to_string()
}

fn default_registry_capacity() -> usize {
    DEFAULT_REGISTRY_CAPACITY
}

fn default_true() -> bool {
    true
}

fn default_rules() -> Vec<MaskingRule> {
    vec![
        MaskingRule::new("identity", MaskPolicy::FullMask),
        MaskingRule::new("emailAddress", MaskPolicy::FullMask),
        MaskingRule::new("email", MaskPolicy::FullMask),
        MaskingRule::new("bearer", MaskPolicy::FullMask),
        MaskingRule::new("Authorization", MaskPolicy::PartialMask),
        MaskingRule::new("username", MaskPolicy::AlternateMask),
        MaskingRule::new("cardName", MaskPolicy::AlternateMask),
        MaskingRule::new("cardId", MaskPolicy::AlternateMask),
    ]
}

/// A single field-name rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskingRule {
    /// Field name as written in payloads.
    pub field: String,

    /// Policy applied to the field's value.
    pub policy: MaskPolicy,
}

impl MaskingRule {
    /// Create a rule.
    pub fn new(field: &str, policy: MaskPolicy) -> Self {
        Self {
            field: field.to_string(),
            policy,
        }
    }
}

impl RedactionPolicy {
    /// Create a new policy with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load policy from a `.json` or `.toml` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let policy: RedactionPolicy = match PolicyFormat::from_path(path)? {
            PolicyFormat::Json => serde_json::from_str(&content)?,
            PolicyFormat::Toml => toml::from_str(&content)?,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Save policy to a `.json` or `.toml` file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match PolicyFormat::from_path(path)? {
            PolicyFormat::Json => serde_json::to_string_pretty(self)?,
            PolicyFormat::Toml => toml::to_string_pretty(self)?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the policy is usable.
    pub fn validate(&self) -> Result<()> {
        if let Some(rule) = self.rules.iter().find(|r| r.field.trim().is_empty()) {
            return Err(RedactionError::PolicyError(format!(
                "rule for {} has an empty field name",
                rule.policy
            )));
        }
        if self.identifier_source_key.is_empty() {
            return Err(RedactionError::PolicyError(
                "identifier_source_key must not be empty".to_string(),
            ));
        }
        if self.registry_capacity == 0 {
            return Err(RedactionError::PolicyError(
                "registry_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the policy for a field name, if any rule matches.
    pub fn policy_for(&self, field: &str) -> Option<MaskPolicy> {
        let wanted = field.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.field.to_lowercase() == wanted)
            .map(|rule| rule.policy)
    }

    /// Set the policy for a field name, replacing any existing rule for it.
    pub fn set_policy(&mut self, field: &str, policy: MaskPolicy) {
        let wanted = field.to_lowercase();
        match self
            .rules
            .iter_mut()
            .find(|rule| rule.field.to_lowercase() == wanted)
        {
            Some(rule) => rule.policy = policy,
            None => self.rules.push(MaskingRule::new(field, policy)),
        }
    }

    /// Build a lowercase lookup table; the first rule for a field wins.
    pub(crate) fn rule_table(&self) -> HashMap<String, MaskPolicy> {
        let mut table = HashMap::with_capacity(self.rules.len());
        for rule in &self.rules {
            table.entry(rule.field.to_lowercase()).or_insert(rule.policy);
        }
        table
    }
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self {
            schema_version: POLICY_SCHEMA_VERSION.to_string(),
            identifier_source_key: DEFAULT_IDENTIFIER_SOURCE_KEY.to_string(),
            registry_capacity: DEFAULT_REGISTRY_CAPACITY,
            mask_identifiers_in_values: true,
            rules: default_rules(),
        }
    }
}

enum PolicyFormat {
    Json,
    Toml,
}

impl PolicyFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(PolicyFormat::Json),
            Some("toml") => Ok(PolicyFormat::Toml),
            _ => Err(RedactionError::UnsupportedFormat(path.display().to_string())),
        }
    }
}
