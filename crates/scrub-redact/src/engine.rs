//! Main redaction engine.
//!
//! The Redactor normalizes a captured payload, applies the policy's masking
//! rules to a private copy, keeps registered identifiers consistent between
//! keys and text, and hands back something that is always printable.

use crate::error::RedactionIssue;
use crate::mask::MaskPolicy;
use crate::normalize::normalize;
use crate::registry::{IdentifierMatcher, IdentifierRegistry};
use crate::render::render_tree;
use crate::tree::{for_each_string_mut, Mapping, NodeKind, Payload, Tree};
use crate::RedactionPolicy;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Deepest container nesting the engine walks into.
pub const MAX_DEPTH: usize = 256;

static REDACTION_ENABLED: AtomicBool = AtomicBool::new(true);

/// Turn redaction on or off for the whole process.
///
/// While off, payloads are still normalized and rendered but come back
/// unmasked, with [`Redacted::applied`] set to `false`.
pub fn set_redaction_enabled(enabled: bool) {
    REDACTION_ENABLED.store(enabled, Ordering::SeqCst);
}

/// Returns whether redaction is currently applied.
pub fn redaction_enabled() -> bool {
    REDACTION_ENABLED.load(Ordering::SeqCst)
}

/// Result of a redaction operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Redacted {
    /// The redacted (or, if disabled, merely normalized) payload.
    pub output: Payload,

    /// Whether masking was applied at all.
    pub applied: bool,

    /// Problems met along the way; the output is best-effort if non-empty.
    pub issues: Vec<RedactionIssue>,
}

impl Redacted {
    /// Render the output canonically.
    pub fn render(&self) -> String {
        match &self.output {
            Payload::Tree(tree) => render_tree(tree),
            Payload::Text(text) => text.clone(),
            Payload::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Masking was applied and nothing went wrong.
    pub fn is_clean(&self) -> bool {
        self.applied && self.issues.is_empty()
    }
}

/// The main redaction engine.
#[derive(Debug)]
pub struct Redactor {
    /// The redaction policy.
    policy: RedactionPolicy,

    /// Lowercased field name → policy.
    rules: HashMap<String, MaskPolicy>,

    /// Identifiers shared with every other holder of the same registry.
    registry: Arc<IdentifierRegistry>,
}

impl Redactor {
    /// Create an engine with its own identifier registry.
    pub fn new(policy: RedactionPolicy) -> Self {
        let registry = Arc::new(IdentifierRegistry::new(policy.registry_capacity));
        Self::with_registry(policy, registry)
    }

    /// Create an engine that shares an existing registry.
    pub fn with_registry(policy: RedactionPolicy, registry: Arc<IdentifierRegistry>) -> Self {
        let rules = policy.rule_table();
        Self {
            policy,
            rules,
            registry,
        }
    }

    /// Get a reference to the policy.
    pub fn policy(&self) -> &RedactionPolicy {
        &self.policy
    }

    /// Get the identifier registry.
    pub fn registry(&self) -> &Arc<IdentifierRegistry> {
        &self.registry
    }

    /// Forget every harvested identifier.
    pub fn reset_registry(&self) {
        self.registry.reset();
    }

    /// Mask registered identifiers appearing as whole words in free text.
    pub fn mask_known_identifiers(&self, text: &str) -> String {
        self.registry.mask_known_identifiers(text)
    }

    /// Redact a payload.
    ///
    /// The input is never modified. `prefix` labels any warnings so they
    /// can be matched to the log entry they belong to.
    pub fn redact(&self, payload: &Payload, prefix: &str) -> Redacted {
        let normalized = normalize(payload.clone());

        if !redaction_enabled() {
            tracing::warn!(prefix = %prefix, "data is not redacted of sensitive data");
            return Redacted {
                output: normalized,
                applied: false,
                issues: Vec::new(),
            };
        }

        let mut issues = Vec::new();
        let output = match normalized {
            Payload::Text(text) => Payload::Text(self.mask_known_identifiers(&text)),
            Payload::Tree(mut tree) => {
                if !NodeKind::of(&tree).is_structured() {
                    tracing::debug!(
                        prefix = %prefix,
                        kind = %NodeKind::of(&tree),
                        "redacting a bare scalar"
                    );
                }
                issues = self.run_passes(&mut tree);
                Payload::Tree(tree)
            }
            Payload::Bytes(bytes) => Payload::Bytes(bytes),
        };

        for issue in &issues {
            tracing::warn!(prefix = %prefix, issue = %issue, "redaction incomplete");
        }

        Redacted {
            output,
            applied: true,
            issues,
        }
    }

    /// Redact an in-memory tree.
    pub fn redact_tree(&self, tree: &Tree, prefix: &str) -> Redacted {
        self.redact(&Payload::Tree(tree.clone()), prefix)
    }

    /// Redact a payload and render the result canonically.
    pub fn redact_to_text(&self, payload: &Payload, prefix: &str) -> String {
        self.redact(payload, prefix).render()
    }

    /// Redact HTTP-style header pairs.
    ///
    /// Each pair goes through the engine as a one-entry mapping, so order
    /// and repeated names survive.
    pub fn redact_headers(
        &self,
        headers: &[(String, String)],
        prefix: &str,
    ) -> Vec<(String, String)> {
        if !redaction_enabled() {
            tracing::warn!(prefix = %prefix, "headers are not redacted of sensitive data");
            return headers.to_vec();
        }

        headers
            .iter()
            .map(|(name, value)| {
                let mut entry = Mapping::new();
                entry.insert(name.clone(), Value::String(value.clone()));
                let mut tree = Value::Object(entry);

                for issue in self.run_passes(&mut tree) {
                    tracing::warn!(prefix = %prefix, issue = %issue, "redaction incomplete");
                }

                match tree {
                    Value::Object(map) => map
                        .into_iter()
                        .next()
                        .map(|(name, value)| (name, scalar_text(value)))
                        .unwrap_or_else(|| (name.clone(), value.clone())),
                    _ => (name.clone(), value.clone()),
                }
            })
            .collect()
    }

    /// Run every pass over `tree` in place.
    fn run_passes(&self, tree: &mut Tree) -> Vec<RedactionIssue> {
        let mut pass = Pass::new(&self.rules);

        let mut found = Vec::new();
        pass.harvest(tree, &self.policy.identifier_source_key, 0, &mut found);
        if !found.is_empty() {
            let added = self.registry.register(found);
            tracing::debug!(added, "registered identifiers");
        }

        for policy in MaskPolicy::ALL {
            pass.mask(tree, policy, 0);
        }

        let matcher = match self.registry.matcher() {
            Ok(matcher) => matcher,
            Err(err) => {
                pass.issues
                    .push(RedactionIssue::MatcherUnavailable(err.to_string()));
                IdentifierMatcher::empty()
            }
        };

        if !matcher.is_empty() {
            pass.rename_keys(tree, &matcher, 0);

            if self.policy.mask_identifiers_in_values {
                let complete = for_each_string_mut(tree, MAX_DEPTH, &mut |s: &mut String| {
                    let masked = match matcher.mask_text(s) {
                        Cow::Owned(masked) => Some(masked),
                        Cow::Borrowed(_) => None,
                    };
                    if let Some(masked) = masked {
                        *s = masked;
                    }
                });
                if !complete {
                    pass.too_deep();
                }
            }
        }

        pass.issues
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(RedactionPolicy::default())
    }
}

/// State for one walk over a tree.
struct Pass<'a> {
    rules: &'a HashMap<String, MaskPolicy>,
    issues: Vec<RedactionIssue>,
    truncated: bool,
}

impl<'a> Pass<'a> {
    fn new(rules: &'a HashMap<String, MaskPolicy>) -> Self {
        Self {
            rules,
            issues: Vec::new(),
            truncated: false,
        }
    }

    fn too_deep(&mut self) {
        if !self.truncated {
            self.truncated = true;
            self.issues
                .push(RedactionIssue::DepthExceeded { limit: MAX_DEPTH });
        }
    }

    /// Collect keys of every `source_key` mapping, at any depth.
    fn harvest(&mut self, node: &Tree, source_key: &str, depth: usize, found: &mut Vec<String>) {
        if depth > MAX_DEPTH {
            self.too_deep();
            return;
        }
        match node {
            Value::Object(map) => {
                if let Some(Value::Object(summary)) = map.get(source_key) {
                    found.extend(summary.keys().cloned());
                }
                for value in map.values() {
                    self.harvest(value, source_key, depth + 1, found);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.harvest(item, source_key, depth + 1, found);
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
    }

    /// Apply `policy` to the value of every key whose rule selects it.
    fn mask(&mut self, node: &mut Tree, policy: MaskPolicy, depth: usize) {
        if depth > MAX_DEPTH {
            self.too_deep();
            return;
        }
        match node {
            Value::Object(map) => {
                for (key, value) in map.iter_mut() {
                    if self.rules.get(&key.to_lowercase()) == Some(&policy) {
                        self.mask_value(key, value, policy, depth);
                    } else {
                        self.mask(value, policy, depth + 1);
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.mask(item, policy, depth + 1);
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
    }

    fn mask_value(&mut self, key: &str, value: &mut Tree, policy: MaskPolicy, depth: usize) {
        let found = NodeKind::of(value);
        match value {
            Value::String(s) => *s = policy.apply(s),
            Value::Null => {}
            Value::Bool(_) | Value::Number(_) => {
                self.issues.push(RedactionIssue::TypeMismatch {
                    key: key.to_string(),
                    policy,
                    found,
                });
                let text = value.to_string();
                *value = Value::String(policy.apply(&text));
            }
            Value::Array(_) | Value::Object(_) => {
                self.issues.push(RedactionIssue::TypeMismatch {
                    key: key.to_string(),
                    policy,
                    found,
                });
                self.mask(value, policy, depth + 1);
            }
        }
    }

    /// Rewrite mapping keys that are registered identifiers.
    fn rename_keys(&mut self, node: &mut Tree, matcher: &IdentifierMatcher, depth: usize) {
        if depth > MAX_DEPTH {
            self.too_deep();
            return;
        }
        match node {
            Value::Object(map) => {
                let entries = std::mem::take(map);
                for (key, mut value) in entries {
                    self.rename_keys(&mut value, matcher, depth + 1);
                    let key = match matcher.substitute_key(&key) {
                        Some(masked) => masked.to_string(),
                        None => key,
                    };
                    map.insert(key, value);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.rename_keys(item, matcher, depth + 1);
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
    }
}

fn scalar_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
