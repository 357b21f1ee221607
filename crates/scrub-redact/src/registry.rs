//! Registry of sensitive identifiers.
//!
//! Identifiers harvested from one payload (account or card ids listed under
//! a `summary` mapping) are remembered so that later occurrences as mapping
//! keys or inside free text are masked the same way. The registry is shared
//! between threads; each redaction pass works from an immutable
//! [`IdentifierMatcher`] snapshot taken after harvesting.

use crate::mask::alternate_mask;
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Upper bound on the compiled size of the identifier pattern.
const MATCHER_SIZE_LIMIT: usize = 64 * 1024 * 1024;

/// Bounded, thread-safe set of identifiers in registration order.
#[derive(Debug)]
pub struct IdentifierRegistry {
    capacity: usize,
    state: Mutex<RegistryState>,
}

#[derive(Debug, Default)]
struct RegistryState {
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl IdentifierRegistry {
    /// Create a registry holding at most `capacity` identifiers.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(RegistryState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // A panic elsewhere cannot leave the set half-updated.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register identifiers; returns how many were new.
    ///
    /// Empty strings are ignored. When full, the oldest identifiers are
    /// evicted first.
    pub fn register<I, S>(&self, identifiers: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.lock();
        let mut added = 0;
        for id in identifiers {
            let id = id.into();
            if id.is_empty() || state.members.contains(&id) {
                continue;
            }
            while state.order.len() >= self.capacity {
                if let Some(evicted) = state.order.pop_front() {
                    state.members.remove(&evicted);
                    tracing::debug!("identifier registry full; evicted oldest entry");
                }
            }
            state.members.insert(id.clone());
            state.order.push_back(id);
            added += 1;
        }
        added
    }

    /// Returns whether the identifier is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.lock().members.contains(id)
    }

    /// Number of registered identifiers.
    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    /// Returns whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of identifiers kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget every identifier.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.order.clear();
        state.members.clear();
    }

    /// Copy of the identifiers in registration order.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().order.iter().cloned().collect()
    }

    /// Build a matcher over the current identifiers.
    pub fn matcher(&self) -> Result<IdentifierMatcher, regex::Error> {
        IdentifierMatcher::new(self.snapshot())
    }

    /// Replace whole-word occurrences of registered identifiers in `text`
    /// with their alternate-mask form.
    ///
    /// If the identifiers cannot be compiled into a pattern the text is
    /// returned unchanged and a warning is logged.
    pub fn mask_known_identifiers(&self, text: &str) -> String {
        match self.matcher() {
            Ok(matcher) => matcher.mask_text(text).into_owned(),
            Err(err) => {
                tracing::warn!(error = %err, "identifier matcher unavailable; text left unmasked");
                text.to_string()
            }
        }
    }
}

impl Default for IdentifierRegistry {
    fn default() -> Self {
        Self::new(crate::policy::DEFAULT_REGISTRY_CAPACITY)
    }
}

/// Immutable view of the registry used for one redaction pass.
#[derive(Debug, Clone)]
pub struct IdentifierMatcher {
    pattern: Option<Regex>,
    substitutions: HashMap<String, String>,
}

impl IdentifierMatcher {
    /// Compile a matcher for the given identifiers.
    pub fn new(identifiers: Vec<String>) -> Result<Self, regex::Error> {
        let identifiers: Vec<String> = identifiers.into_iter().filter(|id| !id.is_empty()).collect();

        let pattern = if identifiers.is_empty() {
            None
        } else {
            let alternation = identifiers
                .iter()
                .map(|id| regex::escape(id))
                .collect::<Vec<_>>()
                .join("|");
            Some(
                RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
                    .size_limit(MATCHER_SIZE_LIMIT)
                    .build()?,
            )
        };

        let substitutions = identifiers
            .into_iter()
            .map(|id| {
                let masked = alternate_mask(&id);
                (id, masked)
            })
            .collect();

        Ok(Self {
            pattern,
            substitutions,
        })
    }

    /// A matcher that never matches.
    pub fn empty() -> Self {
        Self {
            pattern: None,
            substitutions: HashMap::new(),
        }
    }

    /// Returns whether there is nothing to match.
    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }

    /// Masked form of a mapping key, if the key is a registered identifier.
    pub fn substitute_key(&self, key: &str) -> Option<&str> {
        self.substitutions.get(key).map(String::as_str)
    }

    /// Mask whole-word occurrences of identifiers in free text.
    pub fn mask_text<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match &self.pattern {
            Some(pattern) => pattern.replace_all(text, |caps: &regex::Captures| {
                alternate_mask(&caps[0])
            }),
            None => Cow::Borrowed(text),
        }
    }
}
