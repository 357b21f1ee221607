//! Masking policies.
//!
//! Each policy is a pure `&str -> String` transform. Lengths are counted in
//! characters, not bytes, so multi-byte text keeps its visible shape.

use serde::{Deserialize, Serialize};

/// Literal prefix kept by [`partial_mask`].
pub const BEARER_PREFIX: &str = "Bearer ";

/// Character used by every policy.
pub const MASK_CHAR: char = '*';

/// Policy to apply to a sensitive field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaskPolicy {
    /// Replace every character with `*`.
    FullMask,
    /// Keep the `Bearer ` prefix, then one `*` per ten token characters.
    PartialMask,
    /// Replace every odd-indexed character with `*`.
    AlternateMask,
}

impl MaskPolicy {
    /// All policies, in the order the engine applies them.
    pub const ALL: [MaskPolicy; 3] = [
        MaskPolicy::FullMask,
        MaskPolicy::PartialMask,
        MaskPolicy::AlternateMask,
    ];

    /// Parse a policy from its identifier.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "full-mask" => Some(MaskPolicy::FullMask),
            "partial-mask" => Some(MaskPolicy::PartialMask),
            "alternate-mask" => Some(MaskPolicy::AlternateMask),
            _ => None,
        }
    }

    /// Apply this policy to a value.
    pub fn apply(&self, value: &str) -> String {
        match self {
            MaskPolicy::FullMask => full_mask(value),
            MaskPolicy::PartialMask => partial_mask(value),
            MaskPolicy::AlternateMask => alternate_mask(value),
        }
    }

    /// Returns whether the output has the same character count as the input.
    pub fn preserves_length(&self) -> bool {
        !matches!(self, MaskPolicy::PartialMask)
    }
}

impl std::fmt::Display for MaskPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MaskPolicy::FullMask => "full-mask",
            MaskPolicy::PartialMask => "partial-mask",
            MaskPolicy::AlternateMask => "alternate-mask",
        };
        write!(f, "{}", s)
    }
}

/// Replace the value with an equal-length run of `*`.
pub fn full_mask(value: &str) -> String {
    value.chars().map(|_| MASK_CHAR).collect()
}

/// Mask a bearer token down to a tenth of its length.
///
/// `"Bearer " + token` becomes `"Bearer "` followed by `token.len() / 10`
/// asterisks. A value without the prefix keeps nothing: the whole value is
/// counted as the token.
pub fn partial_mask(value: &str) -> String {
    let (prefix, token) = match value.strip_prefix(BEARER_PREFIX) {
        Some(token) => (BEARER_PREFIX, token),
        None => ("", value),
    };
    let count = token.chars().count() / 10;

    let mut out = String::with_capacity(prefix.len() + count);
    out.push_str(prefix);
    out.extend(std::iter::repeat(MASK_CHAR).take(count));
    out
}

/// Replace every second character (odd positions) with `*`.
pub fn alternate_mask(value: &str) -> String {
    value
        .chars()
        .enumerate()
        .map(|(i, c)| if i % 2 == 0 { c } else { MASK_CHAR })
        .collect()
}
