//! Masking and canonical rendering of captured request/response payloads.
//!
//! Captures come in as bytes, text, or already-decoded trees. The engine
//! normalizes them into a tree where possible, masks sensitive fields on a
//! private copy, and renders the result in a stable, diff-friendly layout.
//!
//! # Key Features
//!
//! - **Field-aware masking**: fields are matched by name (case-insensitive)
//!   and masked fully, partially (bearer tokens), or alternately.
//! - **Identifier consistency**: ids listed under a `summary` mapping are
//!   remembered and masked wherever they show up later, as keys or in text.
//! - **Lenient normalization**: strict JSON first, then literal syntax with
//!   single quotes, tuples and `True`/`False`/`None`.
//! - **Canonical rendering**: four-space indentation, no padding after
//!   separators, pure-ASCII output.
//!
//! # Example
//!
//! ```
//! use scrub_redact::{Payload, Redactor};
//!
//! let redactor = Redactor::default();
//! let text = redactor.redact_to_text(&Payload::from(r#"{"email":"me@example.com"}"#), "BODY");
//! assert_eq!(text, "{\n    \"email\":\"**************\"\n}");
//! ```

pub mod engine;
pub mod error;
pub mod literal;
pub mod mask;
pub mod normalize;
pub mod policy;
pub mod registry;
pub mod render;
pub mod tree;

pub use engine::{redaction_enabled, set_redaction_enabled, Redacted, Redactor, MAX_DEPTH};
pub use error::{RedactionError, RedactionIssue, Result};
pub use mask::{alternate_mask, full_mask, partial_mask, MaskPolicy};
pub use normalize::{normalize, parse_text};
pub use policy::{MaskingRule, RedactionPolicy};
pub use registry::{IdentifierMatcher, IdentifierRegistry};
pub use render::{pretty, render, render_headers, render_tree};
pub use tree::{Mapping, NodeKind, Payload, Tree};
