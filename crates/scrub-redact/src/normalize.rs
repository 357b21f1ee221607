//! Normalization of raw captures into trees.
//!
//! Text is tried as strict JSON first, then as JSON with bare `NaN`,
//! `Infinity` and `-Infinity` tokens, and as literal syntax only if both
//! fail to parse. Anything that does not come out as a mapping or a
//! sequence is handed back untouched.

use crate::literal;
use crate::tree::{NodeKind, Payload, Tree};
use serde_json::Value;

/// Non-finite tokens accepted inside JSON text. Longest first.
const NON_FINITE: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

/// Normalize a payload.
///
/// Returns `Payload::Tree` when the input is (or decodes to) a mapping or
/// sequence, otherwise the input itself. A tree that is a bare string is
/// treated as text. Never fails.
pub fn normalize(payload: Payload) -> Payload {
    match payload {
        Payload::Tree(Value::String(text)) | Payload::Text(text) => normalize_text(text),
        Payload::Tree(tree) => Payload::Tree(tree),
        Payload::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => normalize_text(text),
            Err(err) => Payload::Bytes(err.into_bytes()),
        },
    }
}

fn normalize_text(text: String) -> Payload {
    match parse_text(&text) {
        Some(tree) => Payload::Tree(tree),
        None => Payload::Text(text),
    }
}

/// Parse text into a structured tree, if it holds one.
///
/// Non-finite numbers in JSON text become the strings `"NaN"`,
/// `"Infinity"` and `"-Infinity"`, since a tree number is always finite.
pub fn parse_text(text: &str) -> Option<Tree> {
    let parsed = match serde_json::from_str::<Tree>(text) {
        Ok(tree) => tree,
        Err(err) if err.is_syntax() || err.is_eof() => match parse_non_finite_json(text) {
            Some(tree) => tree,
            None => literal::parse(text).ok()?,
        },
        Err(_) => return None,
    };

    if NodeKind::of(&parsed).is_structured() {
        Some(parsed)
    } else {
        None
    }
}

/// Parse UTF-8 bytes into a structured tree, if they hold one.
pub fn parse_bytes(bytes: &[u8]) -> Option<Tree> {
    std::str::from_utf8(bytes).ok().and_then(parse_text)
}

fn parse_non_finite_json(text: &str) -> Option<Tree> {
    let quoted = quote_non_finite(text)?;
    serde_json::from_str(&quoted).ok()
}

/// Quote bare non-finite tokens found outside JSON strings.
///
/// Returns `None` when there is nothing to quote.
fn quote_non_finite(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len() + 8);
    let mut rest = text;
    let mut in_string = false;
    let mut escaped = false;
    let mut quoted_any = false;

    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = NON_FINITE.iter().find(|t| rest.starts_with(**t)) {
            let starts_word = !out.chars().last().is_some_and(is_word_char);
            let ends_word = !rest[token.len()..].chars().next().is_some_and(is_word_char);
            if starts_word && ends_word {
                out.push('"');
                out.push_str(token);
                out.push('"');
                rest = &rest[token.len()..];
                quoted_any = true;
                continue;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    quoted_any.then_some(out)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
