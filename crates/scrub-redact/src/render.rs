//! Canonical text rendering.
//!
//! Layout: four-space indentation, one entry per line, no space after `:`
//! or `,`, empty containers as `{}` / `[]`, mapping keys in insertion order.
//! Output is pure ASCII; anything outside printable ASCII is `\uXXXX`
//! escaped.

use crate::normalize::normalize;
use crate::tree::{Payload, Tree};
use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

const INDENT: &[u8] = b"    ";

/// Render a payload: normalize it, then lay out any tree canonically.
///
/// Text that is not structured comes back unchanged.
pub fn render(payload: &Payload) -> String {
    match normalize(payload.clone()) {
        Payload::Tree(tree) => render_tree(&tree),
        Payload::Text(text) => text,
        Payload::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// Render a tree canonically.
pub fn render_tree(tree: &Tree) -> String {
    match try_render_tree(tree) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(error = %err, "canonical rendering failed; using compact form");
            tree.to_string()
        }
    }
}

fn try_render_tree(tree: &Tree) -> serde_json::Result<String> {
    let mut out = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, CanonicalFormatter::new());
    tree.serialize(&mut ser)?;
    // The formatter only ever emits ASCII.
    String::from_utf8(out)
        .map_err(|err| serde_json::Error::io(io::Error::new(io::ErrorKind::InvalidData, err)))
}

/// Render with a prefix and suffix around the canonical text.
pub fn pretty(payload: &Payload, prefix: &str, suffix: &str) -> String {
    format!("{}{}{}", prefix, render(payload), suffix)
}

/// Render header pairs as `Name: value` lines.
pub fn render_headers(headers: &[(String, String)]) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `serde_json` formatter producing the canonical layout.
#[derive(Debug, Default)]
pub struct CanonicalFormatter {
    current_indent: usize,
    has_value: bool,
}

impl CanonicalFormatter {
    pub fn new() -> Self {
        Self::default()
    }
}

fn indent<W: ?Sized + io::Write>(writer: &mut W, n: usize) -> io::Result<()> {
    for _ in 0..n {
        writer.write_all(INDENT)?;
    }
    Ok(())
}

impl Formatter for CanonicalFormatter {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.current_indent += 1;
        self.has_value = false;
        writer.write_all(b"[")
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.current_indent -= 1;
        if self.has_value {
            writer.write_all(b"\n")?;
            indent(writer, self.current_indent)?;
        }
        writer.write_all(b"]")
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        writer.write_all(if first { b"\n" } else { b",\n" })?;
        indent(writer, self.current_indent)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.current_indent += 1;
        self.has_value = false;
        writer.write_all(b"{")
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.current_indent -= 1;
        if self.has_value {
            writer.write_all(b"\n")?;
            indent(writer, self.current_indent)?;
        }
        writer.write_all(b"}")
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        writer.write_all(if first { b"\n" } else { b",\n" })?;
        indent(writer, self.current_indent)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b":")
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}
