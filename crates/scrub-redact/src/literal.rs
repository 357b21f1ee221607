//! Permissive parser for literal-syntax trees.
//!
//! Accepts the text a generic "print this value" produces for nested
//! dicts/lists: single- or double-quoted strings, `True`/`False`/`None`,
//! tuples, trailing commas. It is only consulted after strict JSON parsing
//! has failed.

use crate::tree::{Mapping, Tree};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};
use thiserror::Error;

/// Nesting limit, matching the recursion limit of `serde_json`.
pub const MAX_NESTING: usize = 128;

static RE_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?(0|[1-9](_?[0-9])*)$").unwrap());

static RE_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?([0-9](_?[0-9])*)?(\.([0-9](_?[0-9])*)?)?([eE][+-]?[0-9]+)?$").unwrap()
});

/// Why a text is not a literal-syntax tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("invalid escape sequence at offset {offset}")]
    InvalidEscape { offset: usize },

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unknown name '{0}'")]
    UnknownName(String),

    #[error("mapping key at offset {offset} is not a scalar")]
    UnhashableKey { offset: usize },

    #[error("nesting deeper than {MAX_NESTING} levels")]
    TooDeep,

    #[error("trailing characters at offset {offset}")]
    TrailingCharacters { offset: usize },
}

/// Parse a literal-syntax value.
pub fn parse(text: &str) -> Result<Tree, LiteralError> {
    let mut parser = Parser::new(text);
    parser.skip_ws();
    let value = parser.value(0)?;
    parser.skip_ws();
    match parser.peek() {
        None => Ok(value),
        Some(_) => Err(LiteralError::TrailingCharacters { offset: parser.pos }),
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(ahead)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, wanted: char) -> Result<(), LiteralError> {
        match self.bump() {
            Some(c) if c == wanted => Ok(()),
            Some(c) => Err(LiteralError::UnexpectedChar {
                found: c,
                offset: self.pos - c.len_utf8(),
            }),
            None => Err(LiteralError::UnexpectedEnd),
        }
    }

    fn unexpected(&self) -> LiteralError {
        match self.peek() {
            Some(found) => LiteralError::UnexpectedChar {
                found,
                offset: self.pos,
            },
            None => LiteralError::UnexpectedEnd,
        }
    }

    fn value(&mut self, depth: usize) -> Result<Tree, LiteralError> {
        if depth > MAX_NESTING {
            return Err(LiteralError::TooDeep);
        }
        match self.peek() {
            Some('{') => self.mapping(depth),
            Some('[') => self.sequence(depth, '[', ']'),
            Some('(') => self.sequence(depth, '(', ')'),
            Some('\'') | Some('"') => self.strings(),
            Some(c) if c.is_ascii_digit() || c == '+' || c == '-' || c == '.' => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.name_or_prefixed_string(),
            _ => Err(self.unexpected()),
        }
    }

    fn mapping(&mut self, depth: usize) -> Result<Tree, LiteralError> {
        self.expect('{')?;
        let mut map = Mapping::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(map));
            }

            let key_offset = self.pos;
            let key = key_text(self.value(depth + 1)?, key_offset)?;
            self.skip_ws();
            self.expect(':')?;
            self.skip_ws();
            let value = self.value(depth + 1)?;
            map.insert(key, value);

            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(Value::Object(map)),
                Some(found) => {
                    return Err(LiteralError::UnexpectedChar {
                        found,
                        offset: self.pos - found.len_utf8(),
                    })
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
    }

    fn sequence(&mut self, depth: usize, open: char, close: char) -> Result<Tree, LiteralError> {
        self.expect(open)?;
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.bump();
                break;
            }

            items.push(self.value(depth + 1)?);
            self.skip_ws();
            match self.bump() {
                Some(',') => trailing_comma = true,
                Some(c) if c == close => {
                    trailing_comma = false;
                    break;
                }
                Some(found) => {
                    return Err(LiteralError::UnexpectedChar {
                        found,
                        offset: self.pos - found.len_utf8(),
                    })
                }
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }

        // `(x)` is a parenthesized value, `(x,)` a one-element tuple.
        if open == '(' && items.len() == 1 && !trailing_comma {
            return Ok(items.remove(0));
        }
        Ok(Value::Array(items))
    }

    fn name_or_prefixed_string(&mut self) -> Result<Tree, LiteralError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let name = &self.src[start..self.pos];

        if matches!(self.peek(), Some('\'') | Some('"')) {
            let lowered = name.to_ascii_lowercase();
            if lowered == "u" || lowered == "r" {
                self.pos = start;
                return self.strings();
            }
        }

        match name {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            other => Err(LiteralError::UnknownName(other.to_string())),
        }
    }

    /// One or more adjacent string literals, concatenated.
    fn strings(&mut self) -> Result<Tree, LiteralError> {
        let mut out = self.string()?;
        loop {
            let save = self.pos;
            self.skip_ws();
            let next_is_string = match self.peek() {
                Some('\'') | Some('"') => true,
                Some(c) if c == 'u' || c == 'U' || c == 'r' || c == 'R' => {
                    matches!(self.peek_at(1), Some('\'') | Some('"'))
                }
                _ => false,
            };
            if !next_is_string {
                self.pos = save;
                return Ok(Value::String(out));
            }
            out.push_str(&self.string()?);
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let mut raw = false;
        while let Some(c) = self.peek() {
            match c {
                'r' | 'R' => raw = true,
                'u' | 'U' => {}
                _ => break,
            }
            self.bump();
        }

        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            Some(found) => {
                return Err(LiteralError::UnexpectedChar {
                    found,
                    offset: self.pos - found.len_utf8(),
                })
            }
            None => return Err(LiteralError::UnexpectedEnd),
        };
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        let mut out = String::new();
        loop {
            let c = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
            if c == quote {
                if !triple {
                    return Ok(out);
                }
                if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                    self.bump();
                    self.bump();
                    return Ok(out);
                }
                out.push(c);
            } else if c == '\\' {
                if raw {
                    out.push(c);
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                } else {
                    self.escape(&mut out)?;
                }
            } else if c == '\n' && !triple {
                return Err(LiteralError::UnexpectedChar {
                    found: c,
                    offset: self.pos - 1,
                });
            } else {
                out.push(c);
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let offset = self.pos - 1;
        let c = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
        match c {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0b}'),
            'x' => out.push(self.hex_char(2, offset)?),
            'u' => out.push(self.hex_char(4, offset)?),
            'U' => out.push(self.hex_char(8, offset)?),
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).ok_or(LiteralError::InvalidEscape { offset })?);
            }
            // Unknown escapes keep their backslash.
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_char(&mut self, digits: usize, offset: usize) -> Result<char, LiteralError> {
        let start = self.pos;
        for _ in 0..digits {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => {}
                _ => return Err(LiteralError::InvalidEscape { offset }),
            }
        }
        u32::from_str_radix(&self.src[start..self.pos], 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or(LiteralError::InvalidEscape { offset })
    }

    fn number(&mut self) -> Result<Tree, LiteralError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let in_exponent = matches!(c, '+' | '-')
                && matches!(self.src[..self.pos].chars().last(), Some('e') | Some('E'));
            if c.is_ascii_digit()
                || matches!(c, '.' | '_' | 'e' | 'E')
                || in_exponent
                || self.pos == start
            {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let text = &self.src[start..self.pos];
        let cleaned = text.replace('_', "");

        if RE_INT.is_match(text) {
            let digits = cleaned.trim_start_matches('+');
            if let Ok(n) = digits.parse::<i64>() {
                return Ok(Value::Number(n.into()));
            }
            if let Ok(n) = digits.parse::<u64>() {
                return Ok(Value::Number(n.into()));
            }
            // Wider than 64 bits: keep every digit.
            if let Ok(n) = serde_json::from_str::<Number>(digits) {
                return Ok(Value::Number(n));
            }
        }

        let has_digit = cleaned.chars().any(|c| c.is_ascii_digit());
        if has_digit && RE_FLOAT.is_match(text) {
            if let Some(n) = cleaned
                .trim_start_matches('+')
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
            {
                return Ok(Value::Number(n));
            }
        }

        Err(LiteralError::InvalidNumber(text.to_string()))
    }
}

/// Stringify a scalar key the way JSON encoding does.
fn key_text(key: Tree, offset: usize) -> Result<String, LiteralError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Array(_) | Value::Object(_) => Err(LiteralError::UnhashableKey { offset }),
    }
}
