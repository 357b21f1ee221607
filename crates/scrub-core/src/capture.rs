//! Capture logging for HTTP traffic and other payloads.
//!
//! Every entry is redacted before it reaches the subscriber. Entries are
//! emitted at DEBUG under [`CAPTURE_TARGET`]; when that level is off the
//! `log_*` functions return without redacting anything.
//!
//! The text of each entry comes from a `format_*` function so callers that
//! write to their own sink get exactly what the log would have shown.

use scrub_redact::{redaction_enabled, render, Payload, Redactor};
use std::panic::Location;

/// Target used for captured payloads.
pub const CAPTURE_TARGET: &str = "scrub_core::capture";

/// Header pairs in wire order; names may repeat.
pub type Headers = Vec<(String, String)>;

/// An outgoing request as it was sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Payload>,
}

impl RequestRecord {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add a header, keeping any earlier one with the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Payload>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Status line and headers of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub url: String,
    pub headers: Headers,
}

impl ResponseHead {
    pub fn new(status: u16, url: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Parse `Name: value` lines into header pairs.
///
/// Blank lines are skipped; a line without a colon becomes a header with
/// an empty value.
pub fn parse_header_lines(text: &str) -> Headers {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.split_once(':') {
            Some((name, value)) => (name.trim().to_string(), value.trim().to_string()),
            None => (line.trim().to_string(), String::new()),
        })
        .collect()
}

/// Returns whether capture entries would be recorded.
pub fn capture_enabled() -> bool {
    tracing::enabled!(target: CAPTURE_TARGET, tracing::Level::DEBUG)
}

/// Free text with registered identifiers masked.
pub fn format_text(redactor: &Redactor, text: &str) -> String {
    if redaction_enabled() {
        redactor.mask_known_identifiers(text)
    } else {
        text.to_string()
    }
}

/// A labelled payload entry.
pub fn format_payload(redactor: &Redactor, payload: &Payload, prefix: &str) -> String {
    if redaction_enabled() {
        format!("{}\n{}\n", prefix, redactor.redact_to_text(payload, prefix))
    } else {
        format!(
            "{}: WARNING : may contain sensitive data\n{}\n",
            prefix,
            render(payload)
        )
    }
}

/// A labelled block of `Name: value` header lines.
pub fn format_headers(redactor: &Redactor, headers: &[(String, String)], prefix: &str) -> String {
    let redacted = redactor.redact_headers(headers, prefix);
    format!("{}: \n{}\n", prefix, scrub_redact::render_headers(&redacted))
}

/// Entries for a request: the request line, its headers and, if present,
/// its body.
pub fn format_request(redactor: &Redactor, request: &RequestRecord) -> Vec<String> {
    let mut entries = vec![
        format_text(
            redactor,
            &format!("REQUEST: {} {}\n", request.method, request.url),
        ),
        format_headers(redactor, &request.headers, "REQ HEADERS"),
    ];
    if let Some(body) = request.body.as_ref().filter(|body| !is_empty(body)) {
        entries.push(format_payload(redactor, body, "REQ BODY:"));
    }
    entries
}

/// Entries for a response status line and its headers.
pub fn format_response_head(redactor: &Redactor, response: &ResponseHead) -> Vec<String> {
    vec![
        format_text(
            redactor,
            &format!("RESPONSE: {} {}", response.status, response.url),
        ),
        format_headers(redactor, &response.headers, "RES HEADERS"),
    ]
}

fn is_empty(payload: &Payload) -> bool {
    match payload {
        Payload::Bytes(bytes) => bytes.is_empty(),
        Payload::Text(text) => text.is_empty(),
        Payload::Tree(_) => false,
    }
}

fn emit(entry: &str) {
    tracing::debug!(target: CAPTURE_TARGET, "{}", entry);
}

/// Log free text.
pub fn log_text(redactor: &Redactor, text: &str) {
    if capture_enabled() {
        emit(&format_text(redactor, text));
    }
}

/// Log a payload, labelled with `prefix` or with the caller's location.
#[track_caller]
pub fn log_payload(redactor: &Redactor, payload: &Payload, prefix: Option<&str>) {
    if !capture_enabled() {
        return;
    }
    let caller;
    let prefix = match prefix {
        Some(prefix) => prefix,
        None => {
            caller = caller_label(Location::caller());
            caller.as_str()
        }
    };
    emit(&format_payload(redactor, payload, prefix));
}

/// Log an outgoing request.
pub fn log_request(redactor: &Redactor, request: &RequestRecord) {
    if capture_enabled() {
        for entry in format_request(redactor, request) {
            emit(&entry);
        }
    }
}

/// Log the head of a response.
pub fn log_response_head(redactor: &Redactor, response: &ResponseHead) {
    if capture_enabled() {
        for entry in format_response_head(redactor, response) {
            emit(&entry);
        }
    }
}

fn caller_label(location: &Location<'_>) -> String {
    format!("{}:{}", location.file(), location.line())
}
