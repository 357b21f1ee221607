//! Scrub Core Library
//!
//! Everything around the redaction engine that a program needs to use it:
//! - Capture logging for requests, responses and arbitrary payloads
//! - Configuration loading and resolution
//! - Logging setup and the process-wide redactor
//! - Exit codes for CLI operations
//!
//! The binary entry point is in `main.rs`.

pub mod capture;
pub mod config;
pub mod exit_codes;
pub mod logging;

pub use scrub_redact;
