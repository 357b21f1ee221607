//! Scrub - redact and pretty-print captured payloads
//!
//! The main entry point for the `scrub` binary, handling:
//! - Redacting captured request/response bodies from files or stdin
//! - Canonical rendering without masking
//! - Header redaction
//! - Inspecting the effective policy and configuration

use clap::{Args, Parser, Subcommand};
use scrub_core::capture::parse_header_lines;
use scrub_core::config::{load_config, ConfigError, ConfigOptions, ResolvedConfig};
use scrub_core::exit_codes::ExitCode;
use scrub_core::logging::{get_redactor, init_logging, set_redactor, LogFormat, LogLevel};
use scrub_redact::{
    render, render_headers, render_tree, set_redaction_enabled, Payload, Redactor,
};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Scrub - mask sensitive fields in captured payloads
#[derive(Parser)]
#[command(name = "scrub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Log format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Render without masking anything
    #[arg(long, global = true)]
    no_redact: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Redact payloads and print them canonically
    Redact(RedactArgs),

    /// Print payloads canonically without masking
    Render(RenderArgs),

    /// Redact `Name: value` header lines
    Headers(HeadersArgs),

    /// Print the effective redaction policy
    Policy,

    /// Print the resolved configuration
    Config,
}

#[derive(Args, Debug)]
struct RedactArgs {
    /// Input files; `-` or none reads stdin
    inputs: Vec<String>,

    /// Label used in log entries (defaults to the input name)
    #[arg(long)]
    prefix: Option<String>,

    /// Write to this file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Input files; `-` or none reads stdin
    inputs: Vec<String>,

    /// Write to this file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct HeadersArgs {
    /// Input file; `-` or none reads stdin
    input: Option<String>,

    /// Write to this file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

const STDIN: &str = "-";

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let options = ConfigOptions {
        config_path: cli.global.config.clone(),
        no_redact: cli.global.no_redact,
    };
    let resolved = match load_config(&options) {
        Ok(resolved) => resolved,
        Err(err) => std::process::exit(output_config_error(&err).as_i32()),
    };

    let log_config = resolved
        .config
        .log
        .clone()
        .overridden(cli.global.log_level, cli.global.log_format);
    init_logging(&log_config);

    tracing::debug!(
        source = %resolved.source,
        path = ?resolved.path,
        redaction_enabled = resolved.redaction_enabled,
        "configuration resolved"
    );

    set_redaction_enabled(resolved.redaction_enabled);
    set_redactor(Redactor::new(resolved.policy.clone()));
    let redactor = get_redactor();

    let exit_code = match &cli.command {
        Commands::Redact(args) => run_redact(redactor, args),
        Commands::Render(args) => run_render(args),
        Commands::Headers(args) => run_headers(redactor, args),
        Commands::Policy => run_policy(&resolved),
        Commands::Config => run_config(&resolved),
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_redact(redactor: &Redactor, args: &RedactArgs) -> ExitCode {
    let result = with_output(args.output.as_deref(), |out| {
        for input in input_names(&args.inputs) {
            let payload = Payload::Bytes(read_input(input)?);
            let prefix = args.prefix.as_deref().unwrap_or(input);
            let redacted = redactor.redact(&payload, prefix);
            tracing::debug!(
                input,
                applied = redacted.applied,
                issues = redacted.issues.len(),
                "redacted input"
            );
            write_block(out, &redacted.render())?;
        }
        Ok(())
    });
    io_exit_code(result)
}

fn run_render(args: &RenderArgs) -> ExitCode {
    let result = with_output(args.output.as_deref(), |out| {
        for input in input_names(&args.inputs) {
            let payload = Payload::Bytes(read_input(input)?);
            write_block(out, &render(&payload))?;
        }
        Ok(())
    });
    io_exit_code(result)
}

fn run_headers(redactor: &Redactor, args: &HeadersArgs) -> ExitCode {
    let input = args.input.as_deref().unwrap_or(STDIN);
    let result = with_output(args.output.as_deref(), |out| {
        let raw = read_input(input)?;
        let headers = parse_header_lines(&String::from_utf8_lossy(&raw));
        let redacted = redactor.redact_headers(&headers, "HEADERS");
        write_block(out, &render_headers(&redacted))
    });
    io_exit_code(result)
}

fn run_policy(resolved: &ResolvedConfig) -> ExitCode {
    let tree = match serde_json::to_value(&resolved.policy) {
        Ok(tree) => tree,
        Err(err) => {
            tracing::error!(error = %err, "cannot serialize policy");
            return ExitCode::InternalError;
        }
    };
    io_exit_code(with_output(None, |out| write_block(out, &render_tree(&tree))))
}

fn run_config(resolved: &ResolvedConfig) -> ExitCode {
    let body = match resolved.config.to_toml() {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(error = %err, "cannot serialize configuration");
            return ExitCode::InternalError;
        }
    };

    let path = resolved
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut header = format!(
        "# source: {}\n# path: {}\n# redaction: {}\n",
        resolved.source,
        path,
        if resolved.redaction_enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
    if let Some(policy_path) = &resolved.policy_path {
        header.push_str(&format!("# policy file: {}\n", policy_path.display()));
    }

    io_exit_code(with_output(None, |out| {
        out.write_all(header.as_bytes())?;
        write_block(out, &body)
    }))
}

// ============================================================================
// Helpers
// ============================================================================

/// Output a config error and pick the exit code for it.
fn output_config_error(error: &ConfigError) -> ExitCode {
    eprintln!("scrub: configuration error: {}", error);
    match error {
        ConfigError::IoError { .. } => ExitCode::IoError,
        ConfigError::NotFound { .. }
        | ConfigError::ParseError { .. }
        | ConfigError::PolicyError { .. }
        | ConfigError::ValidationError(_) => ExitCode::ConfigError,
    }
}

fn input_names(inputs: &[String]) -> Vec<&str> {
    if inputs.is_empty() {
        vec![STDIN]
    } else {
        inputs.iter().map(String::as_str).collect()
    }
}

fn read_input(input: &str) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if input == STDIN {
        io::stdin().lock().read_to_end(&mut buf)?;
    } else {
        File::open(input)
            .and_then(|mut file| file.read_to_end(&mut buf))
            .map_err(|err| io::Error::new(err.kind(), format!("{}: {}", input, err)))?;
    }
    Ok(buf)
}

fn with_output<F>(path: Option<&Path>, f: F) -> io::Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    match path {
        Some(path) => {
            let file = File::create(path)
                .map_err(|err| io::Error::new(err.kind(), format!("{}: {}", path.display(), err)))?;
            let mut out = BufWriter::new(file);
            f(&mut out)?;
            out.flush()
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            f(&mut out)?;
            out.flush()
        }
    }
}

fn write_block(out: &mut dyn Write, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    Ok(())
}

fn io_exit_code(result: io::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::Clean,
        Err(err) => {
            eprintln!("scrub: {}", err);
            ExitCode::IoError
        }
    }
}
