//! End-to-end tests for the scrub binary.
//!
//! These tests verify:
//! - Payload files and stdin are redacted and rendered canonically
//! - Identifiers harvested from one input mask keys in later inputs
//! - Config, env and flag handling
//! - Exit codes for usage, config and I/O errors

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a Command for the scrub binary, isolated from the user's config.
fn scrub(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("scrub").expect("scrub binary should exist");
    cmd.env("XDG_CONFIG_HOME", home.path())
        .env("HOME", home.path())
        .env_remove("SCRUB_CONFIG")
        .env_remove("SCRUB_CONFIG_DIR")
        .env_remove("SCRUB_REDACT")
        .env_remove("SCRUB_LOG")
        .env_remove("SCRUB_LOG_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Redact
// ============================================================================

mod redact {
    use super::*;

    #[test]
    fn redacts_stdin() {
        let home = TempDir::new().unwrap();
        scrub(&home)
            .arg("redact")
            .write_stdin(r#"{"email":"test@example.com","title":"Title"}"#)
            .assert()
            .success()
            .stdout("{\n    \"email\":\"****************\",\n    \"title\":\"Title\"\n}\n");
    }

    #[test]
    fn redacts_literal_syntax() {
        let home = TempDir::new().unwrap();
        scrub(&home)
            .args(["redact", "-"])
            .write_stdin("[{'username': 'reader'}, {'ok': True}]")
            .assert()
            .success()
            .stdout("[\n    {\n        \"username\":\"r*a*e*\"\n    },\n    {\n        \"ok\":true\n    }\n]\n");
    }

    #[test]
    fn form_body_passes_through() {
        let home = TempDir::new().unwrap();
        scrub(&home)
            .arg("redact")
            .write_stdin("days_to_suspend=0&email_address=")
            .assert()
            .success()
            .stdout("days_to_suspend=0&email_address=\n");
    }

    #[test]
    fn identifiers_carry_across_inputs() {
        let home = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("summary.json");
        let second = dir.path().join("holds.json");
        fs::write(&first, r#"{"summary":{"1234567":{"holds":1}}}"#).unwrap();
        fs::write(&second, r#"{"1234567":[{"title":"Title"}]}"#).unwrap();

        scrub(&home)
            .arg("redact")
            .arg(&first)
            .arg(&second)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"1*3*5*7\":{"))
            .stdout(predicate::str::contains("\"1*3*5*7\":["))
            .stdout(predicate::str::contains("1234567").not());
    }

    #[test]
    fn writes_output_file() {
        let home = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.txt");

        scrub(&home)
            .args(["redact", "--output"])
            .arg(&out)
            .write_stdin(r#"{"cardId":"123456"}"#)
            .assert()
            .success()
            .stdout("");

        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "{\n    \"cardId\":\"1*3*5*\"\n}\n"
        );
    }

    #[test]
    fn no_redact_flag_renders_unmasked() {
        let home = TempDir::new().unwrap();
        scrub(&home)
            .args(["redact", "--no-redact"])
            .write_stdin(r#"{"email":"a@b"}"#)
            .assert()
            .success()
            .stdout("{\n    \"email\":\"a@b\"\n}\n")
            .stderr(predicate::str::contains("not redacted"));
    }

    #[test]
    fn env_switch_disables_redaction() {
        let home = TempDir::new().unwrap();
        scrub(&home)
            .env("SCRUB_REDACT", "0")
            .arg("redact")
            .write_stdin(r#"{"email":"a@b"}"#)
            .assert()
            .success()
            .stdout(predicate::str::contains("a@b"));
    }

    #[test]
    fn missing_input_is_io_error() {
        let home = TempDir::new().unwrap();
        scrub(&home)
            .args(["redact", "/nonexistent/capture.json"])
            .assert()
            .code(21)
            .stderr(predicate::str::contains("capture.json"));
    }
}

// ============================================================================
// Render and Headers
// ============================================================================

mod render {
    use super::*;

    #[test]
    fn renders_without_masking() {
        let home = TempDir::new().unwrap();
        scrub(&home)
            .arg("render")
            .write_stdin(r#"{"email":"a@b","n":[1,2]}"#)
            .assert()
            .success()
            .stdout("{\n    \"email\":\"a@b\",\n    \"n\":[\n        1,\n        2\n    ]\n}\n");
    }

    #[test]
    fn plain_text_unchanged() {
        let home = TempDir::new().unwrap();
        scrub(&home)
            .arg("render")
            .write_stdin("Hello World\n")
            .assert()
            .success()
            .stdout("Hello World\n");
    }

    #[test]
    fn redacts_headers() {
        let home = TempDir::new().unwrap();
        let token = format!("Bearer {}", "q".repeat(30));
        scrub(&home)
            .arg("headers")
            .write_stdin(format!(
                "Accept: application/json\nAuthorization: {}\nAccept: text/plain\n",
                token
            ))
            .assert()
            .success()
            .stdout("Accept: application/json\nAuthorization: Bearer ***\nAccept: text/plain\n");
    }
}

// ============================================================================
// Policy and Config
// ============================================================================

mod inspect {
    use super::*;

    #[test]
    fn prints_default_policy() {
        let home = TempDir::new().unwrap();
        scrub(&home)
            .arg("policy")
            .assert()
            .success()
            .stdout(predicate::str::contains("\"identifier_source_key\":\"summary\""))
            .stdout(predicate::str::contains("\"field\":\"Authorization\""))
            .stdout(predicate::str::contains("\"policy\":\"partial-mask\""));
    }

    #[test]
    fn config_reports_source() {
        let home = TempDir::new().unwrap();
        scrub(&home)
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("# source: builtin default"))
            .stdout(predicate::str::contains("# redaction: enabled"));
    }

    #[test]
    fn config_file_rules_apply() {
        let home = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        fs::write(
            &config,
            "[[policy.rules]]\nfield = \"pin\"\npolicy = \"full-mask\"\n",
        )
        .unwrap();

        scrub(&home)
            .arg("--config")
            .arg(&config)
            .arg("redact")
            .write_stdin(r#"{"PIN":"1234","email":"kept"}"#)
            .assert()
            .success()
            .stdout("{\n    \"PIN\":\"****\",\n    \"email\":\"kept\"\n}\n");
    }

    #[test]
    fn config_dir_from_env() {
        let home = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "[redaction]\nenabled = false\n").unwrap();

        scrub(&home)
            .env("SCRUB_CONFIG_DIR", dir.path())
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("# source: environment variable"))
            .stdout(predicate::str::contains("# redaction: disabled"));
    }
}

// ============================================================================
// Errors
// ============================================================================

mod errors {
    use super::*;

    #[test]
    fn unknown_command_is_args_error() {
        let home = TempDir::new().unwrap();
        scrub(&home)
            .arg("nonexistent-command")
            .assert()
            .code(10)
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn bad_log_level_is_args_error() {
        let home = TempDir::new().unwrap();
        scrub(&home)
            .args(["--log-level", "loud", "policy"])
            .assert()
            .code(10);
    }

    #[test]
    fn help_succeeds() {
        let home = TempDir::new().unwrap();
        scrub(&home)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("redact"));
    }

    #[test]
    fn missing_config_is_config_error() {
        let home = TempDir::new().unwrap();
        scrub(&home)
            .args(["--config", "/nonexistent/scrub.toml", "policy"])
            .assert()
            .code(11)
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn malformed_config_is_config_error() {
        let home = TempDir::new().unwrap();
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        fs::write(&config, "[log]\nlevel = \"loud\"\n").unwrap();

        scrub(&home)
            .arg("--config")
            .arg(&config)
            .arg("policy")
            .assert()
            .code(11);
    }
}
