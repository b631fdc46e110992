//! CLI tests for `docfill` commands.
//!
//! Spawns the docfill binary and verifies stdout and exit codes for valid,
//! invalid and incomplete invocations.

use std::fs;
use std::process::{Command, Output};

use docfill::exit_codes;
use docfill::io::config::{GeneratorConfig, load_config};
use docfill::test_support::TempTemplate;

const NOTE_DEFINITION: &str = r#"
name = "note"
file = "document.txt"

[[fields]]
id = "signature"
source = "AUTO"
instructions = "Sign a note to {{ recipient }}"
schema = { type = "string" }

[[fields]]
id = "recipient"
source = "INPUT"
schema = { type = "string" }
"#;

const NOTE_DOCUMENT: &str = "Dear {{ recipient }},\nsee you soon.\n{{ signature }}";

fn docfill(fixture: &TempTemplate, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_docfill"))
        .current_dir(fixture.root())
        .args(args)
        .output()
        .expect("run docfill")
}

#[test]
fn validate_prints_ok() {
    let fixture = TempTemplate::new(NOTE_DOCUMENT, NOTE_DEFINITION).expect("fixture");
    let output = docfill(&fixture, &["validate", "definition.toml"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "ok\n");
}

#[test]
fn validate_reports_orphan_placeholders() {
    let fixture =
        TempTemplate::new("{{ recipient }} {{ postscript }}", NOTE_DEFINITION).expect("fixture");
    let output = docfill(&fixture, &["validate", "definition.toml"]);

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Missing defined fields, which are present in template: postscript"),
        "{stderr}"
    );
}

#[test]
fn order_prints_dependencies_first() {
    let fixture = TempTemplate::new(NOTE_DOCUMENT, NOTE_DEFINITION).expect("fixture");
    let output = docfill(&fixture, &["order", "definition.toml"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "recipient\nsignature\n");
}

#[test]
fn fill_without_inputs_exits_with_missing_inputs_code() {
    let fixture = TempTemplate::new(NOTE_DOCUMENT, NOTE_DEFINITION).expect("fixture");
    let output = docfill(&fixture, &["fill", "definition.toml"]);

    assert_eq!(output.status.code(), Some(exit_codes::MISSING_INPUTS));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Missing inputs: recipient"), "{stderr}");
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let fixture = TempTemplate::new(NOTE_DOCUMENT, NOTE_DEFINITION).expect("fixture");
    let output = docfill(&fixture, &[]);

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
}

#[cfg(unix)]
#[test]
fn fill_renders_document_with_command_backend() {
    let fixture = TempTemplate::new(NOTE_DOCUMENT, NOTE_DEFINITION).expect("fixture");
    fixture
        .write(
            "docfill.toml",
            "[backend]\ncommand = [\"sh\", \"-c\", \"cat > /dev/null; printf 'Jane'\"]\ntimeout_secs = 10\n",
        )
        .expect("config");

    let output = docfill(
        &fixture,
        &[
            "fill",
            "definition.toml",
            "--input",
            "recipient=Ann",
            "--output",
            "out/note.txt",
        ],
    );

    assert_eq!(
        output.status.code(),
        Some(exit_codes::OK),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let rendered = fs::read_to_string(fixture.root().join("out/note.txt")).expect("read output");
    assert_eq!(rendered, "Dear Ann,\nsee you soon.\nJane");
}

#[cfg(unix)]
#[test]
fn fill_exits_with_generation_failed_when_budget_runs_out() {
    let fixture = TempTemplate::new(
        "{{ count }}",
        r#"
name = "counter"
file = "document.txt"

[[fields]]
id = "count"
source = "AUTO"
instructions = "How many?"
schema = { type = "integer" }
"#,
    )
    .expect("fixture");
    let config = fixture
        .write(
            "settings.toml",
            "max_attempts = 2\n[backend]\ncommand = [\"sh\", \"-c\", \"cat > /dev/null; printf 'many'\"]\n",
        )
        .expect("config");

    let output = docfill(
        &fixture,
        &[
            "fill",
            "definition.toml",
            "--config",
            config.to_str().expect("utf-8 path"),
        ],
    );

    assert_eq!(output.status.code(), Some(exit_codes::GENERATION_FAILED));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No valid reply after 2 attempts"), "{stderr}");
}

/// Verifies help goes to stdout with a success code.
#[test]
fn help_exits_ok() {
    let fixture = TempTemplate::new(NOTE_DOCUMENT, NOTE_DEFINITION).expect("fixture");
    let output = docfill(&fixture, &["--help"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "{stdout}");
}

/// Verifies init writes a loadable default config and refuses to overwrite without --force.
#[test]
fn init_writes_default_config_once() {
    let fixture = TempTemplate::new(NOTE_DOCUMENT, NOTE_DEFINITION).expect("fixture");
    let output = docfill(&fixture, &["init"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));

    let path = fixture.root().join("docfill.toml");
    let written = fs::read_to_string(&path).expect("read config");
    assert!(written.contains("max_attempts = 5"), "{written}");
    let cfg = load_config(&path).expect("load written config");
    assert_eq!(cfg, GeneratorConfig::default());

    let again = docfill(&fixture, &["init"]);
    assert_eq!(again.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&again.stderr);
    assert!(stderr.contains("already exists"), "{stderr}");

    let forced = docfill(&fixture, &["init", "--force"]);
    assert_eq!(forced.status.code(), Some(exit_codes::OK));
}
