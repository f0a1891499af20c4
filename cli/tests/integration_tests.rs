use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const CONTACT: &str = r#"
version: "1.0"
schema:
  type: dict
  name: contact
  fields:
    - { name: email, type: string }
    - { name: age, type: integer, signed: false, optional: true }
    - name: tags
      type: array
      member: { type: string, name: tag }
"#;

fn write_definition(dir: &TempDir, file: &str, text: &str) -> PathBuf {
    let path = dir.path().join(file);
    fs::write(&path, text).expect("failed to write definition");
    path
}

/// Runs the binary with `stdin` piped in.
fn run(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_flatland"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run flatland");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("failed to write stdin");
    child.wait_with_output().expect("failed to wait for flatland")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ---------------------------------------------------------------------------
// flatten / unflatten
// ---------------------------------------------------------------------------

#[test]
fn flatten_prints_pairs_in_schema_order() {
    let dir = TempDir::new().unwrap();
    let def = write_definition(&dir, "contact.yml", CONTACT);

    let output = run(
        &["flatten", "--definition", path_str(&def)],
        r#"{"tags": ["a", "b"], "email": "ada@example.com", "age": 36}"#,
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "contact_email=ada@example.com\ncontact_age=36\ncontact_tags_tag=a\ncontact_tags_tag=b\n"
    );
}

#[test]
fn unflatten_prints_json_document() {
    let dir = TempDir::new().unwrap();
    let def = write_definition(&dir, "contact.yml", CONTACT);

    let output = run(
        &["unflatten", "--definition", path_str(&def)],
        "contact_email=ada@example.com\ncontact_tags_tag=x\nother=ignored\n",
    );
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        doc,
        serde_json::json!({"email": "ada@example.com", "age": null, "tags": ["x"]})
    );
}

#[test]
fn unflatten_with_custom_separator_from_registry() {
    let dir = TempDir::new().unwrap();
    write_definition(&dir, "contact.yml", CONTACT);

    let output = run(
        &[
            "unflatten",
            "--registry",
            path_str(dir.path()),
            "--form",
            "contact",
            "--separator",
            ".",
            "--input-format",
            "json",
        ],
        r#"[["contact.email", "a@b.c"]]"#,
    );
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["email"], "a@b.c");
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_complete_input() {
    let dir = TempDir::new().unwrap();
    let def = write_definition(&dir, "contact.yml", CONTACT);

    let output = run(
        &["validate", "--definition", path_str(&def)],
        "contact_email=ada@example.com\ncontact_tags_tag=x\n",
    );
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "valid\n");
}

#[test]
fn validate_reports_failures_and_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let def = write_definition(&dir, "contact.yml", CONTACT);

    let output = run(
        &["validate", "--definition", path_str(&def)],
        "contact_age=12\n",
    );
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("contact_email: contact_email is required"));
    assert!(stdout.contains("contact_tags: contact_tags is required"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("2 validation error(s)"));
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_accepts_valid_directory() {
    let dir = TempDir::new().unwrap();
    write_definition(&dir, "contact.yml", CONTACT);

    let output = run(&["check", path_str(dir.path())], "");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Checked 1 definition(s)."));
}

#[test]
fn check_reports_structural_issues() {
    let dir = TempDir::new().unwrap();
    let def = write_definition(
        &dir,
        "bad.json",
        r#"{"schema": {"type": "array", "name": "a", "member": {"type": "dict", "fields": []}}}"#,
    );

    let output = run(&["check", path_str(&def)], "");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("array member must be a scalar"));
}

#[test]
fn missing_form_source_is_an_error() {
    let output = run(&["flatten"], "");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Specify --definition"));
}
