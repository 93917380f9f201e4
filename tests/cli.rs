//! Integration tests for the polycli binary

mod common;

use assert_cmd::Command;
use common::{create_test_schema, DEMO_SCHEMA};
use predicates::prelude::*;
use std::fs;

fn polycli() -> Command {
    let mut cmd = Command::cargo_bin("polycli").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_validate_reports_success() {
    let (_temp, schema) = create_test_schema(DEMO_SCHEMA);
    polycli()
        .arg("-f")
        .arg(&schema)
        .arg("validate")
        .assert()
        .success()
        .stderr(predicate::str::contains("is valid: 4 command(s)"));
}

#[test]
fn test_validate_lists_every_defect() {
    let (_temp, schema) = create_test_schema(
        r#"
cli:
  name: demo
  commands:
    one:
      options:
        - name: a
          short: x
        - name: b
          short: x
      args:
        - name: first
          required: false
        - name: second
"#,
    );
    polycli()
        .arg("-f")
        .arg(&schema)
        .arg("validate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("2 defect(s)"))
        .stderr(predicate::str::contains("demo.one: options 'a' and 'b' share the short alias '-x'"));
}

#[test]
fn test_missing_schema_lists_searched_paths() {
    let temp = tempfile::TempDir::new().unwrap();
    polycli()
        .current_dir(temp.path())
        .arg("validate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("polycli.yaml"));
}

#[test]
fn test_hooks_table() {
    let (_temp, schema) = create_test_schema(DEMO_SCHEMA);
    polycli()
        .arg("-f")
        .arg(&schema)
        .args(["hooks", "--convention", "snake"])
        .assert()
        .success()
        .stdout(predicate::str::contains("database status"))
        .stdout(predicate::str::contains("on_database_status"))
        .stdout(predicate::str::contains("on_unknown_command"))
        .stdout(predicate::str::contains("onDatabaseStatus").not());
}

#[test]
fn test_try_prints_context() {
    let (_temp, schema) = create_test_schema(DEMO_SCHEMA);
    polycli()
        .arg("-f")
        .arg(&schema)
        .args(["try", "--", "simple", "hi", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"commandName":"simple","args":{"message":"hi"},"options":{"verbose":true}"#,
        ));
}

#[test]
fn test_try_without_hooks_uses_fallbacks() {
    let (_temp, schema) = create_test_schema(DEMO_SCHEMA);
    polycli()
        .arg("-f")
        .arg(&schema)
        .args(["try", "--no-hooks", "--", "database", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "database status executed successfully (hook 'on_database_status' not implemented yet)",
        ));

    polycli()
        .arg("-f")
        .arg(&schema)
        .args(["try", "--no-hooks", "--", "bogus"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown command: bogus"));
}

#[test]
fn test_try_version_and_usage_errors() {
    let (_temp, schema) = create_test_schema(DEMO_SCHEMA);
    polycli()
        .arg("-f")
        .arg(&schema)
        .args(["try", "--", "database", "status", "--version"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.2.3"));

    polycli()
        .arg("-f")
        .arg(&schema)
        .args(["try", "--", "simple"])
        .assert()
        .code(2);
}

#[test]
fn test_build_writes_targets() {
    let (temp, schema) = create_test_schema(DEMO_SCHEMA);
    let out = temp.path().join("out");
    polycli()
        .arg("-f")
        .arg(&schema)
        .arg("build")
        .arg("--output-dir")
        .arg(&out)
        .args(["-t", "python", "-t", "ts"])
        .assert()
        .success();

    assert!(out.join("python/cli.py").is_file());
    assert!(out.join("typescript/src/types.ts").is_file());
    assert!(out.join("completions/_demo").is_file());
    assert!(!out.join("rust").exists());
}

#[test]
fn test_build_rejects_unknown_target() {
    let (_temp, schema) = create_test_schema(DEMO_SCHEMA);
    polycli()
        .arg("-f")
        .arg(&schema)
        .args(["build", "--target", "cobol"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unsupported target 'cobol'"));
}

#[test]
fn test_completion_script_to_stdout() {
    let (_temp, schema) = create_test_schema(DEMO_SCHEMA);
    polycli()
        .arg("-f")
        .arg(&schema)
        .args(["completion", "--shell", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete -c demo -f"));

    polycli()
        .arg("-f")
        .arg(&schema)
        .args(["completion", "--shell", "tcsh"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unsupported shell: 'tcsh'"));
}

#[test]
fn test_completion_install_into_home() {
    let (temp, schema) = create_test_schema(DEMO_SCHEMA);
    let home = temp.path().join("home");
    fs::create_dir(&home).unwrap();
    polycli()
        .env("HOME", &home)
        .arg("-f")
        .arg(&schema)
        .args(["completion", "--shell", "zsh", "--install"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Installed zsh completion"));

    assert!(home.join(".zsh/completions/_demo").is_file());
}

#[test]
fn test_init_writes_valid_schema_once() {
    let temp = tempfile::TempDir::new().unwrap();
    polycli()
        .current_dir(temp.path())
        .args(["init", "tool"])
        .assert()
        .success();
    let written = fs::read_to_string(temp.path().join("polycli.yaml")).unwrap();
    assert!(written.contains("name: tool"));

    polycli()
        .current_dir(temp.path())
        .arg("validate")
        .assert()
        .success();

    polycli()
        .current_dir(temp.path())
        .args(["init", "tool"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--force"));

    polycli()
        .current_dir(temp.path())
        .args(["init", "other", "--force"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Overwriting existing polycli.yaml"));
    let written = fs::read_to_string(temp.path().join("polycli.yaml")).unwrap();
    assert!(written.contains("name: other"));
}

#[test]
fn test_self_completions() {
    polycli()
        .args(["self-completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("polycli"));
}
