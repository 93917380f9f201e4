//! Common test utilities

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A schema exercising nesting, arguments, every option kind and a declared global
pub const DEMO_SCHEMA: &str = r#"
cli:
  name: demo
  tagline: Demo CLI
  version: 1.2.3
  options:
    - name: config
      short: c
      desc: Config file
      default: app.toml
  commands:
    simple:
      desc: Simple command
      args:
        - name: MESSAGE
          desc: Message to print
      options:
        - name: verbose
          type: flag
          desc: Verbose simple output
    greet:
      desc: Greet someone
      args:
        - name: NAME
        - name: GREETING
          required: false
      options:
        - name: times
          short: t
          type: count
        - name: format
          default: text
    database:
      desc: Database operations
      subcommands:
        status:
          desc: Show status
"#;

/// Create a temporary directory with a polycli.yaml file
pub fn create_test_schema(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let schema_path = temp_dir.path().join("polycli.yaml");
    fs::write(&schema_path, content).unwrap();
    (temp_dir, schema_path)
}
