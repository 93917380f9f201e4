//! Target emitters
//!
//! Each supported runtime has one emitter. Every emitter renders the same
//! [`CliDocument`] into an entry point, a hook-stub module, a package manifest and,
//! for statically typed targets, a type-declaration module. Emitters are pure: they
//! return file contents and never touch the filesystem ([`output`] does that).

pub mod doc;
pub mod javascript;
pub mod output;
pub mod python;
pub mod rust;
pub mod typescript;
pub mod writer;

pub use doc::{ArgumentDoc, CliDocument, CommandDoc, OptionDoc};
pub use output::{write_outputs, WriteReport};

use crate::model::{HookContract, HookConvention, ResolvedTree};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Supported output runtimes; a closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    Python,
    NodeJs,
    TypeScript,
    Rust,
}

impl Target {
    pub const ALL: [Target; 4] = [
        Target::Python,
        Target::NodeJs,
        Target::TypeScript,
        Target::Rust,
    ];

    /// Directory name and schema spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Python => "python",
            Target::NodeJs => "nodejs",
            Target::TypeScript => "typescript",
            Target::Rust => "rust",
        }
    }

    /// Hook naming convention idiomatic for the target
    pub fn convention(&self) -> HookConvention {
        match self {
            Target::Python | Target::Rust => HookConvention::PrefixedSnake,
            Target::NodeJs | Target::TypeScript => HookConvention::PrefixedCamel,
        }
    }

    /// Whether the target gets a type-declaration module
    pub fn is_statically_typed(&self) -> bool {
        matches!(self, Target::TypeScript | Target::Rust)
    }

    fn emitter(&self) -> &'static dyn Emitter {
        match self {
            Target::Python => &python::PythonEmitter,
            Target::NodeJs => &javascript::JavaScriptEmitter,
            Target::TypeScript => &typescript::TypeScriptEmitter,
            Target::Rust => &rust::RustEmitter,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "python" | "py" => Ok(Target::Python),
            "nodejs" | "node" | "javascript" | "js" => Ok(Target::NodeJs),
            "typescript" | "ts" => Ok(Target::TypeScript),
            "rust" | "rs" => Ok(Target::Rust),
            other => Err(format!(
                "unsupported target '{}' (expected python, nodejs, typescript or rust)",
                other
            )),
        }
    }
}

/// Role of an emitted file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Executable entry point; always regenerated
    Entry,
    /// User-owned hook implementations; written only when missing
    HookStub,
    /// Type declarations mirroring the invocation context
    Types,
    /// Package manifest
    Manifest,
    /// Shell completion script for the generated CLI
    Completion,
}

/// One generated file, path relative to the target directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    pub path: PathBuf,
    pub content: String,
    pub kind: FileKind,
}

impl EmittedFile {
    pub fn new(path: impl Into<PathBuf>, content: String, kind: FileKind) -> Self {
        EmittedFile {
            path: path.into(),
            content,
            kind,
        }
    }

    /// The same file placed under `dir`
    pub fn within(mut self, dir: impl AsRef<Path>) -> Self {
        self.path = dir.as_ref().join(&self.path);
        self
    }
}

/// All files of one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutput {
    pub target: Target,
    pub files: Vec<EmittedFile>,
}

impl TargetOutput {
    pub fn file(&self, kind: FileKind) -> Option<&EmittedFile> {
        self.files.iter().find(|f| f.kind == kind)
    }
}

/// Renders a document for one target
pub trait Emitter: Sync {
    fn target(&self) -> Target;

    fn emit(&self, doc: &CliDocument) -> Vec<EmittedFile>;
}

/// Emit one target
pub fn emit(tree: &ResolvedTree, contract: &HookContract, target: Target) -> TargetOutput {
    let doc = CliDocument::build(tree, contract);
    emit_document(&doc, target)
}

/// Emit several targets in parallel from one shared document
pub fn emit_all(tree: &ResolvedTree, contract: &HookContract, targets: &[Target]) -> Vec<TargetOutput> {
    let doc = CliDocument::build(tree, contract);
    targets
        .par_iter()
        .map(|target| emit_document(&doc, *target))
        .collect()
}

fn emit_document(doc: &CliDocument, target: Target) -> TargetOutput {
    let emitter = target.emitter();
    debug_assert_eq!(emitter.target(), target);
    TargetOutput {
        target,
        files: emitter.emit(doc),
    }
}

/// Generated-file banner line, without comment markers
pub(crate) fn banner(doc: &CliDocument) -> String {
    format!(
        "{} {} - generated by polycli {}; edit the schema, not this file",
        doc.name,
        doc.version,
        crate::VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::resolve;
    use crate::schema::{parse_schema, validate};

    const DEMO: &str = r#"
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
    greet:
      desc: Greet someone
      args:
        - name: NAME
        - name: GREETING
          required: false
      options:
        - name: dry-run
          type: flag
        - name: times
          short: t
          type: count
    database:
      desc: Database operations
      subcommands:
        status:
          desc: Show status
          options:
            - name: format
              default: text
"#;

    fn outputs() -> Vec<TargetOutput> {
        let tree = resolve(&validate(parse_schema(DEMO).unwrap()).unwrap());
        let contract = HookContract::derive(&tree).unwrap();
        emit_all(&tree, &contract, &Target::ALL)
    }

    #[test]
    fn test_target_from_str() {
        assert_eq!("node".parse::<Target>().unwrap(), Target::NodeJs);
        assert_eq!("TS".parse::<Target>().unwrap(), Target::TypeScript);
        assert!("cobol".parse::<Target>().is_err());
    }

    #[test]
    fn test_every_target_has_entry_and_stub() {
        for output in outputs() {
            assert!(output.file(FileKind::Entry).is_some(), "{}", output.target);
            assert!(output.file(FileKind::HookStub).is_some(), "{}", output.target);
            assert_eq!(
                output.file(FileKind::Types).is_some(),
                output.target.is_statically_typed(),
                "{}",
                output.target
            );
        }
    }

    #[test]
    fn test_parity_across_targets() {
        // Every entry point names every command, argument, option and hook
        for output in outputs() {
            let entry = &output.file(FileKind::Entry).unwrap().content;
            let stub = &output.file(FileKind::HookStub).unwrap().content;
            for word in [
                "\"simple\"",
                "\"greet\"",
                "\"database\"",
                "\"status\"",
                "\"message\"",
                "\"greeting\"",
                "\"verbose\"",
                "\"dry-run\"",
                "\"times\"",
                "\"format\"",
                "\"config\"",
                "\"1.2.3\"",
                "--version",
            ] {
                assert!(entry.contains(word), "{} entry lacks {}", output.target, word);
            }

            let convention = output.target.convention();
            let hooks: Vec<&str> = match convention {
                HookConvention::PrefixedCamel => vec![
                    "onSimple",
                    "onGreet",
                    "onDatabase",
                    "onDatabaseStatus",
                    "onUnknownCommand",
                ],
                HookConvention::PrefixedSnake => vec![
                    "on_simple",
                    "on_greet",
                    "on_database",
                    "on_database_status",
                    "on_unknown_command",
                ],
            };
            for hook in hooks {
                assert!(entry.contains(hook), "{} entry lacks {}", output.target, hook);
                assert!(stub.contains(hook), "{} stub lacks {}", output.target, hook);
            }
        }
    }

    #[test]
    fn test_emission_is_deterministic() {
        assert_eq!(outputs(), outputs());
    }

    #[test]
    fn test_outputs_follow_requested_order() {
        let targets: Vec<Target> = outputs().iter().map(|o| o.target).collect();
        assert_eq!(targets, Target::ALL.to_vec());
    }
}
