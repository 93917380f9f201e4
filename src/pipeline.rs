//! Generation pipeline
//!
//! validate -> resolve -> derive the hook contract -> emit every target -> write.
//! Nothing is emitted unless the first three steps succeed, and nothing is written
//! unless every target has been emitted.

use crate::completion::{emit_completions, Shell};
use crate::error::Result;
use crate::model::{resolve, HookContract, ResolvedTree};
use crate::render::{emit_all, write_outputs, EmittedFile, FileKind, Target, WriteReport};
use crate::schema::{validate, SchemaDocument};
use std::path::{Path, PathBuf};

/// Output subdirectory holding completion scripts
pub const COMPLETIONS_DIR: &str = "completions";

/// A schema that is ready for emission
#[derive(Debug, Clone)]
pub struct Prepared {
    pub tree: ResolvedTree,
    pub contract: HookContract,
    /// Targets named by the schema, or every target when it names none
    pub default_targets: Vec<Target>,
}

/// Validate, resolve and derive the hook contract of a schema document
pub fn prepare(document: SchemaDocument) -> Result<Prepared> {
    let validated = validate(document)?;
    let tree = resolve(&validated);
    let contract = HookContract::derive(&tree)?;

    let named: Vec<Target> = validated
        .document()
        .targets
        .iter()
        .filter_map(|t| t.parse().ok())
        .collect();
    let default_targets = if named.is_empty() {
        Target::ALL.to_vec()
    } else {
        dedup(named)
    };

    Ok(Prepared {
        tree,
        contract,
        default_targets,
    })
}

fn dedup(targets: Vec<Target>) -> Vec<Target> {
    let mut out: Vec<Target> = Vec::with_capacity(targets.len());
    for target in targets {
        if !out.contains(&target) {
            out.push(target);
        }
    }
    out
}

impl Prepared {
    /// The requested targets, or the defaults when none were requested
    pub fn select_targets(&self, requested: &[Target]) -> Vec<Target> {
        if requested.is_empty() {
            self.default_targets.clone()
        } else {
            dedup(requested.to_vec())
        }
    }

    /// Every file of a build, paths relative to the output directory
    pub fn emit(&self, targets: &[Target]) -> Vec<EmittedFile> {
        let mut files: Vec<EmittedFile> = emit_all(&self.tree, &self.contract, targets)
            .into_iter()
            .flat_map(|output| {
                let dir = output.target.as_str();
                output.files.into_iter().map(move |f| f.within(dir))
            })
            .collect();

        let scripts = emit_completions(&self.tree);
        for shell in Shell::ALL {
            files.push(EmittedFile::new(
                Path::new(COMPLETIONS_DIR).join(shell.script_file_name(&self.tree.name)),
                scripts.get(shell).to_string(),
                FileKind::Completion,
            ));
        }
        files
    }
}

/// Options of one build
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub out_dir: PathBuf,
    /// Empty selects the schema's default targets
    pub targets: Vec<Target>,
    /// Overwrite existing hook stubs
    pub force: bool,
}

/// Emit the selected targets and completions, then write them through staging
pub fn build(prepared: &Prepared, options: &BuildOptions) -> Result<WriteReport> {
    let targets = prepared.select_targets(&options.targets);
    let files = prepared.emit(&targets);
    Ok(write_outputs(&options.out_dir, &files, options.force)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PolycliError;
    use crate::schema::parse_schema;
    use tempfile::TempDir;

    const DEMO: &str = r#"
cli:
  name: demo
  commands:
    hello:
      desc: Say hello
targets: [rust, python, rust]
"#;

    #[test]
    fn test_schema_targets_are_defaults() {
        let prepared = prepare(parse_schema(DEMO).unwrap()).unwrap();
        assert_eq!(prepared.default_targets, vec![Target::Rust, Target::Python]);
        assert_eq!(prepared.select_targets(&[]), vec![Target::Rust, Target::Python]);
        assert_eq!(prepared.select_targets(&[Target::NodeJs]), vec![Target::NodeJs]);
    }

    #[test]
    fn test_emit_places_files_per_target() {
        let prepared = prepare(parse_schema(DEMO).unwrap()).unwrap();
        let files = prepared.emit(&[Target::Python]);
        let paths: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
        assert!(paths.contains(&PathBuf::from("python/cli.py")));
        assert!(paths.contains(&PathBuf::from("python/cli_hooks.py")));
        assert!(paths.contains(&PathBuf::from("completions/demo.bash")));
        assert!(paths.contains(&PathBuf::from("completions/_demo")));
        assert!(paths.contains(&PathBuf::from("completions/demo.fish")));
        assert!(!paths.iter().any(|p| p.starts_with("rust")));
    }

    #[test]
    fn test_collision_stops_before_emission() {
        let yaml = r#"
cli:
  name: demo
  commands:
    build-project: {}
    build_project: {}
"#;
        let err = prepare(parse_schema(yaml).unwrap()).unwrap_err();
        assert!(matches!(err, PolycliError::HookNameCollision(_)));
    }

    #[test]
    fn test_build_writes_output() {
        let temp = TempDir::new().unwrap();
        let prepared = prepare(parse_schema(DEMO).unwrap()).unwrap();
        let options = BuildOptions {
            out_dir: temp.path().join("out"),
            targets: vec![Target::NodeJs],
            force: false,
        };
        let report = build(&prepared, &options).unwrap();
        assert!(temp.path().join("out/nodejs/cli.js").is_file());
        assert!(temp.path().join("out/completions/demo.fish").is_file());
        assert_eq!(report.kept.len(), 0);

        // A second build keeps the user's hooks
        let report = build(&prepared, &options).unwrap();
        assert_eq!(report.kept, vec![PathBuf::from("nodejs/hooks.js")]);
    }
}
