//! Hook naming contract
//!
//! Every command path maps to one hook identifier per naming convention. Both
//! conventions are derived from the same resolved path, so a hook author can
//! predict the name for any target:
//!
//! | path                  | prefixed-camel     | prefixed-snake       |
//! |-----------------------|--------------------|----------------------|
//! | `database`            | `onDatabase`       | `on_database`        |
//! | `build project`       | `onBuildProject`   | `on_build_project`   |
//!
//! Derivation must be injective over a tree; collisions are rejected before any
//! file is emitted.

use crate::error::{HookCollisionError, HookNameCollision};
use crate::model::naming::{pascal_case, snake_case};
use crate::model::tree::{CommandPath, ResolvedTree};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Fallback hook for command names that match nothing in the tree (camel form)
pub const UNKNOWN_COMMAND_HOOK_CAMEL: &str = "onUnknownCommand";

/// Fallback hook for command names that match nothing in the tree (snake form)
pub const UNKNOWN_COMMAND_HOOK_SNAKE: &str = "on_unknown_command";

/// Label used for the fallback hook in diagnostics
const UNKNOWN_COMMAND_LABEL: &str = "<unknown command>";

/// Hook naming conventions used by the emitters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookConvention {
    /// `"on" + PascalCase segments`
    PrefixedCamel,
    /// `"on_" + snake_case segments joined by "_"`
    PrefixedSnake,
}

impl HookConvention {
    pub const ALL: [HookConvention; 2] =
        [HookConvention::PrefixedCamel, HookConvention::PrefixedSnake];

    pub fn unknown_command_hook(&self) -> &'static str {
        match self {
            HookConvention::PrefixedCamel => UNKNOWN_COMMAND_HOOK_CAMEL,
            HookConvention::PrefixedSnake => UNKNOWN_COMMAND_HOOK_SNAKE,
        }
    }
}

impl fmt::Display for HookConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookConvention::PrefixedCamel => write!(f, "camel"),
            HookConvention::PrefixedSnake => write!(f, "snake"),
        }
    }
}

impl FromStr for HookConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "camel" | "prefixed-camel" => Ok(HookConvention::PrefixedCamel),
            "snake" | "prefixed-snake" => Ok(HookConvention::PrefixedSnake),
            other => Err(format!(
                "unknown hook convention '{}' (expected camel or snake)",
                other
            )),
        }
    }
}

/// Derive the hook identifier for a command path
pub fn derive_hook_name(path: &CommandPath, convention: HookConvention) -> String {
    match convention {
        HookConvention::PrefixedCamel => {
            let body: String = path.segments().iter().map(|s| pascal_case(s)).collect();
            format!("on{}", body)
        }
        HookConvention::PrefixedSnake => {
            let parts: Vec<String> = path.segments().iter().map(|s| snake_case(s)).collect();
            format!("on_{}", parts.join("_"))
        }
    }
}

/// Both hook names of one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookNames {
    pub camel: String,
    pub snake: String,
}

impl HookNames {
    pub fn get(&self, convention: HookConvention) -> &str {
        match convention {
            HookConvention::PrefixedCamel => &self.camel,
            HookConvention::PrefixedSnake => &self.snake,
        }
    }
}

/// Derive both names for a path
pub fn derive_hook_names(path: &CommandPath) -> HookNames {
    HookNames {
        camel: derive_hook_name(path, HookConvention::PrefixedCamel),
        snake: derive_hook_name(path, HookConvention::PrefixedSnake),
    }
}

/// One dispatchable command in the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookEntry {
    pub path: CommandPath,
    pub description: String,
    pub names: HookNames,
}

/// The checked mapping from command paths to hook identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookContract {
    entries: Vec<HookEntry>,
}

impl HookContract {
    /// Collect the hook names of every command and reject collisions
    pub fn derive(tree: &ResolvedTree) -> Result<Self, HookCollisionError> {
        let entries: Vec<HookEntry> = tree
            .commands()
            .into_iter()
            .filter_map(|command| {
                command.hook.as_ref().map(|names| HookEntry {
                    path: command.path.clone(),
                    description: command.description.clone(),
                    names: names.clone(),
                })
            })
            .collect();

        let mut collisions: Vec<HookNameCollision> = Vec::new();
        for convention in HookConvention::ALL {
            let mut owners: HashMap<&str, String> = HashMap::new();
            owners.insert(
                convention.unknown_command_hook(),
                UNKNOWN_COMMAND_LABEL.to_string(),
            );

            for entry in &entries {
                let hook = entry.names.get(convention);
                let label = entry.path.to_string();
                match owners.get(hook) {
                    Some(first) => {
                        let already_reported = collisions
                            .iter()
                            .any(|c| &c.first == first && c.second == label);
                        if !already_reported {
                            collisions.push(HookNameCollision {
                                hook: hook.to_string(),
                                first: first.clone(),
                                second: label,
                            });
                        }
                    }
                    None => {
                        owners.insert(hook, label);
                    }
                }
            }
        }

        if collisions.is_empty() {
            Ok(HookContract { entries })
        } else {
            Err(HookCollisionError { collisions })
        }
    }

    /// Dispatchable commands, depth-first in declaration order
    pub fn entries(&self) -> &[HookEntry] {
        &self.entries
    }

    /// Every hook name under a convention, the unknown-command fallback last
    pub fn names(&self, convention: HookConvention) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.iter().map(|e| e.names.get(convention)).collect();
        names.push(convention.unknown_command_hook());
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tree::resolve;
    use crate::schema::{parse_schema, validate, CommandSpec, NamedCommand};

    fn path(segments: &[&str]) -> CommandPath {
        CommandPath::from_segments(segments.iter().copied())
    }

    #[test]
    fn test_prefixed_camel() {
        let conv = HookConvention::PrefixedCamel;
        assert_eq!(derive_hook_name(&path(&["database"]), conv), "onDatabase");
        assert_eq!(
            derive_hook_name(&path(&["build", "project"]), conv),
            "onBuildProject"
        );
        assert_eq!(derive_hook_name(&path(&["dry-run"]), conv), "onDryRun");
    }

    #[test]
    fn test_prefixed_snake() {
        let conv = HookConvention::PrefixedSnake;
        assert_eq!(
            derive_hook_name(&path(&["build", "project"]), conv),
            "on_build_project"
        );
        assert_eq!(derive_hook_name(&path(&["simple"]), conv), "on_simple");
        assert_eq!(
            derive_hook_name(&path(&["hello-world"]), conv),
            "on_hello_world"
        );
    }

    #[test]
    fn test_convention_from_str() {
        assert_eq!(
            "camel".parse::<HookConvention>().unwrap(),
            HookConvention::PrefixedCamel
        );
        assert_eq!(
            "prefixed-snake".parse::<HookConvention>().unwrap(),
            HookConvention::PrefixedSnake
        );
        assert!("kebab".parse::<HookConvention>().is_err());
    }

    #[test]
    fn test_contract_lists_all_paths() {
        let yaml = r#"
cli:
  name: demo
  commands:
    simple: { desc: Simple }
    database:
      subcommands:
        status: { desc: Status }
"#;
        let tree = resolve(&validate(parse_schema(yaml).unwrap()).unwrap());
        let contract = HookContract::derive(&tree).unwrap();
        assert_eq!(
            contract.names(HookConvention::PrefixedSnake),
            vec![
                "on_simple",
                "on_database",
                "on_database_status",
                "on_unknown_command"
            ]
        );
        let status = &contract.entries()[2];
        assert_eq!(status.path, path(&["database", "status"]));
        assert_eq!(
            status.names.get(HookConvention::PrefixedCamel),
            "onDatabaseStatus"
        );
    }

    #[test]
    fn test_collision_names_both_paths() {
        let mut document = parse_schema("cli:\n  name: demo\n").unwrap();
        let mut build = CommandSpec::default();
        build
            .subcommands
            .push(NamedCommand::new("project", CommandSpec::default()));
        document.cli.commands.push(NamedCommand::new("build", build));
        document
            .cli
            .commands
            .push(NamedCommand::new("build-project", CommandSpec::default()));

        let tree = resolve(&validate(document).unwrap());
        let err = HookContract::derive(&tree).unwrap_err();
        assert_eq!(err.collisions.len(), 1);
        let collision = &err.collisions[0];
        assert_eq!(collision.hook, "onBuildProject");
        assert_eq!(collision.first, "build project");
        assert_eq!(collision.second, "build-project");
    }

    #[test]
    fn test_collision_with_unknown_command_hook() {
        let yaml = r#"
cli:
  name: demo
  commands:
    unknown-command: { desc: Oops }
"#;
        let tree = resolve(&validate(parse_schema(yaml).unwrap()).unwrap());
        let err = HookContract::derive(&tree).unwrap_err();
        assert_eq!(err.collisions[0].first, "<unknown command>");
        assert_eq!(err.collisions[0].second, "unknown-command");
    }

    #[test]
    fn test_case_only_difference_collides() {
        let mut document = parse_schema("cli:\n  name: demo\n").unwrap();
        document
            .cli
            .commands
            .push(NamedCommand::new("Deploy", CommandSpec::default()));
        document
            .cli
            .commands
            .push(NamedCommand::new("deploy", CommandSpec::default()));
        let tree = resolve(&validate(document).unwrap());
        assert!(HookContract::derive(&tree).is_err());
    }
}
