//! Shell completion for generated CLIs
//!
//! Scripts are produced straight from the resolved tree and do not depend on the
//! target runtime. Each script tracks the command path typed so far, then offers the
//! options and immediate subcommands of that level, globals included at every depth.
//! Options and subcommands keep their schema order.

pub mod bash;
pub mod fish;
pub mod install;
pub mod zsh;

pub use install::{install_completion, install_completion_into, install_path, InstallOutcome};

use crate::error::CompletionError;
use crate::model::{ResolvedOption, ResolvedTree};
use crate::schema::OptionKind;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Shells completion scripts are generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

impl Shell {
    pub const ALL: [Shell; 3] = [Shell::Bash, Shell::Zsh, Shell::Fish];

    pub fn as_str(&self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Fish => "fish",
        }
    }

    /// Shell named by a `$SHELL`-style value (`/usr/bin/zsh`)
    pub fn from_shell_path(value: &str) -> Option<Shell> {
        let base = value.rsplit('/').next().unwrap_or(value);
        Shell::ALL.into_iter().find(|s| base.starts_with(s.as_str()))
    }

    /// Shell of the current environment, from `$SHELL`
    pub fn detect() -> Result<Shell, CompletionError> {
        let value = env::var("SHELL").unwrap_or_default();
        Shell::from_shell_path(&value).ok_or(CompletionError::UnsupportedShell(value))
    }

    /// File name of the script under a build's `completions/` directory
    pub fn script_file_name(&self, program: &str) -> String {
        match self {
            Shell::Bash => format!("{}.bash", program),
            Shell::Zsh => format!("_{}", program),
            Shell::Fish => format!("{}.fish", program),
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Shell {
    type Err = CompletionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            "fish" => Ok(Shell::Fish),
            _ => Err(CompletionError::UnsupportedShell(s.to_string())),
        }
    }
}

/// The three script bodies of one tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionScripts {
    pub bash: String,
    pub zsh: String,
    pub fish: String,
}

impl CompletionScripts {
    pub fn get(&self, shell: Shell) -> &str {
        match shell {
            Shell::Bash => &self.bash,
            Shell::Zsh => &self.zsh,
            Shell::Fish => &self.fish,
        }
    }
}

/// Render completion scripts for every shell
pub fn emit_completions(tree: &ResolvedTree) -> CompletionScripts {
    CompletionScripts {
        bash: render(tree, Shell::Bash),
        zsh: render(tree, Shell::Zsh),
        fish: render(tree, Shell::Fish),
    }
}

/// Render the completion script of one shell
pub fn render(tree: &ResolvedTree, shell: Shell) -> String {
    let levels = levels(tree);
    match shell {
        Shell::Bash => bash::render(&tree.name, &levels),
        Shell::Zsh => zsh::render(&tree.name, &levels),
        Shell::Fish => fish::render(&tree.name, &levels),
    }
}

/// What completion offers at one command path
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Level<'a> {
    /// Space-joined path; empty at the root
    pub path: String,
    pub options: Vec<&'a ResolvedOption>,
    /// Immediate subcommands as (name, description)
    pub subcommands: Vec<(&'a str, &'a str)>,
}

fn levels(tree: &ResolvedTree) -> Vec<Level<'_>> {
    tree.root
        .walk()
        .into_iter()
        .map(|command| Level {
            path: command.path.join(" "),
            options: command.effective_options.iter().collect(),
            subcommands: command
                .subcommands
                .iter()
                .map(|s| (s.name.as_str(), s.description.as_str()))
                .collect(),
        })
        .collect()
}

/// Every non-root path, for the path-tracking loop of each script
pub(crate) fn known_paths<'a>(levels: &'a [Level<'a>]) -> Vec<&'a str> {
    levels
        .iter()
        .filter(|l| !l.path.is_empty())
        .map(|l| l.path.as_str())
        .collect()
}

/// `--long` then `-s`, in that order
pub(crate) fn spellings(option: &ResolvedOption) -> Vec<String> {
    let mut out = vec![format!("--{}", option.name)];
    if let Some(c) = option.short {
        out.push(format!("-{}", c));
    }
    out
}

pub(crate) fn takes_value(option: &ResolvedOption) -> bool {
    option.kind == OptionKind::String
}

/// Program name usable inside shell function names
pub(crate) fn function_stem(program: &str) -> String {
    program
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// POSIX single-quoted word
pub(crate) fn sh_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}

/// First line of a description, for one-line completion hints
pub(crate) fn summary(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::resolve;
    use crate::schema::{parse_schema, validate};

    pub(crate) const DEMO: &str = r#"
cli:
  name: demo
  tagline: Demo CLI
  options:
    - name: config
      short: c
      desc: Config file
  commands:
    simple:
      desc: Simple command
      args:
        - name: MESSAGE
      options:
        - name: loud
          type: flag
          desc: Shout it
        - name: dry-run
          type: flag
    greet:
      desc: It's a greeting
    database:
      desc: Database operations
      subcommands:
        status:
          desc: Show status
          options:
            - name: format
              short: f
        migrate:
          desc: Run migrations
"#;

    pub(crate) fn demo_tree() -> ResolvedTree {
        resolve(&validate(parse_schema(DEMO).unwrap()).unwrap())
    }

    #[test]
    fn test_shell_from_str() {
        assert_eq!("ZSH".parse::<Shell>().unwrap(), Shell::Zsh);
        assert!(matches!(
            "powershell".parse::<Shell>(),
            Err(CompletionError::UnsupportedShell(_))
        ));
    }

    #[test]
    fn test_shell_from_path() {
        assert_eq!(Shell::from_shell_path("/usr/bin/fish"), Some(Shell::Fish));
        assert_eq!(Shell::from_shell_path("/bin/bash"), Some(Shell::Bash));
        assert_eq!(Shell::from_shell_path("/bin/tcsh"), None);
        assert_eq!(Shell::from_shell_path(""), None);
    }

    #[test]
    fn test_levels_follow_tree() {
        let tree = demo_tree();
        let levels = levels(&tree);
        let paths: Vec<&str> = levels.iter().map(|l| l.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["", "simple", "greet", "database", "database status", "database migrate"]
        );
        let root_options: Vec<&str> = levels[0].options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(root_options, vec!["help", "version", "verbose", "config"]);
    }

    #[test]
    fn test_every_script_preserves_declaration_order() {
        let scripts = emit_completions(&demo_tree());
        for shell in Shell::ALL {
            let script = scripts.get(shell);
            let ordered = |words: &[&str]| {
                let positions: Vec<usize> = words
                    .iter()
                    .map(|w| script.find(w).unwrap_or_else(|| panic!("{} lacks {}", shell, w)))
                    .collect();
                assert!(positions.windows(2).all(|p| p[0] < p[1]), "{}: {:?}", shell, words);
            };
            ordered(&["simple", "greet", "database"]);
            ordered(&["status", "migrate"]);
            ordered(&["loud", "dry-run"]);
        }
    }

    #[test]
    fn test_globals_offered_at_every_level() {
        let tree = demo_tree();
        for level in levels(&tree) {
            let names: Vec<&str> = level.options.iter().map(|o| o.name.as_str()).collect();
            assert!(names.contains(&"verbose"), "{}", level.path);
            assert!(names.contains(&"config"), "{}", level.path);
            assert!(names.contains(&"help"), "{}", level.path);
        }
    }

    #[test]
    fn test_sh_quote() {
        assert_eq!(sh_quote("It's"), "'It'\\''s'");
        assert_eq!(function_stem("my-cli.v2"), "my_cli_v2");
    }
}
