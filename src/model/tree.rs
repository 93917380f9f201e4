//! Resolved command tree
//!
//! The resolved tree is the single artifact every generator stage consumes. It is
//! a pure function of a validated schema: each command carries its fully-qualified
//! path, its own options, its effective options (own options plus inherited global
//! options, own declarations taking precedence) and its derived hook names.

use crate::model::hooks::{derive_hook_names, HookNames};
use crate::schema::{
    CommandSpec, DefaultValue, NamedCommand, OptionKind, OptionSpec, ValidatedSchema,
};
use std::fmt;

/// Version used when the schema does not declare one
pub const DEFAULT_VERSION: &str = "0.1.0";

/// Ancestor names plus the command's own name; empty for the root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandPath(Vec<String>);

impl CommandPath {
    pub fn root() -> Self {
        CommandPath(Vec::new())
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandPath(segments.into_iter().map(Into::into).collect())
    }

    /// Path of a direct child
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        CommandPath(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Leaf name, or `None` for the root
    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Segments joined with `sep`
    pub fn join(&self, sep: &str) -> String {
        self.0.join(sep)
    }
}

impl fmt::Display for CommandPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0.join(" "))
        }
    }
}

/// Where an effective option comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionOrigin {
    /// Declared on the command itself
    Local,
    /// Inherited global option whose value is forwarded into `globalOptions`
    Global,
    /// `--help` or `--version`; handled by the entry point, never forwarded
    Builtin,
}

/// A fully resolved option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOption {
    pub name: String,
    pub short: Option<char>,
    pub description: String,
    pub kind: OptionKind,
    pub default: Option<DefaultValue>,
    pub origin: OptionOrigin,
}

impl ResolvedOption {
    fn from_spec(spec: &OptionSpec, origin: OptionOrigin) -> Self {
        // Type and default were checked by the validator
        let kind = OptionKind::parse(&spec.option_type).unwrap_or(OptionKind::String);
        ResolvedOption {
            name: spec.name.clone(),
            short: spec.short.as_deref().and_then(|s| s.chars().next()),
            description: spec.desc.clone(),
            kind,
            default: spec
                .default
                .as_ref()
                .and_then(|value| DefaultValue::from_yaml(kind, value)),
            origin,
        }
    }

    fn builtin(name: &str, short: Option<char>, description: &str, origin: OptionOrigin) -> Self {
        ResolvedOption {
            name: name.to_string(),
            short,
            description: description.to_string(),
            kind: OptionKind::Flag,
            default: None,
            origin,
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.origin == OptionOrigin::Builtin
    }
}

/// A positional argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArgument {
    /// Name as declared (`MESSAGE`)
    pub name: String,
    /// Key used in the invocation context (`message`)
    pub key: String,
    pub description: String,
    pub required: bool,
}

/// Options every command inherits
///
/// `--help`, `--version` and `--verbose` are always present; options declared under
/// `cli.options` are appended in declaration order, and a declared `verbose`
/// replaces the implicit one in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalOptions {
    options: Vec<ResolvedOption>,
}

impl GlobalOptions {
    /// The always-present globals
    pub fn implicit() -> Self {
        GlobalOptions {
            options: vec![
                ResolvedOption::builtin(
                    "help",
                    Some('h'),
                    "Show help information",
                    OptionOrigin::Builtin,
                ),
                ResolvedOption::builtin(
                    "version",
                    None,
                    "Show version information",
                    OptionOrigin::Builtin,
                ),
                ResolvedOption::builtin(
                    "verbose",
                    Some('v'),
                    "Enable verbose output",
                    OptionOrigin::Global,
                ),
            ],
        }
    }

    /// Implicit globals merged with the schema's declared globals
    pub fn with_declared(declared: &[OptionSpec]) -> Self {
        let mut globals = Self::implicit();
        for spec in declared {
            let option = ResolvedOption::from_spec(spec, OptionOrigin::Global);
            match globals.options.iter_mut().find(|o| o.name == option.name) {
                Some(existing) => *existing = option,
                None => globals.options.push(option),
            }
        }
        globals
    }

    /// Every global, builtins included
    pub fn all(&self) -> &[ResolvedOption] {
        &self.options
    }

    /// Globals whose values are forwarded to hooks
    pub fn forwarded(&self) -> impl Iterator<Item = &ResolvedOption> {
        self.options.iter().filter(|o| !o.is_builtin())
    }
}

/// A command with everything the emitters need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub name: String,
    pub description: String,
    pub path: CommandPath,
    pub arguments: Vec<ResolvedArgument>,
    /// Options declared on this command
    pub options: Vec<ResolvedOption>,
    /// Own options followed by inherited globals that are not shadowed
    pub effective_options: Vec<ResolvedOption>,
    /// Derived hook names; `None` for the root, which only prints help
    pub hook: Option<HookNames>,
    pub subcommands: Vec<ResolvedCommand>,
}

impl ResolvedCommand {
    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }

    pub fn subcommand(&self, name: &str) -> Option<&ResolvedCommand> {
        self.subcommands.iter().find(|c| c.name == name)
    }

    /// Inherited global options visible at this command (shadowed ones excluded)
    pub fn inherited_globals(&self) -> impl Iterator<Item = &ResolvedOption> {
        self.effective_options
            .iter()
            .filter(|o| o.origin == OptionOrigin::Global)
    }

    /// This command and all descendants, depth-first in declaration order
    pub fn walk(&self) -> Vec<&ResolvedCommand> {
        let mut out = vec![self];
        for sub in &self.subcommands {
            out.extend(sub.walk());
        }
        out
    }
}

/// The complete, immutable command hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTree {
    pub name: String,
    pub tagline: String,
    pub description: Option<String>,
    pub version: String,
    pub globals: GlobalOptions,
    pub root: ResolvedCommand,
}

impl ResolvedTree {
    /// Every command except the root, depth-first in declaration order
    pub fn commands(&self) -> Vec<&ResolvedCommand> {
        self.root.walk().into_iter().skip(1).collect()
    }

    /// Look a command up by its path segments
    pub fn find(&self, segments: &[&str]) -> Option<&ResolvedCommand> {
        let mut node = &self.root;
        for segment in segments {
            node = node.subcommand(segment)?;
        }
        Some(node)
    }
}

/// Resolve a validated schema into the command tree
pub fn resolve(schema: &ValidatedSchema) -> ResolvedTree {
    let cli = &schema.document().cli;
    let globals = GlobalOptions::with_declared(&cli.options);

    let root = ResolvedCommand {
        name: cli.name.clone(),
        description: cli.tagline.clone(),
        path: CommandPath::root(),
        arguments: Vec::new(),
        options: Vec::new(),
        effective_options: globals.all().to_vec(),
        hook: None,
        subcommands: cli
            .commands
            .iter()
            .map(|c| resolve_command(c, &CommandPath::root(), &globals))
            .collect(),
    };

    ResolvedTree {
        name: cli.name.clone(),
        tagline: cli.tagline.clone(),
        description: cli.description.clone(),
        version: cli
            .version
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        globals,
        root,
    }
}

fn resolve_command(
    command: &NamedCommand,
    parent: &CommandPath,
    globals: &GlobalOptions,
) -> ResolvedCommand {
    let spec: &CommandSpec = &command.spec;
    let path = parent.child(&command.name);

    let options: Vec<ResolvedOption> = spec
        .options
        .iter()
        .map(|o| ResolvedOption::from_spec(o, OptionOrigin::Local))
        .collect();

    ResolvedCommand {
        name: command.name.clone(),
        description: spec.desc.clone(),
        arguments: spec
            .args
            .iter()
            .map(|a| ResolvedArgument {
                name: a.name.clone(),
                key: a.name.to_lowercase(),
                description: a.desc.clone(),
                required: a.required,
            })
            .collect(),
        effective_options: merge_effective(&options, globals),
        hook: Some(derive_hook_names(&path)),
        subcommands: spec
            .subcommands
            .iter()
            .map(|c| resolve_command(c, &path, globals))
            .collect(),
        options,
        path,
    }
}

/// Own options first, then globals not shadowed by name; a global whose short alias
/// is taken by an own option keeps only its long form
fn merge_effective(own: &[ResolvedOption], globals: &GlobalOptions) -> Vec<ResolvedOption> {
    let mut effective = own.to_vec();
    for global in globals.all() {
        if own.iter().any(|o| o.name == global.name) {
            continue;
        }
        let mut inherited = global.clone();
        if inherited.short.is_some() && own.iter().any(|o| o.short == inherited.short) {
            inherited.short = None;
        }
        effective.push(inherited);
    }
    effective
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{parse_schema, validate};

    fn tree_for(yaml: &str) -> ResolvedTree {
        resolve(&validate(parse_schema(yaml).unwrap()).unwrap())
    }

    const DEMO: &str = r#"
cli:
  name: demo
  tagline: Demo CLI
  version: 2.0.0
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
        - name: verbose
          type: flag
    database:
      desc: Database operations
      options:
        - name: value
          short: v
      subcommands:
        status:
          desc: Show status
"#;

    #[test]
    fn test_paths() {
        let tree = tree_for(DEMO);
        let paths: Vec<String> = tree.commands().iter().map(|c| c.path.join(" ")).collect();
        assert_eq!(paths, vec!["simple", "database", "database status"]);
        assert!(tree.root.is_root());
        assert_eq!(tree.version, "2.0.0");
    }

    #[test]
    fn test_globals_are_implicit_plus_declared() {
        let tree = tree_for(DEMO);
        let names: Vec<&str> = tree.globals.all().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["help", "version", "verbose", "config"]);
        let forwarded: Vec<&str> = tree.globals.forwarded().map(|o| o.name.as_str()).collect();
        assert_eq!(forwarded, vec!["verbose", "config"]);
    }

    #[test]
    fn test_own_option_shadows_global() {
        let tree = tree_for(DEMO);
        let simple = tree.find(&["simple"]).unwrap();
        let verbose: Vec<&ResolvedOption> = simple
            .effective_options
            .iter()
            .filter(|o| o.name == "verbose")
            .collect();
        assert_eq!(verbose.len(), 1);
        assert_eq!(verbose[0].origin, OptionOrigin::Local);
        assert_eq!(verbose[0].short, None);
    }

    #[test]
    fn test_global_loses_short_taken_by_own_option() {
        let tree = tree_for(DEMO);
        let database = tree.find(&["database"]).unwrap();
        let global_verbose = database
            .effective_options
            .iter()
            .find(|o| o.name == "verbose")
            .unwrap();
        assert_eq!(global_verbose.origin, OptionOrigin::Global);
        assert_eq!(global_verbose.short, None);

        // Nested commands do not inherit the parent's own options
        let status = tree.find(&["database", "status"]).unwrap();
        let verbose = status
            .effective_options
            .iter()
            .find(|o| o.name == "verbose")
            .unwrap();
        assert_eq!(verbose.short, Some('v'));
        assert!(status.effective_options.iter().all(|o| o.name != "value"));
    }

    #[test]
    fn test_effective_option_order() {
        let tree = tree_for(DEMO);
        let database = tree.find(&["database"]).unwrap();
        let names: Vec<&str> = database
            .effective_options
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(names, vec!["value", "help", "version", "verbose", "config"]);
    }

    #[test]
    fn test_argument_keys() {
        let tree = tree_for(DEMO);
        let simple = tree.find(&["simple"]).unwrap();
        assert_eq!(simple.arguments[0].name, "MESSAGE");
        assert_eq!(simple.arguments[0].key, "message");
    }

    #[test]
    fn test_hook_names_attached() {
        let tree = tree_for(DEMO);
        assert!(tree.root.hook.is_none());
        let status = tree.find(&["database", "status"]).unwrap();
        let hook = status.hook.as_ref().unwrap();
        assert_eq!(hook.camel, "onDatabaseStatus");
        assert_eq!(hook.snake, "on_database_status");
    }

    #[test]
    fn test_declared_verbose_replaces_implicit() {
        let tree = tree_for(
            r#"
cli:
  name: demo
  options:
    - name: verbose
      short: v
      type: count
"#,
        );
        let verbose = tree
            .globals
            .all()
            .iter()
            .find(|o| o.name == "verbose")
            .unwrap();
        assert_eq!(verbose.kind, OptionKind::Count);
        assert_eq!(tree.globals.all().len(), 3);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        assert_eq!(tree_for(DEMO), tree_for(DEMO));
    }

    #[test]
    fn test_default_version() {
        let tree = tree_for("cli:\n  name: demo\n");
        assert_eq!(tree.version, DEFAULT_VERSION);
        assert!(tree.commands().is_empty());
    }
}
