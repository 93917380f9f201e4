//! Reference dispatcher
//!
//! Runs the dispatch contract of the generated entry points in-process: parse the
//! argument vector against the resolved tree, build the invocation context, look the
//! hook up by its derived name and map the result to an exit status.
//!
//! | situation                          | output                                   | exit |
//! |------------------------------------|------------------------------------------|------|
//! | no arguments, `--help`, `-h`       | usage on stdout                          | 0    |
//! | `--version`                        | version on stdout                        | 0    |
//! | hook absent                        | "not implemented yet" notice on stdout   | 0    |
//! | hook returns an error              | `Error: command '...' failed: ...`       | 1    |
//! | unknown command, no fallback hook  | `Unknown command: ...` on stderr         | 2    |
//! | usage error                        | clap error on stderr                     | 2    |

pub mod command;
pub mod context;
pub mod registry;

pub use command::{arg_id, build_command, option_id};
pub use context::{GlobalValues, InvocationContext, OptionValue};
pub use registry::{HookFn, HookRegistry, HookResult};

use crate::model::{HookConvention, ResolvedCommand, ResolvedOption, ResolvedTree};
use crate::schema::OptionKind;
use clap::ArgMatches;
use std::collections::BTreeMap;

/// Exit status of a failing hook
pub const EXIT_HOOK_FAILED: i32 = 1;

/// Exit status of an unknown command without a fallback hook, and of usage errors
pub const EXIT_USAGE: i32 = 2;

/// Result of one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Hook the invocation was routed to, whether or not it was registered
    pub hook: Option<String>,
    /// Context built for the hook
    pub context: Option<InvocationContext>,
}

impl DispatchOutcome {
    fn output(exit_code: i32, stdout: String) -> Self {
        DispatchOutcome {
            exit_code,
            stdout,
            stderr: String::new(),
            hook: None,
            context: None,
        }
    }

    fn failure(exit_code: i32, stderr: String) -> Self {
        DispatchOutcome {
            exit_code,
            stdout: String::new(),
            stderr,
            hook: None,
            context: None,
        }
    }
}

/// Dispatches argument vectors of the generated CLI to registered hooks
pub struct Dispatcher<'a> {
    tree: &'a ResolvedTree,
    registry: &'a HookRegistry,
    convention: HookConvention,
}

impl<'a> Dispatcher<'a> {
    pub fn new(tree: &'a ResolvedTree, registry: &'a HookRegistry) -> Self {
        Dispatcher {
            tree,
            registry,
            convention: HookConvention::PrefixedSnake,
        }
    }

    /// Select the naming convention hooks are registered under
    pub fn with_convention(mut self, convention: HookConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Dispatch the arguments that follow the program name
    pub fn run<I, S>(&self, args: I) -> DispatchOutcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = vec![self.tree.name.clone()];
        argv.extend(args.into_iter().map(Into::into));

        let matches = match build_command(self.tree).try_get_matches_from(argv) {
            Ok(matches) => matches,
            Err(err) => {
                let rendered = err.render().to_string();
                return if err.use_stderr() {
                    DispatchOutcome::failure(err.exit_code(), rendered)
                } else {
                    DispatchOutcome::output(err.exit_code(), rendered)
                };
            }
        };

        let mut globals = GlobalValues::new(self.tree);
        let mut node = &self.tree.root;
        let mut level = &matches;
        record_globals(node, level, &mut globals);

        while let Some((name, sub_matches)) = level.subcommand() {
            match node.subcommand(name) {
                Some(child) => {
                    node = child;
                    level = sub_matches;
                    record_globals(node, level, &mut globals);
                }
                None => return self.unknown_command(name, globals.finish()),
            }
        }

        if node.is_root() {
            let help = build_command(self.tree).render_help().to_string();
            return DispatchOutcome::output(0, help);
        }

        let context = build_context(node, level, globals.finish());
        self.invoke(node, context)
    }

    fn invoke(&self, node: &ResolvedCommand, context: InvocationContext) -> DispatchOutcome {
        let path = node.path.join(" ");
        let hook = node
            .hook
            .as_ref()
            .map(|names| names.get(self.convention).to_string())
            .unwrap_or_default();

        let mut outcome = match self.registry.get(&hook) {
            Some(hook_fn) => match hook_fn(&context) {
                Ok(code) => DispatchOutcome::output(code.unwrap_or(0), String::new()),
                Err(e) => DispatchOutcome::failure(
                    EXIT_HOOK_FAILED,
                    format!("Error: command '{}' failed: {}\n", path, e),
                ),
            },
            None => DispatchOutcome::output(
                0,
                format!(
                    "{} executed successfully (hook '{}' not implemented yet)\n",
                    path, hook
                ),
            ),
        };
        outcome.hook = Some(hook);
        outcome.context = Some(context);
        outcome
    }

    fn unknown_command(
        &self,
        attempted: &str,
        global_options: BTreeMap<String, OptionValue>,
    ) -> DispatchOutcome {
        let hook = self.convention.unknown_command_hook().to_string();
        let mut args = BTreeMap::new();
        args.insert("command".to_string(), Some(attempted.to_string()));
        let context = InvocationContext {
            command_name: attempted.to_string(),
            args,
            options: BTreeMap::new(),
            global_options,
        };

        let mut outcome = match self.registry.get(&hook) {
            Some(hook_fn) => match hook_fn(&context) {
                Ok(code) => DispatchOutcome::output(code.unwrap_or(0), String::new()),
                Err(e) => DispatchOutcome::failure(
                    EXIT_HOOK_FAILED,
                    format!("Error: command '{}' failed: {}\n", attempted, e),
                ),
            },
            None => DispatchOutcome::failure(EXIT_USAGE, format!("Unknown command: {}\n", attempted)),
        };
        outcome.hook = Some(hook);
        outcome.context = Some(context);
        outcome
    }
}

fn record_globals(node: &ResolvedCommand, matches: &ArgMatches, globals: &mut GlobalValues<'_>) {
    for option in node.inherited_globals() {
        globals.record(option, read_value(option, matches));
    }
}

fn build_context(
    node: &ResolvedCommand,
    matches: &ArgMatches,
    global_options: BTreeMap<String, OptionValue>,
) -> InvocationContext {
    let mut context = InvocationContext::empty_for(node);
    for arg in &node.arguments {
        let value = matches.get_one::<String>(&arg_id(&arg.key)).cloned();
        context.args.insert(arg.key.clone(), value);
    }
    for option in &node.options {
        let value = match read_value(option, matches) {
            OptionValue::Bool(false) | OptionValue::Count(0) | OptionValue::Null => {
                OptionValue::initial(option)
            }
            supplied => supplied,
        };
        context.options.insert(option.name.clone(), value);
    }
    context.global_options = global_options;
    context
}

/// Raw value of one option at one level; `Null`, `false` or `0` when not supplied
fn read_value(option: &ResolvedOption, matches: &ArgMatches) -> OptionValue {
    let id = option_id(option);
    match option.kind {
        OptionKind::Flag => OptionValue::Bool(matches.get_flag(&id)),
        OptionKind::Count => OptionValue::Count(u64::from(matches.get_count(&id))),
        OptionKind::String => matches
            .get_one::<String>(&id)
            .map(|s| OptionValue::Str(s.clone()))
            .unwrap_or(OptionValue::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::resolve;
    use crate::schema::{parse_schema, validate};
    use std::sync::{Arc, Mutex};

    const DEMO: &str = r#"
cli:
  name: demo
  tagline: Demo CLI
  version: 1.2.3
  options:
    - name: config
      short: c
      default: app.toml
  commands:
    simple:
      desc: Simple command
      args:
        - name: MESSAGE
      options:
        - name: verbose
          type: flag
    greet:
      args:
        - name: NAME
        - name: GREETING
          required: false
      options:
        - name: shout
          short: s
          type: flag
        - name: times
          type: count
          short: t
        - name: format
          default: text
    database:
      desc: Database operations
      subcommands:
        status:
          desc: Show status
"#;

    fn tree() -> ResolvedTree {
        resolve(&validate(parse_schema(DEMO).unwrap()).unwrap())
    }

    fn recording(name: &str) -> (HookRegistry, Arc<Mutex<Vec<InvocationContext>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut registry = HookRegistry::new();
        registry.register(name, move |ctx| {
            sink.lock().unwrap().push(ctx.clone());
            Ok(None)
        });
        (registry, seen)
    }

    #[test]
    fn test_simple_scenario_snake() {
        let tree = tree();
        let (registry, seen) = recording("on_simple");
        let outcome = Dispatcher::new(&tree, &registry).run(["simple", "hi", "--verbose"]);

        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.hook.as_deref(), Some("on_simple"));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let ctx = &seen[0];
        assert_eq!(ctx.command_name, "simple");
        assert_eq!(ctx.arg("message"), Some("hi"));
        assert_eq!(ctx.option("verbose"), Some(&OptionValue::Bool(true)));
    }

    #[test]
    fn test_simple_scenario_camel() {
        let tree = tree();
        let (registry, seen) = recording("onSimple");
        let outcome = Dispatcher::new(&tree, &registry)
            .with_convention(HookConvention::PrefixedCamel)
            .run(["simple", "hi", "--verbose"]);

        assert_eq!(outcome.exit_code, 0);
        assert_eq!(seen.lock().unwrap()[0].arg("message"), Some("hi"));
    }

    #[test]
    fn test_absent_hook_falls_back() {
        let tree = tree();
        let registry = HookRegistry::new();
        let outcome = Dispatcher::new(&tree, &registry).run(["database", "status"]);

        assert_eq!(outcome.exit_code, 0);
        assert_eq!(
            outcome.stdout,
            "database status executed successfully (hook 'on_database_status' not implemented yet)\n"
        );
    }

    #[test]
    fn test_unknown_command_dispatches_to_fallback() {
        let tree = tree();
        let (registry, seen) = recording("on_unknown_command");
        let outcome = Dispatcher::new(&tree, &registry).run(["totally-unknown-command"]);

        assert_eq!(outcome.exit_code, 0);
        let ctx = &seen.lock().unwrap()[0];
        assert_eq!(ctx.command_name, "totally-unknown-command");
        assert_eq!(ctx.arg("command"), Some("totally-unknown-command"));
    }

    #[test]
    fn test_unknown_command_without_fallback_fails() {
        let tree = tree();
        let registry = HookRegistry::new();
        let outcome = Dispatcher::new(&tree, &registry).run(["totally-unknown-command"]);

        assert_eq!(outcome.exit_code, EXIT_USAGE);
        assert_eq!(outcome.stderr, "Unknown command: totally-unknown-command\n");
    }

    #[test]
    fn test_hook_error_exits_non_zero() {
        let tree = tree();
        let mut registry = HookRegistry::new();
        registry.register("on_database_status", |_| anyhow::bail!("connection refused"));
        let outcome = Dispatcher::new(&tree, &registry).run(["database", "status"]);

        assert_eq!(outcome.exit_code, EXIT_HOOK_FAILED);
        assert_eq!(
            outcome.stderr,
            "Error: command 'database status' failed: connection refused\n"
        );
    }

    #[test]
    fn test_hook_exit_code_is_propagated() {
        let tree = tree();
        let mut registry = HookRegistry::new();
        registry.register("on_database", |_| Ok(Some(4)));
        let outcome = Dispatcher::new(&tree, &registry).run(["database"]);
        assert_eq!(outcome.exit_code, 4);
    }

    #[test]
    fn test_help_and_version_exit_zero() {
        let tree = tree();
        let registry = HookRegistry::new();
        let dispatcher = Dispatcher::new(&tree, &registry);

        let outcome = dispatcher.run(Vec::<String>::new());
        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.stdout.contains("simple"));

        let outcome = dispatcher.run(["database", "status", "--help"]);
        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.stdout.contains("Show status"));

        let outcome = dispatcher.run(["database", "--version"]);
        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.stdout.contains("1.2.3"));
    }

    #[test]
    fn test_missing_required_argument_is_usage_error() {
        let tree = tree();
        let registry = HookRegistry::new();
        let outcome = Dispatcher::new(&tree, &registry).run(["simple"]);
        assert_eq!(outcome.exit_code, EXIT_USAGE);
        assert!(!outcome.stderr.is_empty());
    }

    #[test]
    fn test_option_kinds_and_defaults() {
        let tree = tree();
        let (registry, seen) = recording("on_greet");
        Dispatcher::new(&tree, &registry).run(["greet", "ada", "-s", "-tt"]);

        let ctx = &seen.lock().unwrap()[0];
        assert_eq!(ctx.arg("name"), Some("ada"));
        assert_eq!(ctx.args["greeting"], None);
        assert_eq!(ctx.option("shout"), Some(&OptionValue::Bool(true)));
        assert_eq!(ctx.option("times"), Some(&OptionValue::Count(2)));
        assert_eq!(ctx.option("format"), Some(&OptionValue::Str("text".to_string())));
    }

    #[test]
    fn test_globals_forwarded_from_any_level() {
        let tree = tree();
        let (registry, seen) = recording("on_database_status");
        Dispatcher::new(&tree, &registry).run(["-v", "database", "status", "-c", "prod.toml"]);

        let ctx = &seen.lock().unwrap()[0];
        assert_eq!(ctx.global("verbose"), Some(&OptionValue::Bool(true)));
        assert_eq!(
            ctx.global("config"),
            Some(&OptionValue::Str("prod.toml".to_string()))
        );
        assert!(ctx.global("help").is_none());
        assert!(ctx.options.is_empty());
    }

    #[test]
    fn test_global_default_applies() {
        let tree = tree();
        let (registry, seen) = recording("on_database");
        Dispatcher::new(&tree, &registry).run(["database"]);

        let ctx = &seen.lock().unwrap()[0];
        assert_eq!(
            ctx.global("config"),
            Some(&OptionValue::Str("app.toml".to_string()))
        );
        assert_eq!(ctx.global("verbose"), Some(&OptionValue::Bool(false)));
    }
}
