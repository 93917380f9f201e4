//! Rust target (clap builder)
//!
//! The generated program describes the command tree as a static table and builds
//! its clap command from it at startup, the same way the in-process dispatcher
//! does. Hooks are plain functions collected in an explicit registry, so a missing
//! hook is a missing map entry rather than a failed lookup by reflection.

use crate::model::{pascal_case, HookConvention};
use crate::render::doc::{CliDocument, CommandDoc, OptionDoc};
use crate::render::writer::{rust_ident, rust_str, type_name, CodeWriter};
use crate::render::{banner, EmittedFile, Emitter, FileKind, Target};
use crate::schema::{DefaultValue, OptionKind};

const CONVENTION: HookConvention = HookConvention::PrefixedSnake;

/// clap version the generated crate depends on
pub const CLAP_VERSION: &str = "4.5";

pub struct RustEmitter;

impl Emitter for RustEmitter {
    fn target(&self) -> Target {
        Target::Rust
    }

    fn emit(&self, doc: &CliDocument) -> Vec<EmittedFile> {
        vec![
            EmittedFile::new("src/main.rs", render_main(doc), FileKind::Entry),
            EmittedFile::new("src/hooks.rs", render_hooks(doc), FileKind::HookStub),
            EmittedFile::new("src/types.rs", render_types(doc), FileKind::Types),
            EmittedFile::new("Cargo.toml", render_manifest(doc), FileKind::Manifest),
        ]
    }
}

/// Struct-name stem of a command (`DatabaseStatus`)
fn type_stem(command: &CommandDoc) -> String {
    type_name(&pascal_case(&command.ident()))
}

const PRELUDE: &str = r#"mod hooks;
mod types;

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::{BTreeMap, HashMap};
use std::process;
use types::{HookResult, InvocationContext, OptionValue};

#[allow(dead_code)]
#[derive(Clone, Copy, PartialEq)]
enum Kind {
    Flag,
    Count,
    Str,
}

#[allow(dead_code)]
#[derive(Clone, Copy)]
enum OptDefault {
    None,
    Bool(bool),
    Count(u64),
    Str(&'static str),
}

struct Opt {
    name: &'static str,
    id: &'static str,
    short: Option<char>,
    help: &'static str,
    kind: Kind,
    value_name: &'static str,
    default: OptDefault,
}

struct Positional {
    id: &'static str,
    key: &'static str,
    value_name: &'static str,
    help: &'static str,
    required: bool,
}

struct Node {
    name: &'static str,
    about: &'static str,
    path: &'static str,
    hook: &'static str,
    args: &'static [Positional],
    options: &'static [Opt],
    globals: &'static [Opt],
    subcommands: &'static [Node],
}
"#;

const RUNTIME: &str = r#"type Registry = HashMap<&'static str, fn(&InvocationContext) -> HookResult>;

// --version at every level; -h/--help comes from clap
fn build(node: &Node, cmd: Command) -> Command {
    let mut cmd = cmd
        .about(node.about)
        .version(VERSION)
        .disable_version_flag(true)
        .disable_help_subcommand(true)
        .arg(
            Arg::new("version")
                .long("version")
                .action(ArgAction::Version)
                .help("Print version"),
        );

    for arg in node.args {
        cmd = cmd.arg(
            Arg::new(arg.id)
                .value_name(arg.value_name)
                .help(arg.help)
                .required(arg.required),
        );
    }

    for opt in node.options.iter().chain(node.globals) {
        let mut arg = Arg::new(opt.id).long(opt.name).help(opt.help);
        if let Some(c) = opt.short {
            arg = arg.short(c);
        }
        arg = match opt.kind {
            Kind::Flag => arg.action(ArgAction::SetTrue),
            Kind::Count => arg.action(ArgAction::Count),
            Kind::Str => arg.action(ArgAction::Set).value_name(opt.value_name),
        };
        cmd = cmd.arg(arg);
    }

    for sub in node.subcommands {
        cmd = cmd.subcommand(build(sub, Command::new(sub.name)));
    }
    cmd
}

fn root_command() -> Command {
    build(&ROOT, Command::new(ROOT.name)).allow_external_subcommands(true)
}

/// Value supplied at one level; `false`, `0` or null when absent
fn read(opt: &Opt, matches: &ArgMatches) -> OptionValue {
    match opt.kind {
        Kind::Flag => OptionValue::Bool(matches.get_flag(opt.id)),
        Kind::Count => OptionValue::Count(u64::from(matches.get_count(opt.id))),
        Kind::Str => matches
            .get_one::<String>(opt.id)
            .map(|s| OptionValue::Str(s.clone()))
            .unwrap_or(OptionValue::Null),
    }
}

/// Value of an option nobody supplied
fn initial(opt: &Opt) -> OptionValue {
    match (opt.kind, opt.default) {
        (Kind::Flag, OptDefault::Bool(b)) => OptionValue::Bool(b),
        (Kind::Flag, _) => OptionValue::Bool(false),
        (Kind::Count, OptDefault::Count(n)) => OptionValue::Count(n),
        (Kind::Count, _) => OptionValue::Count(0),
        (Kind::Str, OptDefault::Str(s)) => OptionValue::Str(s.to_string()),
        (Kind::Str, _) => OptionValue::Null,
    }
}

fn or_initial(opt: &Opt, value: OptionValue) -> OptionValue {
    match value {
        OptionValue::Bool(false) | OptionValue::Count(0) | OptionValue::Null => initial(opt),
        supplied => supplied,
    }
}

/// Merge the globals one level supplied: flags OR-ed, counts summed, deepest string wins
fn record(values: &mut BTreeMap<String, OptionValue>, node: &Node, matches: &ArgMatches) {
    for opt in node.globals {
        let value = read(opt, matches);
        let slot = values
            .entry(opt.name.to_string())
            .or_insert(OptionValue::Null);
        let merged = match (&*slot, value) {
            (OptionValue::Bool(a), OptionValue::Bool(b)) => OptionValue::Bool(*a || b),
            (OptionValue::Count(a), OptionValue::Count(b)) => OptionValue::Count(a + b),
            (current, OptionValue::Null) => current.clone(),
            (_, supplied) => supplied,
        };
        *slot = merged;
    }
}

fn finish(mut values: BTreeMap<String, OptionValue>) -> BTreeMap<String, OptionValue> {
    for opt in GLOBALS {
        let value = values.remove(opt.name).unwrap_or(OptionValue::Null);
        values.insert(opt.name.to_string(), or_initial(opt, value));
    }
    values
}

fn run_hook(path: &str, hook: fn(&InvocationContext) -> HookResult, context: &InvocationContext) -> i32 {
    match hook(context) {
        Ok(code) => code.unwrap_or(0),
        Err(e) => {
            eprintln!("Error: command '{}' failed: {}", path, e);
            1
        }
    }
}

fn unknown_command(registry: &Registry, name: &str, globals: BTreeMap<String, OptionValue>) -> i32 {
    let mut context = InvocationContext::new(name);
    context.args.insert("command".to_string(), Some(name.to_string()));
    context.global_options = globals;
    match registry.get(UNKNOWN_COMMAND_HOOK) {
        Some(hook) => run_hook(name, *hook, &context),
        None => {
            eprintln!("Unknown command: {}", name);
            2
        }
    }
}

fn dispatch(registry: &Registry, node: &Node, context: &InvocationContext) -> i32 {
    match registry.get(node.hook) {
        Some(hook) => run_hook(node.path, *hook, context),
        None => {
            println!(
                "{} executed successfully (hook '{}' not implemented yet)",
                node.path, node.hook
            );
            0
        }
    }
}

fn main() {
    let matches = match root_command().try_get_matches() {
        Ok(matches) => matches,
        Err(err) => err.exit(),
    };
    let registry = hooks::registry();

    let mut globals = BTreeMap::new();
    let mut node = &ROOT;
    let mut level = &matches;
    record(&mut globals, node, level);

    while let Some((name, sub_matches)) = level.subcommand() {
        match node.subcommands.iter().find(|n| n.name == name) {
            Some(child) => {
                node = child;
                level = sub_matches;
                record(&mut globals, node, level);
            }
            None => process::exit(unknown_command(&registry, name, finish(globals))),
        }
    }

    if node.path.is_empty() {
        let _ = root_command().print_help();
        println!();
        process::exit(0);
    }

    let mut context = InvocationContext::new(node.name);
    for arg in node.args {
        context
            .args
            .insert(arg.key.to_string(), level.get_one::<String>(arg.id).cloned());
    }
    for opt in node.options {
        context
            .options
            .insert(opt.name.to_string(), or_initial(opt, read(opt, level)));
    }
    context.global_options = finish(globals);

    process::exit(dispatch(&registry, node, &context));
}
"#;

fn render_main(doc: &CliDocument) -> String {
    let mut w = CodeWriter::new("    ");
    w.line(format!("//! {}", doc.tagline_or_name()));
    w.line("//!");
    w.line(format!("//! {}", banner(doc)));
    w.blank();
    w.lines(PRELUDE.lines());
    w.blank();
    w.line(format!("const VERSION: &str = {};", rust_str(&doc.version)));
    w.line(format!(
        "const UNKNOWN_COMMAND_HOOK: &str = {};",
        rust_str(doc.unknown_hook.get(CONVENTION))
    ));
    w.blank();
    w.line("/// Forwarded global options, in declaration order");
    w.line("static GLOBALS: &[Opt] = &[");
    w.indent();
    for option in &doc.globals {
        write_opt(&mut w, option, "global");
    }
    w.dedent();
    w.line("];");
    w.blank();
    w.line("static ROOT: Node = Node {");
    w.indent();
    write_node_fields(&mut w, &doc.root);
    w.dedent();
    w.line("};");
    w.blank();
    w.lines(RUNTIME.lines());
    w.finish()
}

fn write_node_fields(w: &mut CodeWriter, command: &CommandDoc) {
    let path = command.display_path();
    let hook = command.hook_name(CONVENTION).unwrap_or_default();
    w.line(format!("name: {},", rust_str(&command.name)));
    w.line(format!("about: {},", rust_str(&command.description)));
    w.line(format!("path: {},", rust_str(&path)));
    w.line(format!("hook: {},", rust_str(hook)));

    if command.arguments.is_empty() {
        w.line("args: &[],");
    } else {
        w.block("args: &[", "],", |w| {
            for arg in &command.arguments {
                w.line(format!(
                    "Positional {{ id: {}, key: {}, value_name: {}, help: {}, required: {} }},",
                    rust_str(&format!("arg:{}", arg.key)),
                    rust_str(&arg.key),
                    rust_str(&arg.name.to_uppercase()),
                    rust_str(&arg.description),
                    arg.required
                ));
            }
        });
    }

    write_opt_list(w, "options", &command.options, "opt");
    write_opt_list(w, "globals", &command.globals, "global");

    if command.subcommands.is_empty() {
        w.line("subcommands: &[],");
    } else {
        w.block("subcommands: &[", "],", |w| {
            for sub in &command.subcommands {
                w.block("Node {", "},", |w| write_node_fields(w, sub));
            }
        });
    }
}

fn write_opt_list(w: &mut CodeWriter, field: &str, options: &[OptionDoc], prefix: &str) {
    if options.is_empty() {
        w.line(format!("{}: &[],", field));
    } else {
        w.block(format!("{}: &[", field), "],", |w| {
            for option in options {
                write_opt(w, option, prefix);
            }
        });
    }
}

fn write_opt(w: &mut CodeWriter, option: &OptionDoc, prefix: &str) {
    let kind = match option.kind {
        OptionKind::Flag => "Kind::Flag",
        OptionKind::Count => "Kind::Count",
        OptionKind::String => "Kind::Str",
    };
    let default = match &option.default {
        None => "OptDefault::None".to_string(),
        Some(DefaultValue::Bool(b)) => format!("OptDefault::Bool({})", b),
        Some(DefaultValue::Count(n)) => format!("OptDefault::Count({})", n),
        Some(DefaultValue::Str(s)) => format!("OptDefault::Str({})", rust_str(s)),
    };
    let short = match option.short {
        Some(c) => format!("Some({:?})", c),
        None => "None".to_string(),
    };
    w.block("Opt {", "},", |w| {
        w.line(format!("name: {},", rust_str(&option.name)));
        w.line(format!(
            "id: {},",
            rust_str(&format!("{}:{}", prefix, option.name))
        ));
        w.line(format!("short: {},", short));
        w.line(format!("help: {},", rust_str(&option.description)));
        w.line(format!("kind: {},", kind));
        w.line(format!(
            "value_name: {},",
            rust_str(&option.name.to_uppercase())
        ));
        w.line(format!("default: {},", default));
    });
}

/// Rust type and extraction expression of an option field
fn option_field(option: &OptionDoc, source: &str) -> (&'static str, String) {
    let get = format!("context.{}({})", source, rust_str(&option.name));
    match (option.kind, &option.default) {
        (OptionKind::Flag, _) => ("bool", format!("{}.as_bool()", get)),
        (OptionKind::Count, _) => ("u64", format!("{}.as_count()", get)),
        (OptionKind::String, Some(DefaultValue::Str(_))) => (
            "String",
            format!("{}.as_str().unwrap_or_default().to_string()", get),
        ),
        (OptionKind::String, _) => (
            "Option<String>",
            format!("{}.as_str().map(str::to_string)", get),
        ),
    }
}

const TYPES_PRELUDE: &str = r#"#![allow(dead_code)]

use std::collections::BTreeMap;

/// A parsed option value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Count(u64),
    Str(String),
    Null,
}

static NULL: OptionValue = OptionValue::Null;

impl OptionValue {
    pub fn as_bool(&self) -> bool {
        matches!(self, OptionValue::Bool(true))
    }

    pub fn as_count(&self) -> u64 {
        match self {
            OptionValue::Count(n) => *n,
            _ => 0,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// What a hook returns: `None` for success or an explicit exit code
pub type HookResult = Result<Option<i32>, Box<dyn std::error::Error>>;

/// The context every hook receives
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    pub command_name: String,
    pub args: BTreeMap<String, Option<String>>,
    pub options: BTreeMap<String, OptionValue>,
    pub global_options: BTreeMap<String, OptionValue>,
}

impl InvocationContext {
    pub fn new(command_name: &str) -> Self {
        InvocationContext {
            command_name: command_name.to_string(),
            ..Default::default()
        }
    }

    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(|v| v.as_deref())
    }

    pub fn option(&self, name: &str) -> &OptionValue {
        self.options.get(name).unwrap_or(&NULL)
    }

    pub fn global(&self, name: &str) -> &OptionValue {
        self.global_options.get(name).unwrap_or(&NULL)
    }
}
"#;

fn render_types(doc: &CliDocument) -> String {
    let mut w = CodeWriter::new("    ");
    w.line(format!("//! Invocation context types for {}", doc.name));
    w.line("//!");
    w.line(format!("//! {}", banner(doc)));
    w.blank();
    w.lines(TYPES_PRELUDE.lines());

    w.blank();
    w.line("/// Forwarded global options");
    write_struct(&mut w, "GlobalOptions", &doc.globals, "global");

    for command in doc.commands() {
        let stem = type_stem(command);
        w.blank();
        w.line(format!("/// Arguments of `{}`", command.display_path()));
        w.line("#[derive(Debug, Clone)]");
        if command.arguments.is_empty() {
            w.line(format!("pub struct {}Args {{}}", stem));
        } else {
            w.block(format!("pub struct {}Args {{", stem), "}", |w| {
                for arg in &command.arguments {
                    let ty = if arg.required { "String" } else { "Option<String>" };
                    w.line(format!("pub {}: {},", rust_ident(&arg.ident()), ty));
                }
            });
        }
        w.blank();
        w.block(format!("impl {}Args {{", stem), "}", |w| {
            w.block(
                from_context_signature(!command.arguments.is_empty()),
                "}",
                |w| {
                    w.block(format!("{}Args {{", stem), "}", |w| {
                        for arg in &command.arguments {
                            let get = format!("context.arg({})", rust_str(&arg.key));
                            let value = if arg.required {
                                format!("{}.unwrap_or_default().to_string()", get)
                            } else {
                                format!("{}.map(str::to_string)", get)
                            };
                            w.line(format!("{}: {},", rust_ident(&arg.ident()), value));
                        }
                    });
                },
            );
        });

        w.blank();
        w.line(format!("/// Options of `{}`", command.display_path()));
        write_struct(&mut w, &format!("{}Options", stem), &command.options, "option");
    }
    w.finish()
}

/// Empty views never read the context
fn from_context_signature(reads: bool) -> &'static str {
    if reads {
        "pub fn from_context(context: &InvocationContext) -> Self {"
    } else {
        "pub fn from_context(_context: &InvocationContext) -> Self {"
    }
}

fn write_struct(w: &mut CodeWriter, name: &str, options: &[OptionDoc], source: &str) {
    w.line("#[derive(Debug, Clone)]");
    if options.is_empty() {
        w.line(format!("pub struct {} {{}}", name));
    } else {
        w.block(format!("pub struct {} {{", name), "}", |w| {
            for option in options {
                let (ty, _) = option_field(option, source);
                w.line(format!("pub {}: {},", rust_ident(&option.ident()), ty));
            }
        });
    }
    w.blank();
    w.block(format!("impl {} {{", name), "}", |w| {
        w.block(
            from_context_signature(!options.is_empty()),
            "}",
            |w| {
                w.block(format!("{} {{", name), "}", |w| {
                    for option in options {
                        let (_, value) = option_field(option, source);
                        w.line(format!("{}: {},", rust_ident(&option.ident()), value));
                    }
                });
            },
        );
    });
}

fn render_hooks(doc: &CliDocument) -> String {
    let mut w = CodeWriter::new("    ");
    w.line(format!("//! Hook implementations for {}", doc.name));
    w.line("//!");
    w.line("//! Return `Ok(None)` for success, `Ok(Some(code))` for an explicit exit code and");
    w.line("//! `Err(..)` to fail the command. Remove an entry from `registry` to get the");
    w.line("//! \"not implemented yet\" notice instead.");
    w.blank();
    w.line("use crate::types::*;");
    w.line("use std::collections::HashMap;");
    w.blank();
    w.line("pub type HookFn = fn(&InvocationContext) -> HookResult;");
    w.blank();
    w.line("/// Hook implementations by derived hook name");
    w.block("pub fn registry() -> HashMap<&'static str, HookFn> {", "}", |w| {
        w.line("let mut hooks: HashMap<&'static str, HookFn> = HashMap::new();");
        for name in doc.hook_names(CONVENTION) {
            w.line(format!("hooks.insert({}, {});", rust_str(name), name));
        }
        w.line("hooks");
    });

    for command in doc.commands() {
        let Some(hook) = command.hook_name(CONVENTION) else {
            continue;
        };
        let stem = type_stem(command);
        w.blank();
        if !command.description.is_empty() {
            w.line(format!("/// {}", command.description.replace('\n', " ")));
        }
        w.block(
            format!("pub fn {}(context: &InvocationContext) -> HookResult {{", hook),
            "}",
            |w| {
                w.line(format!("let args = {}Args::from_context(context);", stem));
                w.line(format!("let options = {}Options::from_context(context);", stem));
                w.line(format!(
                    "println!(\"{}: {{:?}} {{:?}}\", args, options);",
                    command.display_path().replace('\\', "\\\\").replace('"', "\\\"").replace('{', "{{").replace('}', "}}")
                ));
                w.line("Ok(None)");
            },
        );
    }

    w.blank();
    w.line("/// Called for command names that match nothing");
    w.block(
        format!(
            "pub fn {}(context: &InvocationContext) -> HookResult {{",
            doc.unknown_hook.get(CONVENTION)
        ),
        "}",
        |w| {
            w.line("eprintln!(\"Unknown command: {}\", context.command_name);");
            w.line("Ok(Some(2))");
        },
    );
    w.finish()
}

fn render_manifest(doc: &CliDocument) -> String {
    let mut w = CodeWriter::new("");
    w.line("[package]");
    w.line(format!("name = {}", rust_str(&doc.name)));
    w.line(format!("version = {}", rust_str(&doc.version)));
    w.line("edition = \"2021\"");
    w.line(format!("description = {}", rust_str(&doc.tagline)));
    w.blank();
    w.line("[[bin]]");
    w.line(format!("name = {}", rust_str(&doc.name)));
    w.line("path = \"src/main.rs\"");
    w.blank();
    w.line("[dependencies]");
    w.line(format!("clap = \"{}\"", CLAP_VERSION));
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{resolve, HookContract};
    use crate::schema::{parse_schema, validate};

    fn document() -> CliDocument {
        let yaml = r#"
cli:
  name: demo
  tagline: Demo CLI
  version: 1.2.3
  commands:
    simple:
      desc: Simple command
      args:
        - name: MESSAGE
      options:
        - name: verbose
          type: flag
        - name: type
          default: plain
    database:
      subcommands:
        status:
          desc: Show status
"#;
        let tree = resolve(&validate(parse_schema(yaml).unwrap()).unwrap());
        let contract = HookContract::derive(&tree).unwrap();
        CliDocument::build(&tree, &contract)
    }

    #[test]
    fn test_main_tables() {
        let main = render_main(&document());
        assert!(main.contains("const VERSION: &str = \"1.2.3\";"));
        assert!(main.contains("const UNKNOWN_COMMAND_HOOK: &str = \"on_unknown_command\";"));
        assert!(main.contains("hook: \"on_database_status\","));
        assert!(main.contains("path: \"database status\","));
        assert!(main.contains(
            "Positional { id: \"arg:message\", key: \"message\", value_name: \"MESSAGE\", help: \"\", required: true },"
        ));
        assert!(main.contains("id: \"opt:verbose\","));
        assert!(main.contains("id: \"global:verbose\","));
        assert!(main.contains("short: Some('v'),"));
    }

    #[test]
    fn test_types_use_raw_identifiers() {
        let types = render_types(&document());
        assert!(types.contains("pub struct SimpleArgs {\n    pub message: String,\n}"));
        assert!(types.contains("    pub r#type: String,"));
        assert!(types.contains("    pub verbose: bool,"));
        assert!(types.contains("pub struct DatabaseStatusArgs {}"));
    }

    #[test]
    fn test_empty_views_ignore_context() {
        let types = render_types(&document());
        let status = types.split("impl DatabaseStatusArgs {").nth(1).unwrap();
        assert!(status
            .trim_start()
            .starts_with("pub fn from_context(_context: &InvocationContext)"));
        let options = types.split("impl DatabaseStatusOptions {").nth(1).unwrap();
        assert!(options
            .trim_start()
            .starts_with("pub fn from_context(_context: &InvocationContext)"));
        let simple = types.split("impl SimpleArgs {").nth(1).unwrap();
        assert!(simple.trim_start().starts_with("pub fn from_context(context: &InvocationContext)"));
    }

    #[test]
    fn test_registry_lists_every_hook() {
        let hooks = render_hooks(&document());
        for name in ["on_simple", "on_database", "on_database_status", "on_unknown_command"] {
            assert!(hooks.contains(&format!("hooks.insert(\"{0}\", {0});", name)));
            assert!(hooks.contains(&format!("pub fn {}(context: &InvocationContext)", name)));
        }
    }

    #[test]
    fn test_manifest() {
        let manifest = render_manifest(&document());
        assert!(manifest.contains("name = \"demo\""));
        assert!(manifest.contains("clap = \"4.5\""));
    }
}
