//! Node.js target (commander)
//!
//! The TypeScript target renders the same program with type annotations, so the
//! commander rendering lives here and is shared through [`Flavor`].
//!
//! Every parent command enables positional options: a parent only parses the
//! options that precede its subcommand, so a command's own `--verbose` is never
//! swallowed by the global one. Globals registered at each level are remembered in
//! a `WeakMap` and merged by walking from the root to the invoked command.

use crate::model::{pascal_case, HookConvention};
use crate::render::doc::{CliDocument, CommandDoc, OptionDoc};
use crate::render::writer::{quoted, CodeWriter};
use crate::render::{banner, EmittedFile, Emitter, FileKind, Target};
use crate::schema::{DefaultValue, OptionKind};

const CONVENTION: HookConvention = HookConvention::PrefixedCamel;

/// Commander version the generated packages depend on
pub const COMMANDER_VERSION: &str = "^12.1.0";

/// Plain JavaScript or TypeScript output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    JavaScript,
    TypeScript,
}

impl Flavor {
    fn typed(&self) -> bool {
        *self == Flavor::TypeScript
    }

    /// `text` when typed, nothing otherwise
    fn ann<'a>(&self, text: &'a str) -> &'a str {
        if self.typed() {
            text
        } else {
            ""
        }
    }
}

pub struct JavaScriptEmitter;

impl Emitter for JavaScriptEmitter {
    fn target(&self) -> Target {
        Target::NodeJs
    }

    fn emit(&self, doc: &CliDocument) -> Vec<EmittedFile> {
        vec![
            EmittedFile::new(
                "cli.js",
                render_entry(doc, Flavor::JavaScript),
                FileKind::Entry,
            ),
            EmittedFile::new("hooks.js", render_hooks(doc), FileKind::HookStub),
            EmittedFile::new(
                "package.json",
                render_package(doc, Flavor::JavaScript),
                FileKind::Manifest,
            ),
        ]
    }
}

/// Attribute key commander stores an option under (`dry-run` -> `dryRun`)
pub fn commander_key(long: &str) -> String {
    let mut parts = long.split('-').filter(|p| !p.is_empty());
    let mut key = parts.next().unwrap_or_default().to_string();
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            key.extend(first.to_uppercase());
            key.push_str(chars.as_str());
        }
    }
    key
}

/// Variable holding a command object (`program`, `cmdDatabaseStatus`)
pub(crate) fn command_var(command: &CommandDoc) -> String {
    if command.is_root() {
        "program".to_string()
    } else {
        format!("cmd{}", pascal_case(&command.ident()))
    }
}

/// Render the commander entry point
pub(crate) fn render_entry(doc: &CliDocument, flavor: Flavor) -> String {
    let mut w = CodeWriter::new("  ");
    match flavor {
        Flavor::JavaScript => {
            w.line("#!/usr/bin/env node");
            w.line(format!("// {}", banner(doc)));
            w.line("\"use strict\";");
            w.blank();
            w.line("const { Command } = require(\"commander\");");
            w.blank();
            w.line("let hooks = {};");
            w.block("try {", "} catch (err) {", |w| {
                w.line("hooks = require(\"./hooks\");");
            });
            w.indent().line("if (err.code !== \"MODULE_NOT_FOUND\") throw err;").dedent();
            w.line("}");
        }
        Flavor::TypeScript => {
            w.line("#!/usr/bin/env node");
            w.line(format!("// {}", banner(doc)));
            w.blank();
            w.line("import { Command } from \"commander\";");
            w.line("import * as hookModule from \"./hooks\";");
            let mut types = vec!["GlobalOptions".to_string(), "HookResult".to_string(), "Hooks".to_string()];
            types.push("UnknownCommandContext".to_string());
            for command in doc.commands() {
                types.push(format!("{}Context", super::typescript::type_stem(command)));
            }
            w.line(format!("import type {{ {} }} from \"./types\";", types.join(", ")));
            w.blank();
            w.line("const hooks: Hooks = hookModule;");
        }
    }
    w.blank();
    w.line(format!("const VERSION = {};", quoted(&doc.version)));
    w.blank();
    w.line("// Forwarded global options: long name, commander key, kind, default");
    if flavor.typed() {
        w.line("interface GlobalOption {");
        w.indent();
        w.line("name: keyof GlobalOptions;");
        w.line("key: string;");
        w.line("kind: \"flag\" | \"count\" | \"string\";");
        w.line("default: boolean | number | string | null;");
        w.dedent();
        w.line("}");
    }
    w.line(format!("const GLOBAL_OPTIONS{} = [", flavor.ann(": GlobalOption[]")));
    w.indent();
    for option in &doc.globals {
        w.line(format!(
            "{{ name: {}, key: {}, kind: {}, default: {} }},",
            quoted(&option.name),
            quoted(&commander_key(&option.name)),
            quoted(option.kind.as_str()),
            js_default(option.default.as_ref())
        ));
    }
    w.dedent();
    w.line("];");
    w.blank();
    w.line("// Global option names registered on each command; shadowed ones are absent");
    w.line(format!(
        "const inheritedGlobals = new WeakMap{}();",
        flavor.ann("<Command, string[]>")
    ));
    w.blank();
    write_runtime(&mut w, flavor);

    write_root(&mut w, doc, flavor);
    for command in doc.commands() {
        w.blank();
        write_command(&mut w, command, flavor);
    }

    w.blank();
    w.line("program.parseAsync(process.argv);");
    w.finish()
}

fn write_runtime(w: &mut CodeWriter, flavor: Flavor) {
    let typed = flavor.typed();
    w.block(
        format!(
            "function increase(_value{}, previous{}){} {{",
            flavor.ann(": string"),
            flavor.ann(": number"),
            flavor.ann(": number")
        ),
        "}",
        |w| {
            w.line("return previous + 1;");
        },
    );
    w.blank();
    w.block(
        format!(
            "function errorMessage(err{}){} {{",
            flavor.ann(": unknown"),
            flavor.ann(": string")
        ),
        "}",
        |w| {
            w.line("return err instanceof Error ? err.message : String(err);");
        },
    );
    w.blank();
    w.block(
        format!(
            "function collectGlobals(command{}){} {{",
            flavor.ann(": Command"),
            flavor.ann(": GlobalOptions")
        ),
        "}",
        |w| {
            w.line(format!(
                "const values{} = {{}};",
                flavor.ann(": Record<string, boolean | number | string | null>")
            ));
            w.block("for (const option of GLOBAL_OPTIONS) {", "}", |w| {
                w.line("values[option.name] = option.kind === \"flag\" ? false : option.kind === \"count\" ? 0 : null;");
            });
            w.line(format!("const chain{} = [];", flavor.ann(": Command[]")));
            w.block(
                format!(
                    "for (let level{} = command; level; level = level.parent) {{",
                    flavor.ann(": Command | null")
                ),
                "}",
                |w| {
                    w.line("chain.unshift(level);");
                },
            );
            w.block("for (const level of chain) {", "}", |w| {
                w.line("const registered = inheritedGlobals.get(level) || [];");
                w.line("const opts = level.opts();");
                w.block("for (const option of GLOBAL_OPTIONS) {", "}", |w| {
                    w.line("if (!registered.includes(option.name)) continue;");
                    w.line("const value = opts[option.key];");
                    w.line("if (option.kind === \"flag\") {");
                    w.indent();
                    w.line("values[option.name] = Boolean(values[option.name]) || Boolean(value);");
                    w.dedent();
                    w.line("} else if (option.kind === \"count\") {");
                    w.indent();
                    w.line("values[option.name] = Number(values[option.name]) + (value || 0);");
                    w.dedent();
                    w.line("} else if (value !== undefined && value !== null) {");
                    w.indent();
                    w.line("values[option.name] = value;");
                    w.dedent();
                    w.line("}");
                });
            });
            w.block("for (const option of GLOBAL_OPTIONS) {", "}", |w| {
                w.line("const current = values[option.name];");
                w.block(
                    "if (option.default !== null && (current === null || current === false || current === 0)) {",
                    "}",
                    |w| {
                        w.line("values[option.name] = option.default;");
                    },
                );
            });
            if typed {
                w.line("return values as unknown as GlobalOptions;");
            } else {
                w.line("return values;");
            }
        },
    );
    w.blank();
    w.block(
        format!(
            "async function runHook{}(path{}, hook{}, context{}){} {{",
            flavor.ann("<C>"),
            flavor.ann(": string"),
            flavor.ann(": (context: C) => HookResult"),
            flavor.ann(": C"),
            flavor.ann(": Promise<void>")
        ),
        "}",
        |w| {
            w.line("let result;");
            w.block("try {", "} catch (err) {", |w| {
                w.line("result = await hook(context);");
            });
            w.indent();
            w.line("console.error(`Error: command '${path}' failed: ${errorMessage(err)}`);");
            w.line("process.exit(1);");
            w.dedent();
            w.line("}");
            w.line("process.exit(typeof result === \"number\" ? result : 0);");
        },
    );
    w.blank();
    w.block(
        format!(
            "async function dispatch{}(path{}, hookName{}, hook{}, context{}){} {{",
            flavor.ann("<C>"),
            flavor.ann(": string"),
            flavor.ann(": string"),
            flavor.ann(": ((context: C) => HookResult) | undefined"),
            flavor.ann(": C"),
            flavor.ann(": Promise<void>")
        ),
        "}",
        |w| {
            w.block("if (typeof hook !== \"function\") {", "}", |w| {
                w.line("console.log(`${path} executed successfully (hook '${hookName}' not implemented yet)`);");
                w.line("process.exit(0);");
            });
            w.line("await runHook(path, hook, context);");
        },
    );
    w.blank();
    w.block(
        format!(
            "async function dispatchUnknown(name{}, command{}){} {{",
            flavor.ann(": string"),
            flavor.ann(": Command"),
            flavor.ann(": Promise<void>")
        ),
        "}",
        |w| {
            w.line(format!(
                "const context{} = {{",
                flavor.ann(": UnknownCommandContext")
            ));
            w.indent();
            w.line("commandName: name,");
            w.line("args: { command: name },");
            w.line("options: {},");
            w.line("globalOptions: collectGlobals(command),");
            w.dedent();
            w.line("};");
            w.line(format!(
                "const hook = hooks.{};",
                CONVENTION.unknown_command_hook()
            ));
            w.block("if (typeof hook !== \"function\") {", "}", |w| {
                w.line("console.error(`Unknown command: ${name}`);");
                w.line("process.exit(2);");
            });
            w.line("await runHook(name, hook, context);");
        },
    );
    w.blank();
    w.line("// Help and version exit 0, usage errors exit 2");
    w.block(
        format!(
            "function exitWith(err{}){} {{",
            flavor.ann(": { exitCode: number }"),
            flavor.ann(": never")
        ),
        "}",
        |w| {
            w.line("process.exit(err.exitCode === 0 ? 0 : 2);");
        },
    );
    w.blank();
}

fn write_root(w: &mut CodeWriter, doc: &CliDocument, flavor: Flavor) {
    let description = match &doc.description {
        Some(desc) => format!("{}\n\n{}", doc.tagline_or_name(), desc),
        None => doc.tagline_or_name(),
    };
    w.line(format!("const program = new Command({})", quoted(&doc.name)));
    w.indent();
    w.line(format!(".description({})", quoted(&description)));
    w.line(".version(VERSION, \"--version\")");
    w.line(".enablePositionalOptions()");
    w.line(".helpCommand(false)");
    w.line(".exitOverride(exitWith)");
    w.line(".argument(\"[command]\")");
    w.line(".allowExcessArguments(true);");
    w.dedent();
    for option in &doc.root.globals {
        write_option(w, "program", option, false);
    }
    write_registered_globals(w, &doc.root);
    w.block(
        format!(
            "program.action(async (name{}, _options{}, command{}) => {{",
            flavor.ann(": string | undefined"),
            flavor.ann(": unknown"),
            flavor.ann(": Command")
        ),
        "});",
        |w| {
            w.block("if (name === undefined) {", "}", |w| {
                w.line("program.outputHelp();");
                w.line("return;");
            });
            w.line("await dispatchUnknown(name, command);");
        },
    );
}

fn write_command(w: &mut CodeWriter, command: &CommandDoc, flavor: Flavor) {
    let var = command_var(command);
    let parent = match command.path.len() {
        1 => "program".to_string(),
        n => format!("cmd{}", pascal_case(&ident_of(&command.path[..n - 1]))),
    };

    w.line(format!("const {} = {}", var, parent));
    w.indent();
    w.line(format!(".command({})", quoted(&command.name)));
    w.line(format!(".description({})", quoted(&command.description)));
    w.line(".version(VERSION, \"--version\")");
    w.line(".helpCommand(false)");
    w.line(".allowExcessArguments(false);");
    w.dedent();
    for arg in &command.arguments {
        let spelled = if arg.required {
            format!("<{}>", arg.name.to_uppercase())
        } else {
            format!("[{}]", arg.name.to_uppercase())
        };
        w.line(format!(
            "{}.argument({}, {});",
            var,
            quoted(&spelled),
            quoted(&arg.description)
        ));
    }
    for option in &command.options {
        write_option(w, &var, option, true);
    }
    for option in &command.globals {
        write_option(w, &var, option, false);
    }
    write_registered_globals(w, command);

    let hook = command.hook_name(CONVENTION).unwrap_or_default();
    w.block(
        format!(
            "{}.action(async (...params{}) => {{",
            var,
            flavor.ann(": unknown[]")
        ),
        "});",
        |w| {
            w.line(format!(
                "const command = params[params.length - 1]{};",
                flavor.ann(" as Command")
            ));
            w.line("const opts = command.opts();");
            let context_type = if flavor.typed() {
                format!(": {}Context", super::typescript::type_stem(command))
            } else {
                String::new()
            };
            w.line(format!("const context{} = {{", context_type));
            w.indent();
            w.line(format!("commandName: {},", quoted(&command.name)));
            w.line("args: {");
            w.indent();
            for (i, arg) in command.arguments.iter().enumerate() {
                w.line(format!(
                    "{}: command.processedArgs[{}] ?? null,",
                    quoted(&arg.key),
                    i
                ));
            }
            w.dedent();
            w.line("},");
            w.line("options: {");
            w.indent();
            for option in &command.options {
                w.line(format!(
                    "{}: {},",
                    quoted(&option.name),
                    own_value(option)
                ));
            }
            w.dedent();
            w.line("},");
            w.line("globalOptions: collectGlobals(command),");
            w.dedent();
            w.line("};");
            w.line(format!(
                "await dispatch({}, {}, hooks.{}, context);",
                quoted(&command.display_path()),
                quoted(hook),
                hook
            ));
        },
    );
}

fn write_option(w: &mut CodeWriter, var: &str, option: &OptionDoc, own: bool) {
    let mut flags = option.spellings().join(", ");
    if option.takes_value() {
        flags.push_str(&format!(" <{}>", commander_key(&option.name)));
    }
    let flags = quoted(&flags);
    let description = quoted(&option.description);

    // Globals get their defaults after every level has been merged
    let line = match (option.kind, own, &option.default) {
        (OptionKind::Count, _, _) => format!(
            "{}.option({}, {}, increase, 0);",
            var, flags, description
        ),
        (OptionKind::Flag, true, Some(DefaultValue::Bool(true))) => {
            format!("{}.option({}, {}, true);", var, flags, description)
        }
        (OptionKind::Flag, _, _) => format!("{}.option({}, {}, false);", var, flags, description),
        (OptionKind::String, true, Some(DefaultValue::Str(s))) => format!(
            "{}.option({}, {}, {});",
            var,
            flags,
            description,
            quoted(s)
        ),
        (OptionKind::String, _, _) => format!("{}.option({}, {});", var, flags, description),
    };
    w.line(line);
}

/// Context expression for an own option
fn own_value(option: &OptionDoc) -> String {
    let access = format!("opts[{}]", quoted(&commander_key(&option.name)));
    match (option.kind, &option.default) {
        (OptionKind::Count, Some(DefaultValue::Count(n))) if *n > 0 => {
            format!("{} === 0 ? {} : {}", access, n, access)
        }
        (OptionKind::Count, _) => access,
        (OptionKind::Flag, _) => format!("Boolean({})", access),
        (OptionKind::String, _) => format!("{} ?? null", access),
    }
}

fn write_registered_globals(w: &mut CodeWriter, command: &CommandDoc) {
    let names: Vec<String> = command.globals.iter().map(|o| quoted(&o.name)).collect();
    w.line(format!(
        "inheritedGlobals.set({}, [{}]);",
        command_var(command),
        names.join(", ")
    ));
}

fn ident_of(path: &[String]) -> String {
    path.iter()
        .map(|s| crate::model::snake_case(s))
        .collect::<Vec<_>>()
        .join("_")
}

fn js_default(default: Option<&DefaultValue>) -> String {
    match default {
        None => "null".to_string(),
        Some(DefaultValue::Bool(b)) => b.to_string(),
        Some(DefaultValue::Count(n)) => n.to_string(),
        Some(DefaultValue::Str(s)) => quoted(s),
    }
}

fn render_hooks(doc: &CliDocument) -> String {
    let mut w = CodeWriter::new("  ");
    w.line(format!("// Hook implementations for {}", doc.name));
    w.line("//");
    w.line("// Every hook receives { commandName, args, options, globalOptions } and returns");
    w.line("// nothing for success or an integer exit code. Hooks may be async. A missing");
    w.line("// hook makes the command print a \"not implemented yet\" notice.");
    w.blank();
    w.line("\"use strict\";");

    let mut exported = Vec::new();
    for command in doc.commands() {
        let Some(hook) = command.hook_name(CONVENTION) else {
            continue;
        };
        exported.push(hook.to_string());
        w.blank();
        w.line(format!("/** {} */", js_comment(&command.description)));
        w.block(format!("async function {}(context) {{", hook), "}", |w| {
            w.line(format!(
                "console.log({} + \": \" + JSON.stringify(context.args) + \" \" + JSON.stringify(context.options));",
                quoted(&command.display_path())
            ));
        });
    }

    let unknown = doc.unknown_hook.get(CONVENTION);
    exported.push(unknown.to_string());
    w.blank();
    w.line("/** Called for command names that match nothing */");
    w.block(format!("async function {}(context) {{", unknown), "}", |w| {
        w.line("console.error(`Unknown command: ${context.commandName}`);");
        w.line("return 2;");
    });

    w.blank();
    w.block("module.exports = {", "};", |w| {
        for name in &exported {
            w.line(format!("{},", name));
        }
    });
    w.finish()
}

/// `package.json` for the JavaScript and TypeScript targets
pub(crate) fn render_package(doc: &CliDocument, flavor: Flavor) -> String {
    let (main, scripts, dev) = match flavor {
        Flavor::JavaScript => (
            "cli.js",
            serde_json::json!({ "start": "node cli.js" }),
            serde_json::json!({}),
        ),
        Flavor::TypeScript => (
            "dist/cli.js",
            serde_json::json!({ "build": "tsc", "start": "node dist/cli.js" }),
            serde_json::json!({ "@types/node": "^20.0.0", "typescript": "^5.4.0" }),
        ),
    };
    let mut bin = serde_json::Map::new();
    bin.insert(doc.name.clone(), main.into());
    let mut package = serde_json::json!({
        "name": doc.name,
        "version": doc.version,
        "description": doc.tagline,
        "main": main,
        "bin": bin,
        "scripts": scripts,
        "dependencies": { "commander": COMMANDER_VERSION },
    });
    if flavor.typed() {
        package["devDependencies"] = dev;
    }
    let mut text = serde_json::to_string_pretty(&package).unwrap_or_default();
    text.push('\n');
    text
}

fn js_comment(text: &str) -> String {
    text.replace("*/", "* /")
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
  options:
    - name: dry-run
      type: flag
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
        - name: times
          short: t
          type: count
          default: 1
        - name: format
          default: text
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
    fn test_commander_key() {
        assert_eq!(commander_key("verbose"), "verbose");
        assert_eq!(commander_key("dry-run"), "dryRun");
        assert_eq!(commander_key("log_level"), "log_level");
    }

    #[test]
    fn test_entry_wires_commands() {
        let entry = render_entry(&document(), Flavor::JavaScript);
        assert!(entry.contains("const cmdDatabaseStatus = cmdDatabase"));
        assert!(entry.contains("cmdSimple.argument(\"<MESSAGE>\", \"\");"));
        assert!(entry.contains("cmdGreet.argument(\"[GREETING]\", \"\");"));
        assert!(entry.contains("cmdGreet.option(\"-t, --times\", \"\", increase, 0);"));
        assert!(entry.contains("cmdGreet.option(\"--format <format>\", \"\", \"text\");"));
        assert!(entry.contains("\"times\": opts[\"times\"] === 0 ? 1 : opts[\"times\"],"));
        assert!(entry.contains(
            "await dispatch(\"database status\", \"onDatabaseStatus\", hooks.onDatabaseStatus, context);"
        ));
    }

    #[test]
    fn test_shadowed_global_not_registered() {
        let entry = render_entry(&document(), Flavor::JavaScript);
        assert!(entry.contains("inheritedGlobals.set(cmdSimple, [\"dry-run\"]);"));
        assert!(entry.contains("inheritedGlobals.set(cmdGreet, [\"verbose\", \"dry-run\"]);"));
        assert!(!entry.contains("cmdSimple.option(\"-v, --verbose\""));
    }

    #[test]
    fn test_hooks_export_every_name() {
        let hooks = render_hooks(&document());
        assert!(hooks.contains("module.exports = {"));
        for name in ["onSimple,", "onGreet,", "onDatabaseStatus,", "onUnknownCommand,"] {
            assert!(hooks.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_package_manifest() {
        let package: serde_json::Value =
            serde_json::from_str(&render_package(&document(), Flavor::JavaScript)).unwrap();
        assert_eq!(package["bin"]["demo"], "cli.js");
        assert_eq!(package["dependencies"]["commander"], COMMANDER_VERSION);
        assert!(package.get("devDependencies").is_none());
    }
}
