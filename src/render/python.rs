//! Python target (click)
//!
//! Parameters are stored under prefixed destinations (`a_` arguments, `o_` own
//! options, `g_` inherited globals) so a command's own `--verbose` never collides
//! with the global one. Globals are gathered by walking the click context chain from
//! the root down, which lets them appear at any level.

use crate::model::HookConvention;
use crate::render::doc::{CliDocument, CommandDoc, OptionDoc};
use crate::render::writer::{quoted, CodeWriter};
use crate::render::{banner, EmittedFile, Emitter, FileKind, Target};
use crate::schema::{DefaultValue, OptionKind};

const CONVENTION: HookConvention = HookConvention::PrefixedSnake;

pub struct PythonEmitter;

impl Emitter for PythonEmitter {
    fn target(&self) -> Target {
        Target::Python
    }

    fn emit(&self, doc: &CliDocument) -> Vec<EmittedFile> {
        vec![
            EmittedFile::new("cli.py", render_entry(doc), FileKind::Entry),
            EmittedFile::new("cli_hooks.py", render_hooks(doc), FileKind::HookStub),
            EmittedFile::new("requirements.txt", "click>=8.1\n".to_string(), FileKind::Manifest),
        ]
    }
}

fn render_entry(doc: &CliDocument) -> String {
    let mut w = CodeWriter::new("    ");
    w.line("#!/usr/bin/env python3");
    w.line(format!("\"\"\"{}", py_doc(&doc.tagline_or_name())));
    w.blank();
    w.line(py_doc(&banner(doc)));
    w.line("\"\"\"");
    w.blank();
    w.lines(["import asyncio", "import inspect", "import sys", "", "import click"]);
    w.blank();
    w.block("try:", "except ImportError:", |w| {
        w.line("import cli_hooks as hooks");
    });
    w.indent().line("hooks = None").dedent();
    w.blank();
    w.line(format!("VERSION = {}", quoted(&doc.version)));
    w.line("CONTEXT_SETTINGS = {\"help_option_names\": [\"-h\", \"--help\"]}");
    w.blank();
    w.line("# (long name, destination, kind, default) of every forwarded global option");
    w.line("GLOBAL_OPTIONS = [");
    w.indent();
    for option in &doc.globals {
        w.line(format!(
            "({}, {}, {}, {}),",
            quoted(&option.name),
            quoted(&format!("g_{}", option.ident())),
            quoted(option.kind.as_str()),
            py_default(option.default.as_ref())
        ));
    }
    w.dedent();
    w.line("]");
    w.blank();
    write_runtime(&mut w);

    write_root(&mut w, doc);
    for command in doc.commands() {
        w.blank();
        w.blank();
        write_command(&mut w, command);
    }

    w.blank();
    w.blank();
    for command in doc.commands() {
        let parent = match command.path.len() {
            1 => "cli".to_string(),
            n => format!("cmd_{}", parent_ident(command, n)),
        };
        w.line(format!("{}.add_command(cmd_{})", parent, command.ident()));
    }
    w.blank();
    w.blank();
    w.scope("if __name__ == \"__main__\":", |w| {
        w.line(format!("cli(prog_name={})", quoted(&doc.name)));
    });
    trim_trailing_blank(w.finish())
}

fn write_runtime(w: &mut CodeWriter) {
    w.blank();
    w.scope("def _collect_globals(ctx):", |w| {
        w.line("values = {}");
        w.scope("for name, _, kind, _ in GLOBAL_OPTIONS:", |w| {
            w.line("values[name] = False if kind == \"flag\" else 0 if kind == \"count\" else None");
        });
        w.line("chain = []");
        w.scope("while ctx is not None:", |w| {
            w.line("chain.append(ctx)");
            w.line("ctx = ctx.parent");
        });
        w.scope("for level in reversed(chain):", |w| {
            w.scope("for name, dest, kind, _ in GLOBAL_OPTIONS:", |w| {
                w.scope("if dest not in level.params:", |w| {
                    w.line("continue");
                });
                w.line("value = level.params[dest]");
                w.scope("if kind == \"flag\":", |w| {
                    w.line("values[name] = values[name] or bool(value)");
                });
                w.scope("elif kind == \"count\":", |w| {
                    w.line("values[name] += value or 0");
                });
                w.scope("elif value is not None:", |w| {
                    w.line("values[name] = value");
                });
            });
        });
        w.scope("for name, _, kind, default in GLOBAL_OPTIONS:", |w| {
            w.scope("if default is not None and values[name] in (None, False, 0):", |w| {
                w.line("values[name] = default");
            });
        });
        w.line("return values");
    });
    w.blank();
    w.scope("def _lookup(hook_name):", |w| {
        w.line("return getattr(hooks, hook_name, None) if hooks is not None else None");
    });
    w.blank();
    w.scope("def _run_hook(path, hook, context):", |w| {
        w.scope("try:", |w| {
            w.line("result = hook(context)");
            w.scope("if inspect.iscoroutine(result):", |w| {
                w.line("result = asyncio.run(result)");
            });
        });
        w.scope("except Exception as e:", |w| {
            w.line("click.echo(f\"Error: command '{path}' failed: {e}\", err=True)");
            w.line("sys.exit(1)");
        });
        w.line("sys.exit(result if isinstance(result, int) else 0)");
    });
    w.blank();
    w.scope("def _dispatch(path, hook_name, context):", |w| {
        w.line("hook = _lookup(hook_name)");
        w.scope("if hook is None:", |w| {
            w.line(
                "click.echo(f\"{path} executed successfully (hook '{hook_name}' not implemented yet)\")",
            );
            w.line("sys.exit(0)");
        });
        w.line("_run_hook(path, hook, context)");
    });
    w.blank();
    w.scope("def _unknown_command(name):", |w| {
        w.line("@click.command(");
        w.line("    name=name,");
        w.line("    context_settings={\"ignore_unknown_options\": True, \"allow_extra_args\": True},");
        w.line(")");
        w.line("@click.pass_context");
        w.scope("def unknown(ctx):", |w| {
            w.line("context = {");
            w.line("    \"commandName\": name,");
            w.line("    \"args\": {\"command\": name},");
            w.line("    \"options\": {},");
            w.line("    \"globalOptions\": _collect_globals(ctx),");
            w.line("}");
            w.line(format!(
                "hook = _lookup({})",
                quoted(CONVENTION.unknown_command_hook())
            ));
            w.scope("if hook is None:", |w| {
                w.line("click.echo(f\"Unknown command: {name}\", err=True)");
                w.line("sys.exit(2)");
            });
            w.line("_run_hook(name, hook, context)");
        });
        w.line("return unknown");
    });
    w.blank();
    w.scope("class _RootGroup(click.Group):", |w| {
        w.line("\"\"\"Routes names that match no command to the unknown-command hook\"\"\"");
        w.blank();
        w.scope("def resolve_command(self, ctx, args):", |w| {
            w.line("name = args[0] if args else None");
            let unknown = "if name and not name.startswith(\"-\") and self.get_command(ctx, name) is None:";
            w.scope(unknown, |w| {
                w.line("return name, _unknown_command(name), args[1:]");
            });
            w.line("return super().resolve_command(ctx, args)");
        });
    });
    w.blank();
}

fn write_root(w: &mut CodeWriter, doc: &CliDocument) {
    w.line("@click.group(");
    w.line("    cls=_RootGroup,");
    w.line(format!("    name={},", quoted(&doc.name)));
    w.line(format!("    help={},", quoted(&root_help(doc))));
    w.line("    invoke_without_command=True,");
    w.line("    context_settings=CONTEXT_SETTINGS,");
    w.line(")");
    write_version(w);
    for option in &doc.root.globals {
        write_option(w, option, "g");
    }
    w.line("@click.pass_context");
    w.scope("def cli(ctx, **params):", |w| {
        w.scope("if ctx.invoked_subcommand is None:", |w| {
            w.line("click.echo(ctx.get_help())");
        });
    });
}

fn write_command(w: &mut CodeWriter, command: &CommandDoc) {
    let decorator = if command.subcommands.is_empty() {
        "@click.command("
    } else {
        "@click.group("
    };
    w.line(decorator);
    w.line(format!("    name={},", quoted(&command.name)));
    w.line(format!("    help={},", quoted(&command.description)));
    if !command.subcommands.is_empty() {
        w.line("    invoke_without_command=True,");
    }
    w.line("    context_settings=CONTEXT_SETTINGS,");
    w.line(")");
    write_version(w);
    for arg in &command.arguments {
        w.line(format!(
            "@click.argument({}, metavar={}, required={})",
            quoted(&format!("a_{}", arg.ident())),
            quoted(&arg.name.to_uppercase()),
            py_bool(arg.required)
        ));
    }
    for option in &command.options {
        write_option(w, option, "o");
    }
    for option in &command.globals {
        write_option(w, option, "g");
    }
    w.line("@click.pass_context");

    let hook = command.hook_name(CONVENTION).unwrap_or_default();
    w.scope(format!("def cmd_{}(ctx, **params):", command.ident()), |w| {
        w.line(format!("\"\"\"{}\"\"\"", py_doc(&command.description)));
        if !command.subcommands.is_empty() {
            w.scope("if ctx.invoked_subcommand is not None:", |w| {
                w.line("return");
            });
        }
        w.line("context = {");
        w.indent();
        w.line(format!("\"commandName\": {},", quoted(&command.name)));
        w.line("\"args\": {");
        w.indent();
        for arg in &command.arguments {
            w.line(format!(
                "{}: params[{}],",
                quoted(&arg.key),
                quoted(&format!("a_{}", arg.ident()))
            ));
        }
        w.dedent();
        w.line("},");
        w.line("\"options\": {");
        w.indent();
        for option in &command.options {
            w.line(format!(
                "{}: params[{}],",
                quoted(&option.name),
                quoted(&format!("o_{}", option.ident()))
            ));
        }
        w.dedent();
        w.line("},");
        w.line("\"globalOptions\": _collect_globals(ctx),");
        w.dedent();
        w.line("}");
        w.line(format!(
            "_dispatch({}, {}, context)",
            quoted(&command.display_path()),
            quoted(hook)
        ));
    });
}

fn write_version(w: &mut CodeWriter) {
    w.line("@click.version_option(VERSION, \"--version\", message=\"%(prog)s %(version)s\")");
}

fn write_option(w: &mut CodeWriter, option: &OptionDoc, prefix: &str) {
    let mut parts: Vec<String> = option.spellings().iter().map(|s| quoted(s)).collect();
    parts.push(quoted(&format!("{}_{}", prefix, option.ident())));

    // Globals get their defaults after every level has been merged
    let own = prefix == "o";
    match option.kind {
        OptionKind::Flag => {
            parts.push("is_flag=True".to_string());
            let default = own && matches!(option.default, Some(DefaultValue::Bool(true)));
            parts.push(format!("default={}", py_bool(default)));
        }
        OptionKind::Count => {
            parts.push("count=True".to_string());
            if let (true, Some(DefaultValue::Count(n))) = (own, &option.default) {
                parts.push(format!("default={}", n));
            }
        }
        OptionKind::String => {
            parts.push(format!("metavar={}", quoted(&option.name.to_uppercase())));
            match (&option.default, own) {
                (Some(DefaultValue::Str(s)), true) => parts.push(format!("default={}", quoted(s))),
                _ => parts.push("default=None".to_string()),
            }
        }
    }
    parts.push(format!("help={}", quoted(&option.description)));
    w.line(format!("@click.option({})", parts.join(", ")));
}

fn render_hooks(doc: &CliDocument) -> String {
    let mut w = CodeWriter::new("    ");
    w.line(format!("\"\"\"Hook implementations for {}", doc.name));
    w.blank();
    w.line("Every hook receives the invocation context:");
    w.blank();
    w.line("    {\"commandName\": str, \"args\": dict, \"options\": dict, \"globalOptions\": dict}");
    w.blank();
    w.line("and returns None for success or an integer exit code. Hooks may be async.");
    w.line("A missing hook makes the command print a \"not implemented yet\" notice.");
    w.line("\"\"\"");
    w.blank();
    w.line("import sys");

    for command in doc.commands() {
        let Some(hook) = command.hook_name(CONVENTION) else {
            continue;
        };
        w.blank();
        w.blank();
        w.scope(format!("def {}(context):", hook), |w| {
            w.line(format!("\"\"\"{}\"\"\"", py_doc(&command.description)));
            w.line(format!(
                "print(f\"{}: {{context['args']}} {{context['options']}}\")",
                py_fstring(&command.display_path())
            ));
        });
    }

    w.blank();
    w.blank();
    let unknown = format!("def {}(context):", doc.unknown_hook.get(CONVENTION));
    w.scope(unknown, |w| {
        w.line("\"\"\"Called for command names that match nothing\"\"\"");
        w.line("print(f\"Unknown command: {context['commandName']}\", file=sys.stderr)");
        w.line("return 2");
    });
    trim_trailing_blank(w.finish())
}

fn root_help(doc: &CliDocument) -> String {
    match &doc.description {
        Some(desc) => format!("{}\n\n{}", doc.tagline_or_name(), desc),
        None => doc.tagline_or_name(),
    }
}

fn parent_ident(command: &CommandDoc, len: usize) -> String {
    command.path[..len - 1]
        .iter()
        .map(|s| crate::model::snake_case(s))
        .collect::<Vec<_>>()
        .join("_")
}

fn py_default(default: Option<&DefaultValue>) -> String {
    match default {
        None => "None".to_string(),
        Some(DefaultValue::Bool(b)) => py_bool(*b).to_string(),
        Some(DefaultValue::Count(n)) => n.to_string(),
        Some(DefaultValue::Str(s)) => quoted(s),
    }
}

fn py_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Text safe inside a triple-quoted docstring
fn py_doc(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Text safe inside a double-quoted f-string
fn py_fstring(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('{', "{{")
        .replace('}', "}}")
}

/// Blocks closed with an empty line leave doubled blank lines at the end
fn trim_trailing_blank(mut text: String) -> String {
    while text.ends_with("\n\n") {
        text.pop();
    }
    text
}
