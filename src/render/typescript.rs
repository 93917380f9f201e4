//! TypeScript target
//!
//! The entry point is the commander program of the JavaScript target with type
//! annotations. `types.ts` declares one args interface, one options interface and
//! one context type per command, plus a `Hooks` interface the entry point checks
//! the hook module against at compile time.

use crate::model::{pascal_case, HookConvention};
use crate::render::doc::{CliDocument, CommandDoc, OptionDoc};
use crate::render::javascript::{render_entry, render_package, Flavor};
use crate::render::writer::{quoted, type_name, CodeWriter};
use crate::render::{banner, EmittedFile, Emitter, FileKind, Target};
use crate::schema::{DefaultValue, OptionKind};

const CONVENTION: HookConvention = HookConvention::PrefixedCamel;

pub struct TypeScriptEmitter;

impl Emitter for TypeScriptEmitter {
    fn target(&self) -> Target {
        Target::TypeScript
    }

    fn emit(&self, doc: &CliDocument) -> Vec<EmittedFile> {
        vec![
            EmittedFile::new(
                "src/cli.ts",
                render_entry(doc, Flavor::TypeScript),
                FileKind::Entry,
            ),
            EmittedFile::new("src/hooks.ts", render_hooks(doc), FileKind::HookStub),
            EmittedFile::new("src/types.ts", render_types(doc), FileKind::Types),
            EmittedFile::new(
                "package.json",
                render_package(doc, Flavor::TypeScript),
                FileKind::Manifest,
            ),
            EmittedFile::new("tsconfig.json", render_tsconfig(), FileKind::Manifest),
        ]
    }
}

/// Type-name stem of a command (`DatabaseStatus`)
pub fn type_stem(command: &CommandDoc) -> String {
    type_name(&pascal_case(&command.ident()))
}

/// TypeScript type of an option value as delivered to hooks
fn option_type(option: &OptionDoc) -> &'static str {
    match (option.kind, &option.default) {
        (OptionKind::Flag, _) => "boolean",
        (OptionKind::Count, _) => "number",
        (OptionKind::String, Some(DefaultValue::Str(_))) => "string",
        (OptionKind::String, _) => "string | null",
    }
}

fn render_types(doc: &CliDocument) -> String {
    let mut w = CodeWriter::new("  ");
    w.line(format!("// {}", banner(doc)));
    w.blank();
    w.line("/** What a hook returns: nothing for success, or an exit code */");
    w.line("export type HookResult = void | number | Promise<void | number>;");
    w.blank();
    w.block("export interface GlobalOptions {", "}", |w| {
        for option in &doc.globals {
            w.line(format!("{}: {};", quoted(&option.name), option_type(option)));
        }
    });
    w.blank();
    w.line("/** The context every hook receives */");
    w.block("export interface InvocationContext<A, O> {", "}", |w| {
        w.line("commandName: string;");
        w.line("args: A;");
        w.line("options: O;");
        w.line("globalOptions: GlobalOptions;");
    });

    for command in doc.commands() {
        let stem = type_stem(command);
        w.blank();
        w.line(format!("/** {} */", ts_comment(&command.display_path())));
        if command.arguments.is_empty() {
            w.line(format!("export type {}Args = Record<string, never>;", stem));
        } else {
            w.block(format!("export interface {}Args {{", stem), "}", |w| {
                for arg in &command.arguments {
                    let ty = if arg.required { "string" } else { "string | null" };
                    w.line(format!("{}: {};", quoted(&arg.key), ty));
                }
            });
        }
        if command.options.is_empty() {
            w.line(format!("export type {}Options = Record<string, never>;", stem));
        } else {
            w.block(format!("export interface {}Options {{", stem), "}", |w| {
                for option in &command.options {
                    w.line(format!("{}: {};", quoted(&option.name), option_type(option)));
                }
            });
        }
        w.line(format!(
            "export type {0}Context = InvocationContext<{0}Args, {0}Options>;",
            stem
        ));
    }

    w.blank();
    w.line("export type UnknownCommandContext = InvocationContext<{ command: string }, Record<string, never>>;");
    w.blank();
    w.line("/** Hook module shape; a missing hook falls back to a notice */");
    w.block("export interface Hooks {", "}", |w| {
        for command in doc.commands() {
            if let Some(hook) = command.hook_name(CONVENTION) {
                w.line(format!(
                    "{}?: (context: {}Context) => HookResult;",
                    hook,
                    type_stem(command)
                ));
            }
        }
        w.line(format!(
            "{}?: (context: UnknownCommandContext) => HookResult;",
            doc.unknown_hook.get(CONVENTION)
        ));
    });
    w.finish()
}

fn render_hooks(doc: &CliDocument) -> String {
    let mut w = CodeWriter::new("  ");
    w.line(format!("// Hook implementations for {}", doc.name));
    w.line("//");
    w.line("// Return nothing for success or an integer exit code. Removing a hook makes");
    w.line("// its command print a \"not implemented yet\" notice.");
    w.blank();

    let mut imports: Vec<String> = doc
        .commands()
        .into_iter()
        .map(|c| format!("{}Context", type_stem(c)))
        .collect();
    imports.push("UnknownCommandContext".to_string());
    w.line(format!(
        "import type {{ {} }} from \"./types\";",
        imports.join(", ")
    ));

    for command in doc.commands() {
        let Some(hook) = command.hook_name(CONVENTION) else {
            continue;
        };
        w.blank();
        w.line(format!("/** {} */", ts_comment(&command.description)));
        w.block(
            format!(
                "export async function {}(context: {}Context): Promise<void> {{",
                hook,
                type_stem(command)
            ),
            "}",
            |w| {
                w.line(format!(
                    "console.log(`{}: ${{JSON.stringify(context.args)}} ${{JSON.stringify(context.options)}}`);",
                    template_text(&command.display_path())
                ));
            },
        );
    }

    w.blank();
    w.line("/** Called for command names that match nothing */");
    w.block(
        format!(
            "export async function {}(context: UnknownCommandContext): Promise<number> {{",
            doc.unknown_hook.get(CONVENTION)
        ),
        "}",
        |w| {
            w.line("console.error(`Unknown command: ${context.commandName}`);");
            w.line("return 2;");
        },
    );
    w.finish()
}

fn render_tsconfig() -> String {
    let config = serde_json::json!({
        "compilerOptions": {
            "target": "ES2020",
            "module": "commonjs",
            "rootDir": "src",
            "outDir": "dist",
            "strict": true,
            "esModuleInterop": true,
            "skipLibCheck": true
        },
        "include": ["src"]
    });
    let mut text = serde_json::to_string_pretty(&config).unwrap_or_default();
    text.push('\n');
    text
}

fn ts_comment(text: &str) -> String {
    text.replace("*/", "* /")
}

/// Text safe inside a template literal
fn template_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}
