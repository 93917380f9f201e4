//! Intermediate document model
//!
//! Emitters never look at the schema or interpolate raw strings from it. A visitor
//! walks the resolved tree once and produces a [`CliDocument`]: sections for the
//! program, one [`CommandDoc`] per command with its arguments, own options and the
//! globals visible at that level. Each target then serializes the same document, so
//! parity between targets is decided here and nowhere else.

use crate::model::{
    snake_case, HookContract, HookConvention, HookNames, ResolvedArgument,
    ResolvedCommand, ResolvedOption, ResolvedTree, UNKNOWN_COMMAND_HOOK_CAMEL,
    UNKNOWN_COMMAND_HOOK_SNAKE,
};
use crate::schema::{DefaultValue, OptionKind};

/// A positional argument as rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentDoc {
    pub name: String,
    pub key: String,
    pub description: String,
    pub required: bool,
}

impl From<&ResolvedArgument> for ArgumentDoc {
    fn from(arg: &ResolvedArgument) -> Self {
        ArgumentDoc {
            name: arg.name.clone(),
            key: arg.key.clone(),
            description: arg.description.clone(),
            required: arg.required,
        }
    }
}

impl ArgumentDoc {
    pub fn ident(&self) -> String {
        snake_case(&self.key)
    }
}

/// An option as rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDoc {
    pub name: String,
    pub short: Option<char>,
    pub description: String,
    pub kind: OptionKind,
    pub default: Option<DefaultValue>,
}

impl OptionDoc {
    /// `--name` plus `-s` when present, short first
    pub fn spellings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(c) = self.short {
            out.push(format!("-{}", c));
        }
        out.push(format!("--{}", self.name));
        out
    }

    /// Identifier-safe form of the long name (`dry-run` -> `dry_run`)
    pub fn ident(&self) -> String {
        snake_case(&self.name)
    }

    pub fn takes_value(&self) -> bool {
        self.kind == OptionKind::String
    }
}

impl From<&ResolvedOption> for OptionDoc {
    fn from(option: &ResolvedOption) -> Self {
        OptionDoc {
            name: option.name.clone(),
            short: option.short,
            description: option.description.clone(),
            kind: option.kind,
            default: option.default.clone(),
        }
    }
}

/// One command of the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDoc {
    pub name: String,
    pub description: String,
    /// Path segments; empty for the root
    pub path: Vec<String>,
    pub hook: Option<HookNames>,
    pub arguments: Vec<ArgumentDoc>,
    /// Options declared on this command
    pub options: Vec<OptionDoc>,
    /// Forwarded globals visible at this command, in declaration order
    pub globals: Vec<OptionDoc>,
    pub subcommands: Vec<CommandDoc>,
}

impl CommandDoc {
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Space-joined path, as shown in messages
    pub fn display_path(&self) -> String {
        self.path.join(" ")
    }

    /// Identifier stem unique within the document (`database_status`, `root`)
    pub fn ident(&self) -> String {
        if self.path.is_empty() {
            "root".to_string()
        } else {
            self.path
                .iter()
                .map(|s| snake_case(s))
                .collect::<Vec<_>>()
                .join("_")
        }
    }

    pub fn hook_name(&self, convention: HookConvention) -> Option<&str> {
        self.hook.as_ref().map(|h| h.get(convention))
    }

    /// This command and all descendants, depth-first in declaration order
    pub fn walk(&self) -> Vec<&CommandDoc> {
        let mut out = vec![self];
        for sub in &self.subcommands {
            out.extend(sub.walk());
        }
        out
    }
}

/// Everything an emitter renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliDocument {
    pub name: String,
    pub tagline: String,
    pub description: Option<String>,
    pub version: String,
    /// Forwarded global options (help and version excluded)
    pub globals: Vec<OptionDoc>,
    pub root: CommandDoc,
    pub unknown_hook: HookNames,
}

impl CliDocument {
    /// Build the document from a tree whose hook contract has been checked
    pub fn build(tree: &ResolvedTree, contract: &HookContract) -> Self {
        let mut visitor = DocumentVisitor { contract };
        CliDocument {
            name: tree.name.clone(),
            tagline: tree.tagline.clone(),
            description: tree.description.clone(),
            version: tree.version.clone(),
            globals: tree.globals.forwarded().map(OptionDoc::from).collect(),
            root: visitor.visit(&tree.root),
            unknown_hook: HookNames {
                camel: UNKNOWN_COMMAND_HOOK_CAMEL.to_string(),
                snake: UNKNOWN_COMMAND_HOOK_SNAKE.to_string(),
            },
        }
    }

    /// Tagline, or the program name when the schema has none
    pub fn tagline_or_name(&self) -> String {
        if self.tagline.is_empty() {
            self.name.clone()
        } else {
            self.tagline.clone()
        }
    }

    /// Every command except the root
    pub fn commands(&self) -> Vec<&CommandDoc> {
        self.root.walk().into_iter().skip(1).collect()
    }

    /// Every hook name under a convention, the unknown-command fallback last
    pub fn hook_names(&self, convention: HookConvention) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .commands()
            .into_iter()
            .filter_map(|c| c.hook_name(convention))
            .collect();
        names.push(self.unknown_hook.get(convention));
        names
    }
}

struct DocumentVisitor<'a> {
    contract: &'a HookContract,
}

impl DocumentVisitor<'_> {
    fn visit(&mut self, command: &ResolvedCommand) -> CommandDoc {
        let hook = self
            .contract
            .entries()
            .iter()
            .find(|e| e.path == command.path)
            .map(|e| e.names.clone());

        CommandDoc {
            name: command.name.clone(),
            description: command.description.clone(),
            path: command.path.segments().to_vec(),
            hook,
            arguments: command.arguments.iter().map(ArgumentDoc::from).collect(),
            options: command.options.iter().map(OptionDoc::from).collect(),
            globals: command.inherited_globals().map(OptionDoc::from).collect(),
            subcommands: command.subcommands.iter().map(|c| self.visit(c)).collect(),
        }
    }
}
