//! Clap command construction from the resolved tree
//!
//! Every command registers its positional arguments followed by its effective
//! options, so each level accepts the same spellings every emitted target accepts.
//! Argument ids are namespaced (`arg:`, `opt:`, `global:`) so an own option can
//! never clash with an inherited global of the same command.

use crate::model::{OptionOrigin, ResolvedCommand, ResolvedOption, ResolvedTree};
use crate::schema::{DefaultValue, OptionKind};
use clap::{Arg, ArgAction, Command};

/// Id of a positional argument
pub fn arg_id(key: &str) -> String {
    format!("arg:{}", key)
}

/// Id of an option, by origin
pub fn option_id(option: &ResolvedOption) -> String {
    match option.origin {
        OptionOrigin::Local => format!("opt:{}", option.name),
        OptionOrigin::Global => format!("global:{}", option.name),
        OptionOrigin::Builtin => option.name.clone(),
    }
}

/// Build the clap command for a resolved tree
pub fn build_command(tree: &ResolvedTree) -> Command {
    let mut cmd = configure(Command::new(tree.name.clone()), &tree.root, &tree.version)
        .about(tree.tagline.clone())
        // Unknown top-level names are routed to the unknown-command hook
        .allow_external_subcommands(true);

    if let Some(desc) = &tree.description {
        cmd = cmd.long_about(desc.clone());
    }

    cmd
}

fn configure(mut cmd: Command, node: &ResolvedCommand, version: &str) -> Command {
    cmd = cmd
        .version(version.to_string())
        .disable_version_flag(true)
        .disable_help_subcommand(true);

    for arg in &node.arguments {
        cmd = cmd.arg(
            Arg::new(arg_id(&arg.key))
                .value_name(arg.name.to_uppercase())
                .help(arg.description.clone())
                .required(arg.required),
        );
    }

    for option in &node.effective_options {
        // clap provides -h/--help itself
        if option.is_builtin() && option.name == "help" {
            continue;
        }
        cmd = cmd.arg(build_option(option));
    }

    for sub in &node.subcommands {
        let sub_cmd = Command::new(sub.name.clone()).about(sub.description.clone());
        cmd = cmd.subcommand(configure(sub_cmd, sub, version));
    }

    cmd
}

fn build_option(option: &ResolvedOption) -> Arg {
    let mut arg = Arg::new(option_id(option))
        .long(option.name.clone())
        .help(option.description.clone());

    if let Some(c) = option.short {
        arg = arg.short(c);
    }

    if option.is_builtin() {
        return arg.action(ArgAction::Version);
    }

    match option.kind {
        OptionKind::Flag => arg.action(ArgAction::SetTrue),
        OptionKind::Count => arg.action(ArgAction::Count),
        OptionKind::String => {
            arg = arg
                .action(ArgAction::Set)
                .value_name(option.name.to_uppercase());
            // Global defaults are applied after all levels are merged
            if option.origin == OptionOrigin::Local {
                if let Some(DefaultValue::Str(default)) = &option.default {
                    arg = arg.default_value(default.clone());
                }
            }
            arg
        }
    }
}
