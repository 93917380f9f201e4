//! Schema validation
//!
//! Checks the structural and semantic well-formedness of a raw schema. Validation
//! never stops at the first defect: every violation is collected, qualified with the
//! dotted path of the command it was found in, and reported together.

use crate::error::{Diagnostic, DiagnosticKind, SchemaValidationError};
use crate::schema::types::{
    ArgumentSpec, DefaultValue, NamedCommand, OptionKind, OptionSpec, SchemaDocument,
};
use crate::render::Target;
use std::collections::{HashMap, HashSet};

/// Long names owned by the implicit global options
pub const RESERVED_OPTION_NAMES: &[&str] = &["help", "version"];

/// Short alias owned by `--help`
pub const RESERVED_SHORT: char = 'h';

/// Short aliases of the implicit globals a declared global may replace
const IMPLICIT_SHORTS: &[(&str, &str)] = &[("v", "verbose")];

/// A schema that passed validation
///
/// Only [`validate`] constructs this type, so holding one proves the document is
/// well-formed.
#[derive(Debug, Clone)]
pub struct ValidatedSchema {
    document: SchemaDocument,
}

impl ValidatedSchema {
    /// The validated document
    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    /// Unwrap the validated document
    pub fn into_inner(self) -> SchemaDocument {
        self.document
    }
}

/// Validate a complete schema document
pub fn validate(document: SchemaDocument) -> Result<ValidatedSchema, SchemaValidationError> {
    let diagnostics = collect_diagnostics(&document);
    if diagnostics.is_empty() {
        Ok(ValidatedSchema { document })
    } else {
        Err(SchemaValidationError { diagnostics })
    }
}

/// Run every check and return all findings, in check order
pub fn collect_diagnostics(document: &SchemaDocument) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let cli = &document.cli;
    let root_path = if cli.name.is_empty() {
        "<cli>".to_string()
    } else {
        cli.name.clone()
    };

    if cli.name.is_empty() {
        push(&mut diagnostics, &root_path, DiagnosticKind::EmptyRootName);
    } else if !is_root_name(&cli.name) {
        push(
            &mut diagnostics,
            &root_path,
            DiagnosticKind::InvalidRootName(cli.name.clone()),
        );
    }

    for target in &document.targets {
        if target.parse::<Target>().is_err() {
            push(
                &mut diagnostics,
                &root_path,
                DiagnosticKind::UnknownTarget(target.clone()),
            );
        }
    }

    check_siblings(&mut diagnostics, &root_path, &cli.commands);
    let implicit: Vec<(&str, &str)> = IMPLICIT_SHORTS
        .iter()
        .copied()
        .filter(|(_, owner)| !cli.options.iter().any(|o| o.name == *owner))
        .collect();
    check_options(&mut diagnostics, &root_path, &cli.options, &implicit);

    for command in &cli.commands {
        check_command(&mut diagnostics, &root_path, command);
    }

    diagnostics
}

/// Validate one command and, recursively, its subcommands
fn check_command(diagnostics: &mut Vec<Diagnostic>, parent: &str, command: &NamedCommand) {
    let path = format!("{}.{}", parent, command.name);
    let spec = &command.spec;

    if !command.name.chars().any(char::is_alphanumeric) || command.name.starts_with('-') {
        push(
            diagnostics,
            &path,
            DiagnosticKind::InvalidCommandName(command.name.clone()),
        );
    }

    check_siblings(diagnostics, &path, &spec.subcommands);
    check_options(diagnostics, &path, &spec.options, &[]);
    check_arguments(diagnostics, &path, &spec.args);

    for sub in &spec.subcommands {
        check_command(diagnostics, &path, sub);
    }
}

/// Sibling commands must have distinct names
fn check_siblings(diagnostics: &mut Vec<Diagnostic>, path: &str, commands: &[NamedCommand]) {
    let mut seen = HashSet::new();
    for command in commands {
        if !seen.insert(command.name.as_str()) {
            push(
                diagnostics,
                path,
                DiagnosticKind::DuplicateCommand(command.name.clone()),
            );
        }
    }
}

/// Options declared side by side: names, shorts, types and defaults
///
/// `taken` lists short aliases already owned in this scope, as `(short, option)`.
fn check_options<'a>(
    diagnostics: &mut Vec<Diagnostic>,
    path: &str,
    options: &'a [OptionSpec],
    taken: &[(&'a str, &'a str)],
) {
    let mut names = HashSet::new();
    let mut shorts: HashMap<&str, &str> = taken.iter().copied().collect();

    for option in options {
        if !is_identifier(&option.name) {
            push(
                diagnostics,
                path,
                DiagnosticKind::InvalidName {
                    what: "option",
                    name: option.name.clone(),
                },
            );
        } else if RESERVED_OPTION_NAMES.contains(&option.name.as_str()) {
            push(
                diagnostics,
                path,
                DiagnosticKind::ReservedOption(option.name.clone()),
            );
        }

        if !names.insert(option.name.as_str()) {
            push(
                diagnostics,
                path,
                DiagnosticKind::DuplicateOption(option.name.clone()),
            );
        }

        if let Some(short) = &option.short {
            if !is_short_alias(short) {
                push(
                    diagnostics,
                    path,
                    DiagnosticKind::InvalidShort {
                        option: option.name.clone(),
                        short: short.clone(),
                    },
                );
            } else if short.starts_with(RESERVED_SHORT) {
                push(
                    diagnostics,
                    path,
                    DiagnosticKind::ReservedShort {
                        option: option.name.clone(),
                        short: short.clone(),
                    },
                );
            } else if let Some(first) = shorts.get(short.as_str()) {
                push(
                    diagnostics,
                    path,
                    DiagnosticKind::DuplicateShort {
                        short: short.clone(),
                        first: (*first).to_string(),
                        second: option.name.clone(),
                    },
                );
            } else {
                shorts.insert(short.as_str(), option.name.as_str());
            }
        }
    }

    for option in options {
        check_option_type(diagnostics, path, option);
    }
}

/// The type must be known and the default must fit it
fn check_option_type(diagnostics: &mut Vec<Diagnostic>, path: &str, option: &OptionSpec) {
    let Some(kind) = OptionKind::parse(&option.option_type) else {
        push(
            diagnostics,
            path,
            DiagnosticKind::UnknownOptionType {
                option: option.name.clone(),
                type_name: option.option_type.clone(),
            },
        );
        return;
    };

    if let Some(default) = &option.default {
        if DefaultValue::from_yaml(kind, default).is_none() {
            push(
                diagnostics,
                path,
                DiagnosticKind::DefaultTypeMismatch {
                    option: option.name.clone(),
                    kind: kind.as_str().to_string(),
                },
            );
        }
    }
}

/// Argument names must be valid and unique; required arguments come first
fn check_arguments(diagnostics: &mut Vec<Diagnostic>, path: &str, args: &[ArgumentSpec]) {
    let mut names = HashSet::new();
    for arg in args {
        if !is_identifier(&arg.name) {
            push(
                diagnostics,
                path,
                DiagnosticKind::InvalidName {
                    what: "argument",
                    name: arg.name.clone(),
                },
            );
        }
        if !names.insert(arg.name.to_lowercase()) {
            push(
                diagnostics,
                path,
                DiagnosticKind::DuplicateArgument(arg.name.clone()),
            );
        }
    }

    let mut first_optional: Option<&ArgumentSpec> = None;
    for arg in args {
        match (arg.required, first_optional) {
            (false, None) => first_optional = Some(arg),
            (true, Some(optional)) => push(
                diagnostics,
                path,
                DiagnosticKind::RequiredAfterOptional {
                    optional: optional.name.clone(),
                    required: arg.name.clone(),
                },
            ),
            _ => {}
        }
    }
}

fn push(diagnostics: &mut Vec<Diagnostic>, path: &str, kind: DiagnosticKind) {
    diagnostics.push(Diagnostic {
        path: path.to_string(),
        kind,
    });
}

/// Letters, digits, hyphen and underscore
fn is_root_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// An option or argument name: starts with a letter or digit, then letters, digits, `-`, `_`
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        _ => false,
    }
}

fn is_short_alias(short: &str) -> bool {
    let mut chars = short.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphanumeric())
}
