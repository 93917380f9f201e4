//! Raw schema types
//!
//! This module defines the data structures that represent a CLI schema document
//! exactly as written by the author, before validation and resolution.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Top-level schema document
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchemaDocument {
    /// The CLI being described
    pub cli: CliSpec,

    /// Default emission targets (e.g. `[python, rust]`); empty means all targets
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
}

/// The root command of the generated CLI
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliSpec {
    /// Program name, used as the root command and completion namespace
    pub name: String,

    /// One-line summary shown at the top of the root help
    #[serde(default)]
    pub tagline: String,

    /// Version printed by `--version`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Longer description for the root help
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Global options inherited by every command
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSpec>,

    /// Top-level commands, in declaration order
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_commands",
        serialize_with = "serialize_commands"
    )]
    pub commands: Vec<NamedCommand>,
}

/// A command together with the name it was declared under
#[derive(Debug, Clone)]
pub struct NamedCommand {
    pub name: String,
    pub spec: CommandSpec,
}

impl NamedCommand {
    pub fn new(name: impl Into<String>, spec: CommandSpec) -> Self {
        NamedCommand {
            name: name.into(),
            spec,
        }
    }
}

/// A command or subcommand definition
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommandSpec {
    /// Usage description for help text
    #[serde(default)]
    pub desc: String,

    /// Positional arguments, bound in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgumentSpec>,

    /// Named options for the command
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSpec>,

    /// Nested subcommands, in declaration order
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_commands",
        serialize_with = "serialize_commands"
    )]
    pub subcommands: Vec<NamedCommand>,
}

/// A positional argument definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArgumentSpec {
    /// Argument name
    pub name: String,

    /// Usage description for help text
    #[serde(default)]
    pub desc: String,

    /// Whether the argument must be supplied
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// An option (flag) definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OptionSpec {
    /// Long form, without the leading dashes
    pub name: String,

    /// Short alias (single character)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    /// Usage description for help text
    #[serde(default)]
    pub desc: String,

    /// Option type (flag, string, count)
    #[serde(rename = "type", default = "default_option_type")]
    pub option_type: String,

    /// Default value, checked against the type by the validator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

fn default_option_type() -> String {
    "string".to_string()
}

impl OptionSpec {
    /// Build a string option with no short alias and no default
    pub fn new(name: impl Into<String>, option_type: impl Into<String>) -> Self {
        OptionSpec {
            name: name.into(),
            short: None,
            desc: String::new(),
            option_type: option_type.into(),
            default: None,
        }
    }
}

/// The kinds of value an option can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    /// Presence toggles a boolean; carries no value
    Flag,
    /// Takes one string value
    String,
    /// Counts occurrences (e.g. `-vvv`)
    Count,
}

impl OptionKind {
    /// Parse a schema type name, accepting the aliases older schemas use
    pub fn parse(type_name: &str) -> Option<Self> {
        match type_name {
            "flag" | "bool" | "boolean" => Some(OptionKind::Flag),
            "string" | "str" => Some(OptionKind::String),
            "count" => Some(OptionKind::Count),
            _ => None,
        }
    }

    /// Canonical type name
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::Flag => "flag",
            OptionKind::String => "string",
            OptionKind::Count => "count",
        }
    }
}

/// A type-checked default value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    Bool(bool),
    Count(u64),
    Str(String),
}

impl DefaultValue {
    /// Interpret a raw YAML default for the given kind; `None` means the value does not fit
    pub fn from_yaml(kind: OptionKind, value: &Value) -> Option<Self> {
        match (kind, value) {
            (OptionKind::Flag, Value::Bool(b)) => Some(DefaultValue::Bool(*b)),
            (OptionKind::Count, Value::Number(n)) => n.as_u64().map(DefaultValue::Count),
            (OptionKind::String, Value::String(s)) => Some(DefaultValue::Str(s.clone())),
            (OptionKind::String, Value::Number(n)) => Some(DefaultValue::Str(n.to_string())),
            (OptionKind::String, Value::Bool(b)) => Some(DefaultValue::Str(b.to_string())),
            _ => None,
        }
    }
}

/// Custom deserializer for command maps that keeps declaration order
///
/// Entries are read one by one, so a repeated name is kept and left for the
/// validator to report alongside every other defect.
fn deserialize_commands<'de, D>(deserializer: D) -> Result<Vec<NamedCommand>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserializer.deserialize_any(CommandsVisitor)
}

struct CommandsVisitor;

impl<'de> serde::de::Visitor<'de> for CommandsVisitor {
    type Value = Vec<NamedCommand>;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a mapping of name to command")
    }

    // Null or not present
    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(Vec::new())
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(Vec::new())
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        use serde::de::Error;

        let mut commands = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(key) = map.next_key::<Value>()? {
            let name = match key {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                _ => return Err(A::Error::custom("command names must be strings")),
            };
            // An empty node (`status:`) is a command with no description
            let spec = map.next_value::<Option<CommandSpec>>()?.unwrap_or_default();
            commands.push(NamedCommand { name, spec });
        }
        Ok(commands)
    }
}

fn serialize_commands<S>(commands: &[NamedCommand], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;

    let mut map = serializer.serialize_map(Some(commands.len()))?;
    for command in commands {
        map.serialize_entry(&command.name, &command.spec)?;
    }
    map.end()
}
