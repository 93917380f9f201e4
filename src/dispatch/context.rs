//! Invocation context delivered to hooks
//!
//! The context shape is the cross-target contract a hook author relies on:
//! `commandName`, `args`, `options` and `globalOptions`, with flags as booleans,
//! counts as integers and strings as raw strings (or their declared default).

use crate::model::{OptionOrigin, ResolvedCommand, ResolvedOption, ResolvedTree};
use crate::schema::{DefaultValue, OptionKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// A parsed option value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Count(u64),
    Str(String),
    Null,
}

impl OptionValue {
    /// The value an option has when it was not supplied
    pub fn initial(option: &ResolvedOption) -> Self {
        match (option.kind, &option.default) {
            (OptionKind::Flag, Some(DefaultValue::Bool(b))) => OptionValue::Bool(*b),
            (OptionKind::Flag, _) => OptionValue::Bool(false),
            (OptionKind::Count, Some(DefaultValue::Count(n))) => OptionValue::Count(*n),
            (OptionKind::Count, _) => OptionValue::Count(0),
            (OptionKind::String, Some(DefaultValue::Str(s))) => OptionValue::Str(s.clone()),
            (OptionKind::String, _) => OptionValue::Null,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<u64> {
        match self {
            OptionValue::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// The context passed to every hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationContext {
    /// Leaf command name (or the attempted name for unknown commands)
    pub command_name: String,
    /// Argument key -> supplied value
    pub args: BTreeMap<String, Option<String>>,
    /// Own option long name -> parsed value
    pub options: BTreeMap<String, OptionValue>,
    /// Forwarded global option long name -> parsed value
    pub global_options: BTreeMap<String, OptionValue>,
}

impl InvocationContext {
    /// Context for a command of the tree with every value unset
    pub fn empty_for(command: &ResolvedCommand) -> Self {
        InvocationContext {
            command_name: command.name.clone(),
            args: command
                .arguments
                .iter()
                .map(|a| (a.key.clone(), None))
                .collect(),
            options: command
                .options
                .iter()
                .map(|o| (o.name.clone(), OptionValue::initial(o)))
                .collect(),
            global_options: BTreeMap::new(),
        }
    }

    /// Supplied value of an argument
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(|v| v.as_deref())
    }

    /// Value of an own option
    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    /// Value of a forwarded global option
    pub fn global(&self, name: &str) -> Option<&OptionValue> {
        self.global_options.get(name)
    }

    /// Serialize as the JSON object generated entry points build
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Accumulates global option values across the levels of a command path
///
/// A global may be given at any level (`demo -v database status` or
/// `demo database status -v`); flags are OR-ed, counts summed, and the deepest
/// string wins. Declared string defaults apply only when no level supplied one.
#[derive(Debug, Clone)]
pub struct GlobalValues<'a> {
    forwarded: Vec<&'a ResolvedOption>,
    values: BTreeMap<String, OptionValue>,
}

impl<'a> GlobalValues<'a> {
    pub fn new(tree: &'a ResolvedTree) -> Self {
        let forwarded: Vec<&ResolvedOption> = tree.globals.forwarded().collect();
        let values = forwarded
            .iter()
            .map(|o| {
                let start = match o.kind {
                    OptionKind::Flag => OptionValue::Bool(false),
                    OptionKind::Count => OptionValue::Count(0),
                    OptionKind::String => OptionValue::Null,
                };
                (o.name.clone(), start)
            })
            .collect();
        GlobalValues { forwarded, values }
    }

    /// Record the value one level supplied for a global
    pub fn record(&mut self, option: &ResolvedOption, value: OptionValue) {
        debug_assert_eq!(option.origin, OptionOrigin::Global);
        let Some(slot) = self.values.get_mut(&option.name) else {
            return;
        };
        let merged = match (&*slot, value) {
            (OptionValue::Bool(a), OptionValue::Bool(b)) => OptionValue::Bool(*a || b),
            (OptionValue::Count(a), OptionValue::Count(b)) => OptionValue::Count(a + b),
            (current, OptionValue::Null) => current.clone(),
            (_, supplied) => supplied,
        };
        *slot = merged;
    }

    /// Final values with declared defaults applied
    pub fn finish(self) -> BTreeMap<String, OptionValue> {
        let mut values = self.values;
        for option in self.forwarded {
            if let Some(slot) = values.get_mut(&option.name) {
                let replacement = match (&*slot, &option.default) {
                    (OptionValue::Null, Some(DefaultValue::Str(s))) => {
                        Some(OptionValue::Str(s.clone()))
                    }
                    (OptionValue::Bool(false), Some(DefaultValue::Bool(true))) => {
                        Some(OptionValue::Bool(true))
                    }
                    (OptionValue::Count(0), Some(DefaultValue::Count(n))) => {
                        Some(OptionValue::Count(*n))
                    }
                    _ => None,
                };
                if let Some(value) = replacement {
                    *slot = value;
                }
            }
        }
        values
    }
}
