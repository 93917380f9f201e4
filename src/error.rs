//! Error types for polycli

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for polycli operations
pub type Result<T> = std::result::Result<T, PolycliError>;

/// Main error type for polycli
#[derive(Error, Debug)]
pub enum PolycliError {
    /// Schema loading errors
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Structural or semantic defects found by the validator
    #[error("{0}")]
    Validation(#[from] SchemaValidationError),

    /// Two command paths derive the same hook identifier
    #[error("{0}")]
    HookNameCollision(#[from] HookCollisionError),

    /// Completion rendering or installation errors
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    /// Errors while writing generated output
    #[error("Emission error: {0}")]
    Emission(#[from] EmissionError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Schema file discovery and parsing errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to find schema file (searched: {0})")]
    NotFound(String),

    #[error("Failed to read '{path}': {error}")]
    Read { path: PathBuf, error: String },

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Refusing to overwrite existing file '{0}' (use --force)")]
    AlreadyExists(PathBuf),
}

/// One defect found while validating a schema, qualified by the command path it was found at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Dotted command path, starting at the root CLI name (e.g. `demo.database.status`)
    pub path: String,
    /// What is wrong
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

/// The individual checks the validator performs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    #[error("CLI name must not be empty")]
    EmptyRootName,

    #[error("invalid CLI name '{0}' (allowed: letters, digits, '-', '_')")]
    InvalidRootName(String),

    #[error("command name must contain at least one letter or digit (got '{0}')")]
    InvalidCommandName(String),

    #[error("invalid {what} name '{name}'")]
    InvalidName { what: &'static str, name: String },

    #[error("duplicate command '{0}'")]
    DuplicateCommand(String),

    #[error("duplicate option '{0}'")]
    DuplicateOption(String),

    #[error("duplicate argument '{0}'")]
    DuplicateArgument(String),

    #[error("options '{first}' and '{second}' share the short alias '-{short}'")]
    DuplicateShort {
        short: String,
        first: String,
        second: String,
    },

    #[error("short alias '{short}' of option '{option}' must be a single letter or digit")]
    InvalidShort { option: String, short: String },

    #[error("option name '{0}' is reserved")]
    ReservedOption(String),

    #[error("short alias '-{short}' of option '{option}' is reserved for --help")]
    ReservedShort { option: String, short: String },

    #[error("optional argument '{optional}' must not precede required argument '{required}'")]
    RequiredAfterOptional { optional: String, required: String },

    #[error("option '{option}' has unknown type '{type_name}' (expected flag, string or count)")]
    UnknownOptionType { option: String, type_name: String },

    #[error("default of option '{option}' does not match its type '{kind}'")]
    DefaultTypeMismatch { option: String, kind: String },

    #[error("unknown target '{0}' (expected python, nodejs, typescript or rust)")]
    UnknownTarget(String),
}

/// Every defect of a schema, collected before reporting
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct SchemaValidationError {
    pub diagnostics: Vec<Diagnostic>,
}

impl fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Schema validation failed with {} defect(s):",
            self.diagnostics.len()
        )?;
        for diagnostic in &self.diagnostics {
            write!(f, "\n  - {}", diagnostic)?;
        }
        Ok(())
    }
}

/// Two distinct command paths that derive the same hook identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookNameCollision {
    pub hook: String,
    pub first: String,
    pub second: String,
}

impl fmt::Display for HookNameCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hook '{}' is derived by both '{}' and '{}'",
            self.hook, self.first, self.second
        )
    }
}

/// All hook name collisions of a resolved tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct HookCollisionError {
    pub collisions: Vec<HookNameCollision>,
}

impl fmt::Display for HookCollisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook name collision:")?;
        for collision in &self.collisions {
            write!(f, "\n  - {}", collision)?;
        }
        Ok(())
    }
}

/// Completion rendering and installation errors
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Unsupported shell: '{0}' (expected bash, zsh or fish)")]
    UnsupportedShell(String),

    #[error("Could not determine the home directory")]
    NoHomeDirectory,

    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Filesystem failures while writing generated files
#[derive(Error, Debug)]
pub enum EmissionError {
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Specialized result type for schema loading
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Specialized result type for completion operations
pub type CompletionResult<T> = std::result::Result<T, CompletionError>;

/// Specialized result type for emission
pub type EmissionResult<T> = std::result::Result<T, EmissionError>;
