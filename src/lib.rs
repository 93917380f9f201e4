//! polycli - generate CLI front-ends for several runtimes from one YAML schema
//!
//! A schema describes a command tree once. polycli validates it, resolves it into an
//! immutable tree, derives the hook names user code implements, and emits an entry
//! point, hook stubs and type declarations for Python, Node.js, TypeScript and Rust,
//! plus bash, zsh and fish completion scripts.

// Public modules
pub mod cli;
pub mod completion;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod schema;
pub mod ui;

// Re-export commonly used types
pub use error::{PolycliError, Result};

/// Current version of polycli
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
