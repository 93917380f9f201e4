//! Command-line interface of the generator
//!
//! This module handles argument parsing for `polycli` itself and routes each
//! subcommand to the pipeline, the completion installer or the reference dispatcher.

pub mod app;

// Re-export main types
pub use app::*;
