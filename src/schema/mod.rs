//! Schema loading and validation
//!
//! This module handles parsing of CLI schema documents and the validation of
//! their structure before anything is resolved or generated.

pub mod parse;
pub mod types;
pub mod validate;

// Re-export main types
pub use parse::*;
pub use types::*;
pub use validate::*;
