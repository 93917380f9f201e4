//! Resolved command model
//!
//! This module turns a validated schema into the resolved command tree and
//! derives the hook naming contract shared by every target.

pub mod hooks;
pub mod naming;
pub mod tree;

// Re-export main types
pub use hooks::*;
pub use naming::{pascal_case, snake_case};
pub use tree::*;
