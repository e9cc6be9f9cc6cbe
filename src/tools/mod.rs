//! Tools module - tool implementations for the assistant
//!
//! Contains the tool trait, the registry, and the built-in tools.

pub mod builtin;
pub mod registry;

pub use registry::{FnTool, Tool, ToolRegistry};
