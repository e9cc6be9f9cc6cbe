//! CLI module - command-line interface
//!
//! Contains the REPL, command parsing, and the remembered user name.

pub mod commands;
pub mod memory;
pub mod repl;

pub use memory::{resolve_user_name, Greeting, UserMemory};
pub use repl::Repl;
