//! Toolchat - function-calling chat assistant
//!
//! A terminal assistant that lets a chat-completion model call local tools
//! (time, weather, stocks, document search, ...) before answering.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Completion client abstraction with an OpenAI/Azure implementation
//! - **Tools**: Tool registry and built-in tools
//! - **Agent**: Orchestration loop, sessions, and audit trail
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use toolchat::agent::{Agent, Session};
//! use toolchat::llm::ScriptedClient;
//! use toolchat::tools::ToolRegistry;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = ScriptedClient::new();
//!     client.push_reply("Hello!");
//!
//!     let agent = Agent::new(Arc::new(client), Arc::new(ToolRegistry::new()));
//!     let mut session = Session::new("Ada", "You are a helpful assistant.");
//!
//!     let reply = agent.process(&mut session, "Hi").await.unwrap();
//!     println!("{}", reply.text);
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use agent::{Agent, Session};
pub use cli::Repl;
pub use core::{ChatError, Config, Result};
