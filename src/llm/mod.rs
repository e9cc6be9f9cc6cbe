//! LLM module - completion endpoint integrations
//!
//! Provides the completion client abstraction with an OpenAI/Azure backend
//! and a scripted client for tests.

pub mod openai;
pub mod scripted;
pub mod traits;

pub use openai::OpenAiClient;
pub use scripted::{RecordedRequest, ScriptedClient};
pub use traits::{CompletionClient, CompletionOutcome};
