//! Completion client trait for abstracting chat-completion backends
//!
//! The orchestration loop only sees [`CompletionOutcome`]; wire formats stay
//! inside each implementation.

use async_trait::async_trait;

use crate::core::{Message, Result, ToolDefinition};

/// What the model wants to do next
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// A user-facing answer. `None` when the provider sent no content.
    FinalReply { text: Option<String> },
    /// The model selected a tool. Arguments are still the raw string.
    ToolCallRequested { name: String, raw_arguments: String },
}

impl CompletionOutcome {
    /// Final reply with text
    pub fn reply(text: impl Into<String>) -> Self {
        Self::FinalReply {
            text: Some(text.into()),
        }
    }

    /// Tool call request
    pub fn tool_call(name: impl Into<String>, raw_arguments: impl Into<String>) -> Self {
        Self::ToolCallRequested {
            name: name.into(),
            raw_arguments: raw_arguments.into(),
        }
    }
}

/// Trait for chat-completion providers
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Ask for the next step given the full conversation and the tool schemas.
    ///
    /// Transport, auth, and rate-limit failures come back as
    /// [`ChatError::Provider`](crate::core::ChatError::Provider).
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<CompletionOutcome>;

    /// Get the provider name
    fn name(&self) -> &str;
}
