//! Scripted completion client
//!
//! A queue-based fake for tests and embedding: each call to `complete`
//! pops the next queued outcome and records what it was asked.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::{ChatError, Message, Result, ToolDefinition};
use crate::llm::traits::{CompletionClient, CompletionOutcome};

/// Queued step. Errors are stored as text because `ChatError` is not `Clone`.
#[derive(Debug, Clone)]
enum Step {
    Outcome(CompletionOutcome),
    ProviderError(String),
}

/// One recorded call to `complete`
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Conversation as sent
    pub messages: Vec<Message>,
    /// Names of the tools offered
    pub tool_names: Vec<String>,
}

/// Completion client replaying a fixed script
#[derive(Debug, Clone, Default)]
pub struct ScriptedClient {
    steps: Arc<Mutex<VecDeque<Step>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedClient {
    /// Create an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome
    pub fn push(&self, outcome: CompletionOutcome) -> &Self {
        lock(&self.steps).push_back(Step::Outcome(outcome));
        self
    }

    /// Queue a final reply
    pub fn push_reply(&self, text: impl Into<String>) -> &Self {
        self.push(CompletionOutcome::reply(text))
    }

    /// Queue a tool call request
    pub fn push_tool_call(&self, name: impl Into<String>, raw_arguments: impl Into<String>) -> &Self {
        self.push(CompletionOutcome::tool_call(name, raw_arguments))
    }

    /// Queue a provider failure
    pub fn push_provider_error(&self, message: impl Into<String>) -> &Self {
        lock(&self.steps).push_back(Step::ProviderError(message.into()));
        self
    }

    /// Steps not yet consumed
    pub fn remaining(&self) -> usize {
        lock(&self.steps).len()
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<CompletionOutcome> {
        lock(&self.requests).push(RecordedRequest {
            messages: messages.to_vec(),
            tool_names: tools.iter().map(|t| t.name.clone()).collect(),
        });

        match lock(&self.steps).pop_front() {
            Some(Step::Outcome(outcome)) => Ok(outcome),
            Some(Step::ProviderError(message)) => Err(ChatError::provider(message)),
            None => Err(ChatError::provider("script exhausted")),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_in_order() {
        let client = ScriptedClient::new();
        client.push_tool_call("current_time", "{}").push_reply("It is noon.");

        let messages = vec![Message::user("What time is it?")];
        let first = tokio_test::block_on(client.complete(&messages, &[])).unwrap();
        let second = tokio_test::block_on(client.complete(&messages, &[])).unwrap();

        assert_eq!(first, CompletionOutcome::tool_call("current_time", "{}"));
        assert_eq!(second, CompletionOutcome::reply("It is noon."));
        assert_eq!(client.requests().len(), 2);
        assert_eq!(client.remaining(), 0);
    }

    #[test]
    fn test_exhausted_script_is_provider_error() {
        let client = ScriptedClient::new();
        client.push_provider_error("rate limited");

        let first = tokio_test::block_on(client.complete(&[], &[]));
        assert!(matches!(first, Err(ChatError::Provider(ref m)) if m == "rate limited"));

        let second = tokio_test::block_on(client.complete(&[], &[]));
        assert!(matches!(second, Err(ChatError::Provider(_))));
    }
}
