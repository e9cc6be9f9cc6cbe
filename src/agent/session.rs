//! Per-user session state

use crate::agent::conversation::Conversation;

/// One user's conversation.
///
/// Sessions are never shared: each owns its conversation, and the loop only
/// borrows it for the duration of a turn.
#[derive(Debug, Clone)]
pub struct Session {
    user_name: String,
    conversation: Conversation,
}

impl Session {
    /// Create a session whose conversation starts with `system_prompt`
    pub fn new(user_name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            conversation: Conversation::new(system_prompt),
        }
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub(crate) fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }
}
