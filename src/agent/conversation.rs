//! Conversation history
//!
//! An append-only, ordered log of messages. The sequence is the entire
//! context window sent to the completion endpoint, so nothing is ever
//! edited, trimmed, or removed.

use crate::core::{Message, Role};

/// Ordered, append-only message log
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation with its single system message
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Add a message at the end
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Full ordered history, read-only
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    /// Messages appended after the first `start`
    pub fn since(&self, start: usize) -> &[Message] {
        &self.messages[start.min(self.messages.len())..]
    }

    /// The persona / instructions message
    pub fn system_prompt(&self) -> &str {
        self.messages
            .first()
            .map(Message::content_str)
            .unwrap_or_default()
    }

    /// Most recent message with the given role
    pub fn last_with_role(&self, role: Role) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == role)
    }

    /// Get message count, including the system message
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Never true for a conversation built with [`Conversation::new`]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_system_prompt() {
        let conv = Conversation::new("You are a helpful assistant");
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.snapshot()[0].role, Role::System);
        assert_eq!(conv.system_prompt(), "You are a helpful assistant");
    }

    #[test]
    fn test_append_keeps_order() {
        let mut conv = Conversation::new("sys");
        conv.append(Message::user("Hello"));
        conv.append(Message::assistant("Hi there!"));

        let roles: Vec<Role> = conv.snapshot().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(
            conv.last_with_role(Role::User).unwrap().content_str(),
            "Hello"
        );
    }

    #[test]
    fn test_since() {
        let mut conv = Conversation::new("sys");
        conv.append(Message::user("1"));
        conv.append(Message::assistant("2"));

        assert_eq!(conv.since(1).len(), 2);
        assert!(conv.since(10).is_empty());
    }
}
