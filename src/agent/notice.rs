//! Diagnostic notices
//!
//! Housekeeping messages for the person at the terminal. They travel on their
//! own channel and never enter the conversation sent to the model.

use std::fmt;
use std::sync::Arc;

/// A diagnostic shown alongside the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The loop is about to run a tool
    ToolCall { name: String, arguments: String },
    /// The turn produced no usable result
    Degraded { message: String },
}

impl Notice {
    /// Short tag used when printing
    pub fn tag(&self) -> &'static str {
        match self {
            Notice::ToolCall { .. } => "tool",
            Notice::Degraded { .. } => "notice",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ToolCall { name, arguments } => {
                write!(f, "Calling function {} with arguments {}", name, arguments)
            }
            Notice::Degraded { message } => write!(f, "{}", message),
        }
    }
}

/// Callback receiving notices as they happen
pub type NoticeHandler = Arc<dyn Fn(&Notice) + Send + Sync>;
