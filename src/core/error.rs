//! Custom error types for toolchat
//!
//! One taxonomy for the whole crate. Turn-level conditions are recoverable
//! and leave the session usable; configuration-time failures abort startup.

use thiserror::Error;

/// Boxed error carried as the cause of a failed tool invocation
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for toolchat operations
#[derive(Error, Debug)]
pub enum ChatError {
    /// Completion endpoint unreachable or rejected the request
    #[error("Provider error: {0}")]
    Provider(String),

    /// The model asked for a tool that is not registered
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool-call arguments did not parse as a JSON object
    #[error("Malformed arguments for tool '{tool}': {reason}")]
    MalformedToolArguments { tool: String, reason: String },

    /// A registered tool failed while running
    #[error("Tool '{tool}' failed: {source}")]
    ToolExecution {
        tool: String,
        #[source]
        source: BoxError,
    },

    /// The provider returned no usable final text
    #[error("The model returned an empty reply")]
    EmptyReply,

    /// Too many sequential tool calls in one turn
    #[error("Tool call limit of {limit} reached for this turn")]
    ToolChainLimitExceeded { limit: usize },

    /// Two tools declared the same name
    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    /// A tool declared an unusable definition
    #[error("Invalid tool definition for '{name}': {reason}")]
    InvalidTool { name: String, reason: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for toolchat operations
pub type Result<T> = std::result::Result<T, ChatError>;

impl ChatError {
    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a malformed-arguments error
    pub fn malformed(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedToolArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a tool failure with the tool name
    pub fn tool_execution(tool: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            source: source.into(),
        }
    }

    /// Whether the session can carry on after this error.
    ///
    /// Only startup-time failures are fatal.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Config(_) | Self::DuplicateTool(_) | Self::InvalidTool { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(ChatError::provider("rate limited").is_recoverable());
        assert!(ChatError::ToolNotFound("x".into()).is_recoverable());
        assert!(ChatError::malformed("x", "eof").is_recoverable());
        assert!(ChatError::EmptyReply.is_recoverable());
        assert!(ChatError::ToolChainLimitExceeded { limit: 3 }.is_recoverable());

        assert!(!ChatError::config("missing key").is_recoverable());
        assert!(!ChatError::DuplicateTool("search".into()).is_recoverable());
    }

    #[test]
    fn test_tool_execution_keeps_cause() {
        let err = ChatError::tool_execution("get_weather", anyhow::anyhow!("timeout"));
        assert_eq!(err.to_string(), "Tool 'get_weather' failed: timeout");
        assert!(std::error::Error::source(&err).is_some());
    }
}
