//! Shared types used across toolchat modules
//!
//! Contains message structures, tool definitions, and tool-call requests.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::error::{ChatError, Result};

/// Tag a tool result carries when it refers to a retrieved document
pub const SEARCH_RESULT_TYPE: &str = "search-result";

/// Author of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Text content (absent on tool-call intents)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool the assistant asked to call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<FunctionCall>,
    /// Originating tool name, set on tool-role messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_call: None,
            name: None,
        }
    }

    /// Assistant message recording the intent to call a tool.
    ///
    /// Arguments are the re-serialized parsed mapping, not the provider's
    /// raw string.
    pub fn tool_call(call: &ToolCall) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_call: Some(FunctionCall {
                name: call.name.clone(),
                arguments: call.arguments_json(),
            }),
            name: None,
        }
    }

    /// Tool-role message carrying a serialized result
    pub fn tool_result(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_call: None,
            name: Some(name.into()),
        }
    }

    /// Text content, or an empty string
    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Whether this is an assistant tool-call intent
    pub fn is_tool_call(&self) -> bool {
        self.role == Role::Assistant && self.tool_call.is_some()
    }
}

/// Name and serialized arguments of a requested function call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// A parsed tool call, ready for dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Name of the tool to invoke
    pub name: String,
    /// Structured arguments
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Parse the provider's raw argument string into a mapping.
    ///
    /// A blank string means no arguments. Anything that is not a JSON
    /// object is rejected.
    pub fn parse(name: impl Into<String>, raw_arguments: &str) -> Result<Self> {
        let name = name.into();
        if raw_arguments.trim().is_empty() {
            return Ok(Self::new(name, Map::new()));
        }

        match serde_json::from_str::<Value>(raw_arguments) {
            Ok(Value::Object(arguments)) => Ok(Self::new(name, arguments)),
            Ok(other) => {
                let kind = json_kind(&other);
                Err(ChatError::malformed(
                    name,
                    format!("expected a JSON object, got {}", kind),
                ))
            }
            Err(e) => Err(ChatError::malformed(name, e.to_string())),
        }
    }

    /// Arguments serialized back to a JSON string
    pub fn arguments_json(&self) -> String {
        Value::Object(self.arguments.clone()).to_string()
    }

    /// Get a string argument by key
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// Get a numeric argument by key, accepting numeric strings
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.arguments.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Definition of a tool that can be called by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the parameters
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Names listed in the schema's `required` array
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Document id carried by a search-result shaped tool output
pub fn search_result_id(result: &Value) -> Option<String> {
    let object = result.as_object()?;
    if object.get("type").and_then(Value::as_str) != Some(SEARCH_RESULT_TYPE) {
        return None;
    }
    match object.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
