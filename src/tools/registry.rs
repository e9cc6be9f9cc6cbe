//! Tool registry - manages and dispatches tool calls
//!
//! Built once at startup from an explicit list of tools, then shared
//! read-only. Registration fails fast on duplicate names or unusable
//! schemas.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::core::{ChatError, Result, ToolCall, ToolDefinition};

/// A capability the model can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description, and parameter schema
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with parsed arguments
    async fn call(&self, call: &ToolCall) -> anyhow::Result<Value>;
}

type ToolFn = dyn Fn(&ToolCall) -> anyhow::Result<Value> + Send + Sync;

/// Tool backed by a plain closure
pub struct FnTool {
    definition: ToolDefinition,
    func: Box<ToolFn>,
}

impl FnTool {
    /// Create a tool from a definition and a synchronous function
    pub fn new<F>(definition: ToolDefinition, func: F) -> Self
    where
        F: Fn(&ToolCall) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            definition,
            func: Box::new(func),
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn call(&self, call: &ToolCall) -> anyhow::Result<Value> {
        (self.func)(call)
    }
}

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    /// Definitions in registration order
    schemas: Vec<ToolDefinition>,
    /// Tools indexed by name
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Upper bound on a single invocation
    timeout: Option<Duration>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of tools
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Result<Self> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register_shared(tool)?;
        }
        Ok(registry)
    }

    /// Bound every invocation by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Register a tool
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<&mut Self> {
        self.register_shared(Arc::new(tool))
    }

    /// Register a shared tool
    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) -> Result<&mut Self> {
        let definition = tool.definition();
        validate_definition(&definition)?;

        if self.tools.contains_key(&definition.name) {
            return Err(ChatError::DuplicateTool(definition.name));
        }

        debug!(tool = %definition.name, "registered tool");
        self.tools.insert(definition.name.clone(), tool);
        self.schemas.push(definition);
        Ok(self)
    }

    /// All tool definitions, in registration order
    pub fn schemas(&self) -> &[ToolDefinition] {
        &self.schemas
    }

    /// Tool names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.schemas.iter().map(|d| d.name.as_str()).collect()
    }

    /// Whether a tool with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Definition of a registered tool
    pub fn definition(&self, name: &str) -> Option<&ToolDefinition> {
        self.schemas.iter().find(|d| d.name == name)
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool call.
    ///
    /// Unknown names yield [`ChatError::ToolNotFound`] without touching any
    /// tool. Missing required arguments, tool failures, and timeouts yield
    /// [`ChatError::ToolExecution`].
    pub async fn invoke(&self, call: &ToolCall) -> Result<Value> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ChatError::ToolNotFound(call.name.clone()))?;

        if let Some(definition) = self.definition(&call.name) {
            if let Some(missing) = definition
                .required_parameters()
                .into_iter()
                .find(|p| !call.arguments.contains_key(*p))
            {
                return Err(ChatError::tool_execution(
                    &call.name,
                    format!("missing required argument '{}'", missing),
                ));
            }
        }

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, tool.call(call)).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(ChatError::tool_execution(
                        &call.name,
                        format!("timed out after {}s", limit.as_secs_f32()),
                    ))
                }
            },
            None => tool.call(call).await,
        };

        result.map_err(|e| ChatError::tool_execution(&call.name, e))
    }
}

/// Reject definitions the provider could not use
fn validate_definition(definition: &ToolDefinition) -> Result<()> {
    let invalid = |reason: &str| ChatError::InvalidTool {
        name: definition.name.clone(),
        reason: reason.to_string(),
    };

    let name_ok = !definition.name.is_empty()
        && definition
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !name_ok {
        return Err(invalid("names may only use letters, digits, '_' and '-'"));
    }

    let params = definition
        .parameters
        .as_object()
        .ok_or_else(|| invalid("parameters must be a JSON object"))?;

    if params.get("type").and_then(Value::as_str) != Some("object") {
        return Err(invalid("parameters must have type \"object\""));
    }

    let properties = params.get("properties").and_then(Value::as_object);
    for required in definition.required_parameters() {
        if !properties.is_some_and(|p| p.contains_key(required)) {
            return Err(invalid(&format!(
                "required parameter '{}' is not declared",
                required
            )));
        }
    }

    Ok(())
}
