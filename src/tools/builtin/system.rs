//! Host information tool

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::{ToolCall, ToolDefinition};
use crate::tools::Tool;

/// Reports the machine's host name
#[derive(Debug, Default)]
pub struct GetHostname;

fn machine_name() -> anyhow::Result<String> {
    let name = hostname::get().context("host name is not available")?;
    let name = name.to_string_lossy();
    let name = name.trim();
    if name.is_empty() {
        bail!("host name is empty");
    }
    Ok(name.to_string())
}

#[async_trait]
impl Tool for GetHostname {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_hostname",
            "Get the hostname of the machine.",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        )
    }

    async fn call(&self, _call: &ToolCall) -> anyhow::Result<Value> {
        Ok(json!(machine_name()?))
    }
}
