//! Current time tool

use async_trait::async_trait;
use chrono::Local;
use serde_json::{json, Value};

use crate::core::{ToolCall, ToolDefinition};
use crate::tools::Tool;

/// Reports the local wall-clock time
#[derive(Debug, Default)]
pub struct CurrentTime;

#[async_trait]
impl Tool for CurrentTime {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "current_time",
            "Get the current time.",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        )
    }

    async fn call(&self, _call: &ToolCall) -> anyhow::Result<Value> {
        Ok(json!(Local::now().format("%Y-%m-%d %H:%M:%S").to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    #[tokio::test]
    async fn test_format() {
        let value = CurrentTime
            .call(&ToolCall::new("current_time", Map::new()))
            .await
            .unwrap();
        let text = value.as_str().unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").is_ok());
    }
}
