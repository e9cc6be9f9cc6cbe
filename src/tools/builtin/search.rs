//! Document search tool backed by an Elasticsearch index
//!
//! The top hit is returned as a `search-result` object carrying the document
//! id, which the orchestration loop records as the turn's document reference.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;
use tracing::{error, warn};

use crate::core::config::SearchConfig;
use crate::core::{ChatError, Result, ToolCall, ToolDefinition, SEARCH_RESULT_TYPE};
use crate::tools::Tool;

const QUERY_PLACEHOLDER: &str = "{query}";

/// Returned to the model when the search backend fails
pub const SEARCH_FAILED: &str = "An error occurred during the search. Please try again later.";

/// Returned to the model when nothing matched
pub const NO_RESULTS: &str = "No matching documents were found.";

/// Searches the configured index and returns the best document
pub struct SearchTool {
    client: Client,
    config: SearchConfig,
    corpus_description: String,
    template: Value,
}

impl SearchTool {
    /// Create the tool, reading the corpus description and query template
    pub fn new(client: Client, config: SearchConfig) -> Result<Self> {
        let corpus_description = match config.corpus_description_file {
            Some(ref path) if path.exists() => read_text(path)?,
            _ => String::new(),
        };

        let template = match config.query_template_file {
            Some(ref path) if path.exists() => {
                serde_json::from_str(&read_text(path)?).map_err(|e| {
                    ChatError::config(format!(
                        "Invalid query template {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
            _ => default_template(&config.context_fields),
        };

        Ok(Self {
            client,
            config,
            corpus_description,
            template,
        })
    }

    /// Create the tool with an explicit description and template
    pub fn with_template(
        client: Client,
        config: SearchConfig,
        corpus_description: impl Into<String>,
        template: Value,
    ) -> Self {
        Self {
            client,
            config,
            corpus_description: corpus_description.into(),
            template,
        }
    }

    /// Build the query body for `query_text`
    fn build_query(&self, query_text: &str) -> Value {
        substitute(&self.template, query_text)
    }

    async fn run_query(&self, query_text: &str) -> anyhow::Result<Value> {
        let url = format!(
            "{}/{}/_search",
            self.config.host.trim_end_matches('/'),
            self.config.index
        );

        let mut request = self.client.post(&url).json(&self.build_query(query_text));
        if let Some(ref key) = self.config.api_key {
            request = request.header("Authorization", format!("ApiKey {}", key));
        }

        let response: Value = request
            .send()
            .await
            .context("search backend unreachable")?
            .error_for_status()
            .context("search backend rejected the query")?
            .json()
            .await
            .context("search response was not JSON")?;

        Ok(self.extract_top_hit(&response))
    }

    /// Shape the best hit into a `search-result` object
    fn extract_top_hit(&self, response: &Value) -> Value {
        let Some(hit) = response
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .and_then(|hits| hits.first())
        else {
            return json!(NO_RESULTS);
        };

        let id = hit.get("_id").and_then(Value::as_str).unwrap_or("Unknown");
        let mut result = Map::new();
        result.insert("type".to_string(), json!(SEARCH_RESULT_TYPE));
        result.insert("id".to_string(), json!(id));

        // semantic_text indexes chunk documents into inner hits
        if let Some(inner_hits) = hit.get("inner_hits") {
            let key = format!("{}.content", self.config.index);
            let text = inner_hits
                .get(&key)
                .and_then(|h| h.pointer("/hits/hits/0/_source/text"))
                .cloned();
            match text {
                Some(text) => {
                    result.insert("text".to_string(), text);
                }
                None => warn!(document = id, "field 'text' is missing in the inner hit"),
            }
        } else {
            let source = hit.get("_source");
            for field in &self.config.context_fields {
                match source.and_then(|s| s.get(field)) {
                    Some(value) if !value.is_null() => {
                        result.insert(field.clone(), value.clone());
                    }
                    _ => warn!(document = id, field = %field, "field is missing in the document"),
                }
            }
        }

        Value::Object(result)
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|e| ChatError::config(format!("Failed to read {}: {}", path.display(), e)))
}

/// Template used when none is configured
fn default_template(fields: &[String]) -> Value {
    json!({
        "size": 1,
        "query": {
            "multi_match": {
                "query": QUERY_PLACEHOLDER,
                "fields": fields
            }
        }
    })
}

/// Replace the placeholder inside every string of the template
fn substitute(template: &Value, query_text: &str) -> Value {
    match template {
        Value::String(s) => Value::String(s.replace(QUERY_PLACEHOLDER, query_text)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, query_text)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, query_text)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn definition(&self) -> ToolDefinition {
        let mut description = String::from(
            "The function searches an elasticsearch index to help provide accurate and up to date \
             information to the user and returns the contents of the most relevant documents.",
        );
        if !self.corpus_description.is_empty() {
            description.push_str(" The description of the corpus is: ");
            description.push_str(&self.corpus_description);
        }

        ToolDefinition::new(
            "search",
            description,
            json!({
                "type": "object",
                "properties": {
                    "query_text": {
                        "type": "string",
                        "description": "The query text to search for. This should be an expansive set of keywords to find the best document, for example including synonyms"
                    }
                },
                "required": ["query_text"]
            }),
        )
    }

    async fn call(&self, call: &ToolCall) -> anyhow::Result<Value> {
        let query_text = call
            .get_string("query_text")
            .ok_or_else(|| anyhow!("query_text must be a string"))?;

        // Backend failures are reported to the model as text, not as errors
        match self.run_query(&query_text).await {
            Ok(result) => Ok(result),
            Err(e) => {
                error!(error = %format!("{:#}", e), "search failed");
                Ok(json!(SEARCH_FAILED))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(fields: &[&str]) -> SearchConfig {
        SearchConfig {
            host: "http://localhost:9200".to_string(),
            api_key: None,
            index: "docs".to_string(),
            context_fields: fields.iter().map(|f| f.to_string()).collect(),
            corpus_description_file: None,
            query_template_file: None,
        }
    }

    fn tool(fields: &[&str]) -> SearchTool {
        SearchTool::new(Client::new(), config(fields)).unwrap()
    }

    #[test]
    fn test_substitute_placeholder() {
        let template = json!({"query": {"match": {"content": "{query}"}}, "size": 1});
        assert_eq!(
            substitute(&template, "rust \"async\""),
            json!({"query": {"match": {"content": "rust \"async\""}}, "size": 1})
        );
    }

    #[test]
    fn test_extract_source_fields() {
        let response = json!({"hits": {"hits": [{
            "_id": "doc123",
            "_source": {"title": "Handbook", "content": "Leave policy..."}
        }]}});

        let result = tool(&["title", "content", "author"]).extract_top_hit(&response);
        assert_eq!(
            result,
            json!({"type": "search-result", "id": "doc123", "title": "Handbook", "content": "Leave policy..."})
        );
    }

    #[test]
    fn test_extract_inner_hit_text() {
        let response = json!({"hits": {"hits": [{
            "_id": "doc9",
            "_source": {},
            "inner_hits": {"docs.content": {"hits": {"hits": [{"_source": {"text": "chunk"}}]}}}
        }]}});

        let result = tool(&["content"]).extract_top_hit(&response);
        assert_eq!(result["id"], "doc9");
        assert_eq!(result["text"], "chunk");
    }

    #[test]
    fn test_no_hits() {
        let result = tool(&["content"]).extract_top_hit(&json!({"hits": {"hits": []}}));
        assert_eq!(result, json!(NO_RESULTS));
    }

    #[test]
    fn test_description_includes_corpus() {
        let tool = SearchTool::with_template(
            Client::new(),
            config(&["content"]),
            "HR policies",
            json!({}),
        );
        assert!(tool.definition().description.ends_with("HR policies"));
    }
}
