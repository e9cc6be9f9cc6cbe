//! OpenAI / Azure OpenAI client implementation
//!
//! Async HTTP client for the chat-completions API using the `functions`
//! calling convention: tool-call intents travel as `function_call` on
//! assistant messages and results come back with role `function`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::core::config::{ProviderConfig, ProviderKind};
use crate::core::{ChatError, FunctionCall, Message, Result, Role, ToolDefinition};
use crate::llm::traits::{CompletionClient, CompletionOutcome};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completions client for OpenAI and Azure OpenAI
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    kind: ProviderKind,
    endpoint: Url,
    api_key: String,
    model: String,
}

/// Chat request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    functions: Option<&'a [ToolDefinition]>,
    stream: bool,
}

/// Message in the provider's format
#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<&'a FunctionCall>,
}

/// Chat response body
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
    /// Newer deployments answer with `tool_calls` even for `functions`
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    function: FunctionCall,
}

impl OpenAiClient {
    /// Create a client from provider configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let endpoint = Self::endpoint_for(config)?;

        Ok(Self {
            client,
            kind: config.kind,
            endpoint,
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
        })
    }

    /// Resolve the chat-completions URL for the configured provider
    fn endpoint_for(config: &ProviderConfig) -> Result<Url> {
        let raw = match config.kind {
            ProviderKind::OpenAi => {
                let base = config.base_url.as_deref().unwrap_or(OPENAI_BASE_URL);
                format!("{}/chat/completions", base.trim_end_matches('/'))
            }
            ProviderKind::Azure => {
                let base = config
                    .base_url
                    .as_deref()
                    .ok_or_else(|| ChatError::config("Azure endpoint is not set"))?;
                format!(
                    "{}/openai/deployments/{}/chat/completions",
                    base.trim_end_matches('/'),
                    config.model
                )
            }
        };

        let mut url = Url::parse(&raw)
            .map_err(|e| ChatError::config(format!("Invalid endpoint '{}': {}", raw, e)))?;

        if config.kind == ProviderKind::Azure {
            let version = config
                .api_version
                .as_deref()
                .ok_or_else(|| ChatError::config("Azure API version is not set"))?;
            url.query_pairs_mut().append_pair("api-version", version);
        }

        Ok(url)
    }

    /// The URL requests are sent to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Convert internal Message to the provider's format
    fn to_wire_message(msg: &Message) -> WireMessage<'_> {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "function",
        };

        WireMessage {
            role,
            content: msg.content.as_deref(),
            name: msg.name.as_deref(),
            function_call: msg.tool_call.as_ref(),
        }
    }

    /// Convert the provider response to a completion outcome
    fn to_outcome(response: ChatResponse) -> Result<CompletionOutcome> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::provider("Response contained no choices"))?;

        let message = choice.message;
        let call = message.function_call.or_else(|| {
            message
                .tool_calls
                .and_then(|calls| calls.into_iter().next())
                .map(|tc| tc.function)
        });

        match call {
            Some(call) => Ok(CompletionOutcome::ToolCallRequested {
                name: call.name,
                raw_arguments: call.arguments,
            }),
            None => {
                if let Some(ref reason) = choice.finish_reason {
                    debug!(finish_reason = %reason, "final reply");
                }
                Ok(CompletionOutcome::FinalReply {
                    text: message.content,
                })
            }
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.kind {
            ProviderKind::OpenAi => request.bearer_auth(&self.api_key),
            ProviderKind::Azure => request.header("api-key", &self.api_key),
        }
    }
}

fn truncate(content: &str, max: usize) -> &str {
    match content.char_indices().nth(max) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<CompletionOutcome> {
        let request = ChatRequest {
            model: &self.model,
            messages: messages.iter().map(Self::to_wire_message).collect(),
            functions: if tools.is_empty() { None } else { Some(tools) },
            stream: false,
        };

        debug!(
            endpoint = %self.endpoint,
            messages = messages.len(),
            functions = tools.len(),
            "sending completion request"
        );

        let response = self
            .authorize(self.client.post(self.endpoint.clone()))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::provider(format!("Request to {} timed out", self.endpoint))
                } else if e.is_connect() {
                    ChatError::provider(format!("Cannot connect to {}", self.endpoint))
                } else {
                    ChatError::provider(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::provider(format!("Failed to read response: {}", e)))?;
        debug!(status = %status, body = truncate(&body, 500), "completion response");

        if !status.is_success() {
            return Err(ChatError::provider(format!(
                "{} API error ({}): {}",
                self.kind, status, body
            )));
        }

        let chat_response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ChatError::provider(format!("Failed to parse response: {}", e)))?;

        Self::to_outcome(chat_response)
    }

    fn name(&self) -> &str {
        match self.kind {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Azure => "azure",
        }
    }
}
