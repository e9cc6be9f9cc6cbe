//! Agent orchestrator
//!
//! Runs one user turn at a time: append the input, ask the model for the next
//! step, dispatch any requested tool, feed the result back, and repeat until
//! the model answers.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::agent::audit::{AuditEvent, AuditSink, JsonlAuditSink, MultiAuditSink, TracingAuditSink};
use crate::agent::notice::{Notice, NoticeHandler};
use crate::agent::session::Session;
use crate::agent::turn::TurnState;
use crate::core::{ChatError, Config, Message, Result, ToolCall};
use crate::llm::{CompletionClient, CompletionOutcome, OpenAiClient};
use crate::tools::{builtin, ToolRegistry};

/// Default cap on sequential tool calls per turn
pub const DEFAULT_MAX_TOOL_CALLS: usize = 10;

const EMPTY_REPLY_NOTICE: &str =
    "The model returned an empty reply. Try rephrasing or asking again.";

/// What a completed turn produced
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    /// The assistant's answer
    pub text: String,
    /// Tool calls dispatched during the turn
    pub tool_calls: usize,
    /// Latest document referenced by a search result
    pub reference_doc_id: Option<String>,
}

/// Ties the completion client, tool registry, and audit trail together.
///
/// The agent holds no per-user state: sessions are passed in by the caller,
/// so one agent can serve any number of independent sessions.
pub struct Agent {
    /// LLM client
    client: Arc<dyn CompletionClient>,
    /// Tool registry, shared read-only
    tools: Arc<ToolRegistry>,
    /// Where completed turns are recorded
    audit: Arc<dyn AuditSink>,
    /// Receiver for diagnostic notices
    notices: Option<NoticeHandler>,
    /// Maximum tool calls per turn
    max_tool_calls: usize,
}

impl Agent {
    /// Create an agent that audits through `tracing`
    pub fn new(client: Arc<dyn CompletionClient>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            client,
            tools,
            audit: Arc::new(TracingAuditSink),
            notices: None,
            max_tool_calls: DEFAULT_MAX_TOOL_CALLS,
        }
    }

    /// Create an agent from configuration: HTTP client, built-in tools, and
    /// the configured audit sinks
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = OpenAiClient::from_config(&config.provider)?;
        let tools = builtin::registry_from_config(config)?;

        let mut audit = MultiAuditSink::new().with(Arc::new(TracingAuditSink));
        if let Some(ref path) = config.audit.log_file {
            audit = audit.with(Arc::new(JsonlAuditSink::open(path)?));
        }

        Ok(Self::new(Arc::new(client), Arc::new(tools))
            .with_audit_sink(Arc::new(audit))
            .with_max_tool_calls(config.agent.max_tool_calls))
    }

    /// Replace the audit sink
    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Receive diagnostic notices
    pub fn with_notice_handler(mut self, handler: NoticeHandler) -> Self {
        self.notices = Some(handler);
        self
    }

    /// Cap the number of tool calls in one turn
    pub fn with_max_tool_calls(mut self, max_tool_calls: usize) -> Self {
        self.max_tool_calls = max_tool_calls;
        self
    }

    /// Registered tools
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Name of the completion backend
    pub fn client_name(&self) -> &str {
        self.client.name()
    }

    /// Tool calls allowed in one turn
    pub fn max_tool_calls(&self) -> usize {
        self.max_tool_calls
    }

    /// Process one user turn.
    ///
    /// The loop continues until:
    /// 1. The model produces a final reply, or
    /// 2. A turn-level error ends the turn.
    ///
    /// On error the user message stays in the history and no tool-call
    /// intent is left without its result, so the session stays usable.
    pub async fn process(&self, session: &mut Session, user_input: &str) -> Result<TurnReply> {
        let span = info_span!(
            "handle_chat",
            user_name = %session.user_name(),
            user_input = %user_input
        );
        self.run_turn(session, user_input).instrument(span).await
    }

    async fn run_turn(&self, session: &mut Session, user_input: &str) -> Result<TurnReply> {
        session.conversation_mut().append(Message::user(user_input));
        let mut turn = TurnState::new(self.max_tool_calls);

        loop {
            let round = turn.next_round();
            let outcome = self
                .client
                .complete(session.conversation().snapshot(), self.tools.schemas())
                .instrument(info_span!("call_llm", round = round))
                .await
                .inspect_err(|e| {
                    warn!(error = %e, user_input, round, "completion request failed")
                })?;

            match outcome {
                CompletionOutcome::ToolCallRequested {
                    name,
                    raw_arguments,
                } => {
                    self.dispatch(session, &mut turn, &name, &raw_arguments)
                        .await?;
                }
                CompletionOutcome::FinalReply { text } => {
                    return self.finish(session, &turn, user_input, text);
                }
            }
        }
    }

    /// Run one requested tool and append the intent and its result.
    ///
    /// Every check that can reject the call happens before anything is
    /// appended.
    async fn dispatch(
        &self,
        session: &mut Session,
        turn: &mut TurnState,
        name: &str,
        raw_arguments: &str,
    ) -> Result<()> {
        if !turn.can_dispatch() {
            warn!(tool = name, limit = turn.max_tool_calls, "tool call limit reached");
            return Err(ChatError::ToolChainLimitExceeded {
                limit: turn.max_tool_calls,
            });
        }

        if !self.tools.contains(name) {
            warn!(tool = name, arguments = raw_arguments, "model requested an unknown tool");
            return Err(ChatError::ToolNotFound(name.to_string()));
        }

        let call = ToolCall::parse(name, raw_arguments).inspect_err(|e| {
            warn!(tool = name, arguments = raw_arguments, error = %e, "malformed tool arguments")
        })?;

        self.notify(Notice::ToolCall {
            name: call.name.clone(),
            arguments: call.arguments_json(),
        });

        let result = self
            .tools
            .invoke(&call)
            .instrument(info_span!("tool", name = %name))
            .await;

        let (content, value) = match result {
            Ok(value) => {
                debug!(tool = name, "tool returned");
                (tool_result_content(&value), Some(value))
            }
            Err(e @ ChatError::ToolNotFound(_)) => return Err(e),
            Err(e) => {
                warn!(tool = name, arguments = %call.arguments_json(), error = %e, "tool failed");
                (json!({ "error": e.to_string() }).to_string(), None)
            }
        };

        turn.record_dispatch(value.as_ref());

        let conversation = session.conversation_mut();
        conversation.append(Message::tool_call(&call));
        conversation.append(Message::tool_result(name, content));
        Ok(())
    }

    /// Append the final reply and record the turn
    fn finish(
        &self,
        session: &mut Session,
        turn: &TurnState,
        user_input: &str,
        text: Option<String>,
    ) -> Result<TurnReply> {
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            warn!(user_input, "model returned an empty reply");
            self.notify(Notice::Degraded {
                message: EMPTY_REPLY_NOTICE.to_string(),
            });
            return Err(ChatError::EmptyReply);
        };

        session
            .conversation_mut()
            .append(Message::assistant(text.as_str()));

        let event = AuditEvent::from_turn(session.user_name(), user_input, &text, turn);
        info!(
            user_name = %event.user_name,
            user_input = %event.user_input,
            response = %event.reply,
            reference_doc_id = event.reference_doc_id.as_deref(),
            "User interaction"
        );
        if let Err(e) = self.audit.record(&event) {
            warn!(error = %e, "failed to record audit event");
        }

        Ok(TurnReply {
            text,
            tool_calls: turn.tool_calls,
            reference_doc_id: event.reference_doc_id,
        })
    }

    fn notify(&self, notice: Notice) {
        debug!(tag = notice.tag(), "{}", notice);
        if let Some(ref handler) = self.notices {
            handler(&notice);
        }
    }
}

/// Serialized content of a tool-role message for `value`
pub fn tool_result_content(value: &Value) -> String {
    json!({ "result": value }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Role, ToolDefinition};
    use crate::llm::ScriptedClient;
    use crate::tools::FnTool;
    use std::sync::Mutex;

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry
            .register(FnTool::new(
                ToolDefinition::new("current_time", "Current time", json!({"type": "object"})),
                |_| Ok(json!("2024-01-02 14:30:00")),
            ))
            .unwrap();
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_direct_reply() {
        let client = ScriptedClient::new();
        client.push_reply("Hello Ada!");
        let agent = Agent::new(Arc::new(client.clone()), registry());
        let mut session = Session::new("Ada", "sys");

        let reply = agent.process(&mut session, "Hi").await.unwrap();
        assert_eq!(reply.text, "Hello Ada!");
        assert_eq!(reply.tool_calls, 0);
        assert_eq!(session.conversation().len(), 3);
        assert_eq!(client.requests()[0].tool_names, vec!["current_time"]);
    }

    #[test]
    fn test_accessors() {
        let agent = Agent::new(Arc::new(ScriptedClient::new()), registry()).with_max_tool_calls(3);
        assert_eq!(agent.client_name(), "scripted");
        assert_eq!(agent.max_tool_calls(), 3);
        assert_eq!(agent.tools().len(), 1);
    }

    #[tokio::test]
    async fn test_notices_stay_out_of_conversation() {
        let client = ScriptedClient::new();
        client
            .push_tool_call("current_time", "{}")
            .push_reply("It is 14:30.");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let agent = Agent::new(Arc::new(client), registry()).with_notice_handler(Arc::new(
            move |notice: &Notice| sink.lock().unwrap().push(notice.clone()),
        ));
        let mut session = Session::new("Ada", "sys");

        agent.process(&mut session, "What time is it?").await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![Notice::ToolCall {
                name: "current_time".to_string(),
                arguments: "{}".to_string()
            }]
        );
        assert!(session
            .conversation()
            .snapshot()
            .iter()
            .all(|m| !m.content_str().contains("Calling function")));
        assert_eq!(
            session.conversation().snapshot()[3].content_str(),
            tool_result_content(&json!("2024-01-02 14:30:00"))
        );
        assert_eq!(session.conversation().snapshot()[3].role, Role::Tool);
    }
}
