//! CLI commands
//!
//! Special commands that can be executed in the REPL. A command is the whole
//! input line; anything else is a question for the assistant.

use crate::agent::{Agent, Session};

/// Result of parsing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Continue processing as normal input
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// No output needed
    None,
}

/// Parse and handle special commands
pub fn handle_command(input: &str, agent: &Agent, session: &Session) -> CommandResult {
    let input = input.trim();
    if input.is_empty() {
        return CommandResult::None;
    }

    match input.to_lowercase().as_str() {
        "exit" | "quit" => CommandResult::Exit,

        "help" | "?" => CommandResult::Handled(help_text()),

        "tools" => CommandResult::Handled(tools_text(agent)),

        "history" => {
            let conversation = session.conversation();
            CommandResult::Handled(format!(
                "History: {} messages ({} since the system prompt)",
                conversation.len(),
                conversation.len().saturating_sub(1)
            ))
        }

        _ => CommandResult::Continue(input.to_string()),
    }
}

/// List registered tools with their descriptions
fn tools_text(agent: &Agent) -> String {
    let tools = agent.tools();
    if tools.is_empty() {
        return "No tools registered.".to_string();
    }

    let mut output = format!("Available tools ({}):\n", tools.len());
    for definition in tools.schemas() {
        let summary = definition
            .description
            .split(". ")
            .next()
            .unwrap_or_default();
        output.push_str(&format!("  {:<20} {}\n", definition.name, summary));
    }
    output.trim_end().to_string()
}

/// Generate help text
fn help_text() -> String {
    r#"Commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  tools            List the tools the assistant can call
  history          Show the number of messages in this session
  exit, quit       End the session

Keyboard Shortcuts:
  Ctrl+D           End the session

Anything else is sent to the assistant.
─────────────────────────────────────────────"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedClient;
    use crate::tools::{builtin::CurrentTime, ToolRegistry};
    use std::sync::Arc;

    fn agent() -> Agent {
        let mut registry = ToolRegistry::new();
        registry.register(CurrentTime).unwrap();
        Agent::new(Arc::new(ScriptedClient::new()), Arc::new(registry))
    }

    #[test]
    fn test_exit_is_case_insensitive() {
        let (agent, session) = (agent(), Session::new("Ada", "sys"));
        assert_eq!(handle_command("EXIT", &agent, &session), CommandResult::Exit);
        assert_eq!(handle_command("  Quit ", &agent, &session), CommandResult::Exit);
    }

    #[test]
    fn test_questions_pass_through() {
        let (agent, session) = (agent(), Session::new("Ada", "sys"));
        assert_eq!(
            handle_command("exit strategies for startups?", &agent, &session),
            CommandResult::Continue("exit strategies for startups?".to_string())
        );
        assert_eq!(handle_command("   ", &agent, &session), CommandResult::None);
    }

    #[test]
    fn test_tools_and_history() {
        let (agent, session) = (agent(), Session::new("Ada", "sys"));

        match handle_command("tools", &agent, &session) {
            CommandResult::Handled(text) => assert!(text.contains("current_time")),
            other => panic!("unexpected result: {other:?}"),
        }
        match handle_command("history", &agent, &session) {
            CommandResult::Handled(text) => assert!(text.starts_with("History: 1 messages")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
