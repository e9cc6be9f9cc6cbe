//! Interactive REPL for toolchat
//!
//! Provides the main user interaction loop.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing::{error, info};

use crate::agent::{Agent, Notice, Session};
use crate::cli::commands::{handle_command, CommandResult};
use crate::core::{ChatError, Config, Result};

const RULE_WIDTH: usize = 50;

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    agent: Agent,
    session: Session,
    assistant_name: String,
}

/// Print a notice on its own tagged line
pub fn print_notice(notice: &Notice) {
    println!("[{}] {}", notice.tag(), notice);
}

impl Repl {
    /// Create a REPL around an existing agent and session
    pub fn new(agent: Agent, session: Session, assistant_name: impl Into<String>) -> Self {
        Self {
            agent,
            session,
            assistant_name: assistant_name.into(),
        }
    }

    /// Create a REPL with custom configuration
    pub fn with_config(config: &Config, user_name: &str) -> Result<Self> {
        let agent = Agent::from_config(config)?.with_notice_handler(Arc::new(print_notice));
        let session = Session::new(user_name, config.system_prompt()?);
        Ok(Self::new(agent, session, config.assistant.name.clone()))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Answer a single prompt
    pub async fn ask(&mut self, prompt: &str) -> Result<String> {
        let reply = self.agent.process(&mut self.session, prompt).await?;
        Ok(reply.text)
    }

    /// Run the REPL on stdin and stdout
    pub async fn run(&mut self, greeting: &str) -> Result<()> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        self.run_with(greeting, &mut input, &mut output).await
    }

    /// Run the REPL on the given streams until exit or end of input
    pub async fn run_with(
        &mut self,
        greeting: &str,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> Result<()> {
        info!(
            assistant = %self.assistant_name,
            client = self.agent.client_name(),
            tools = self.agent.tools().len(),
            max_tool_calls = self.agent.max_tool_calls(),
            "starting chat"
        );
        self.say(output, greeting)?;
        self.say(
            output,
            "How can I assist you today? (Type 'exit' or 'quit' to end the chat, 'help' for commands.)\n\
             If you aren't sure what to ask me just ask 'What can you do?' or 'Is it raining where I am?'",
        )?;

        loop {
            // Print prompt
            write!(output, "You: > ")?;
            output.flush()?;

            // Read input
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                // EOF (Ctrl+D)
                writeln!(output)?;
                self.say(output, "Goodbye!")?;
                break;
            }
            writeln!(output, "{}", "-".repeat(RULE_WIDTH))?;

            match handle_command(&line, &self.agent, &self.session) {
                CommandResult::Exit => {
                    info!("user ended the chat");
                    self.say(output, "Goodbye!")?;
                    break;
                }
                CommandResult::Handled(text) => {
                    writeln!(output, "{}", text)?;
                    writeln!(output, "{}", "-".repeat(RULE_WIDTH))?;
                }
                CommandResult::None => continue,
                CommandResult::Continue(question) => {
                    match self.agent.process(&mut self.session, &question).await {
                        Ok(reply) => self.say(output, &reply.text)?,
                        // Already reported through the notice channel
                        Err(ChatError::EmptyReply) => {}
                        Err(e) if e.is_recoverable() => {
                            error!(error = %e, "turn failed");
                            writeln!(output, "[error] {}", e)?;
                            writeln!(output, "{}", "-".repeat(RULE_WIDTH))?;
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        Ok(())
    }

    /// Print a line attributed to the assistant, followed by a rule
    fn say(&self, output: &mut impl Write, text: &str) -> Result<()> {
        writeln!(output, "{}: {}", self.assistant_name, text)?;
        writeln!(output, "{}", "-".repeat(RULE_WIDTH))?;
        Ok(())
    }
}
