//! Toolchat - function-calling chat assistant
//!
//! Main entry point for the CLI application.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use toolchat::cli::{resolve_user_name, Greeting};
use toolchat::{Config, Repl};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Toolchat - function-calling chat assistant
#[derive(Parser, Debug)]
#[command(name = "toolchat")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Path to a TOML config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Your name (otherwise remembered or asked for)
    #[arg(long, short = 'u')]
    user: Option<String>,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn init_logging(level: &str) {
    // Logs go to stderr so stdout carries only the conversation
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Before the subscriber so RUST_LOG from .env applies
    Config::load_dotenv();
    init_logging(&args.log_level);

    if args.print_config {
        println!("{}", Config::default_config_toml());
        return Ok(());
    }

    // Build configuration
    let config = Config::load(args.config.as_deref()).context("failed to load configuration")?;
    config.validate()?;
    info!(provider = %config.provider.kind, model = %config.provider.model, "starting toolchat");

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let user_name = args.user.as_deref().unwrap_or("user");
        let mut repl = Repl::with_config(&config, user_name)?;
        let reply = repl.ask(&prompt).await?;
        println!("{}", reply);
        return Ok(());
    }

    println!("{}\n", config.assistant.name);

    let greeting: Greeting = resolve_user_name(
        args.user.as_deref(),
        &config.agent.memory_file,
        &mut io::stdin().lock(),
        &mut io::stdout(),
    )?;

    // Interactive REPL mode
    let mut repl = Repl::with_config(&config, greeting.user_name())?;
    repl.run(&greeting.message()).await?;

    Ok(())
}
