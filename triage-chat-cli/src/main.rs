//! CLI entry point for triage-chat

mod client;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};
use triage_chat_agent::{ContextBuilder, TurnHandler, TurnOutcome};
use triage_chat_core::config::{Config, ConfigLoader};
use triage_chat_core::logging::init_logging;
use triage_chat_core::session::{FileMedium, Message, SessionStore};
use triage_chat_core::utils::expand_tilde;
use triage_chat_providers::{OllamaClient, ResponseFormat};
use triage_chat_server::{run_server, AppState};

use crate::client::ApiClient;
use crate::render::{
    markup_to_text, render_message, render_structured, render_user, severity_gauge,
};

const CUSTOM_INPUT: &str = "Type something else";

#[derive(Parser)]
#[command(name = "triage-chat")]
#[command(about = "Describe symptoms, get possible causes and next steps")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question without touching the saved session
    Ask {
        /// Symptoms to describe
        message: String,
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,
        /// Send the question to a running server instead of the model host
        #[arg(long)]
        remote: Option<String>,
    },
    /// Start an interactive chat that continues the saved session
    Chat {
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,
        /// Session key
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Print the saved session
    History {
        /// Session key
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Clear the saved session
    Reset {
        /// Session key
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Run the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show configuration and session status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };
    let config = config_loader.load()?;
    let _log_guard = init_logging(&config.logging);

    match cli.command {
        Commands::Ask {
            message,
            model,
            remote,
        } => {
            info!("Running one-shot question");
            run_ask(&config, &message, model, remote).await?;
        }
        Commands::Chat { model, session } => {
            info!("Starting interactive chat");
            run_chat(&config, model, session).await?;
        }
        Commands::History { session } => run_history(&config, session)?,
        Commands::Reset { session } => run_reset(&config, session)?,
        Commands::Serve { port } => {
            info!("Starting server");
            run_serve(&config, port).await?;
        }
        Commands::Status => run_status(&config_loader, &config)?,
    }

    Ok(())
}

fn build_handler(config: &Config, model: Option<String>) -> TurnHandler {
    let provider = Arc::new(OllamaClient::from_config(&config.model));
    let format = if config.model.json_format {
        ResponseFormat::Json
    } else {
        ResponseFormat::Text
    };
    TurnHandler::new(provider, model)
        .with_context(ContextBuilder::new().with_limit(config.session.context_limit))
        .with_format(format)
}

fn session_medium(config: &Config, session: Option<String>) -> FileMedium {
    let key = session.unwrap_or_else(|| config.session.key.clone());
    FileMedium::new(expand_tilde(&config.session.dir), &key)
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn print_outcome(outcome: &TurnOutcome) {
    match outcome {
        TurnOutcome::Structured(data) => println!("{}", render_structured(data)),
        TurnOutcome::Reply(markup) => println!("{}", markup_to_text(markup)),
        TurnOutcome::Error(message) => println!("{}", style(message).red()),
    }
}

async fn run_ask(
    config: &Config,
    message: &str,
    model: Option<String>,
    remote: Option<String>,
) -> Result<()> {
    println!("{}\n", render_user(message));
    let pb = spinner("Checking symptoms...");

    let outcome = match remote {
        Some(url) => ApiClient::new(Some(url)).check(message, Vec::new()).await,
        None => Ok(build_handler(config, model).handle_turn(message, &[]).await),
    };
    pb.finish_and_clear();

    let outcome = outcome?;
    print_outcome(&outcome);
    if outcome.is_error() {
        anyhow::bail!("Failed to get a reply");
    }
    Ok(())
}

/// What the next line of input came from
enum Prompt {
    Text(String),
    Quit,
}

fn read_input(chips: &[String]) -> Result<Prompt> {
    let text = if chips.is_empty() {
        Input::<String>::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?
    } else {
        let mut items: Vec<&str> = chips.iter().map(String::as_str).collect();
        items.push(CUSTOM_INPUT);
        let choice = Select::new()
            .with_prompt("Pick a quick reply")
            .items(&items)
            .default(items.len() - 1)
            .interact()?;
        if choice < chips.len() {
            chips[choice].clone()
        } else {
            Input::<String>::new()
                .with_prompt("You")
                .allow_empty(true)
                .interact_text()?
        }
    };

    match text.trim() {
        "/quit" | "/exit" => Ok(Prompt::Quit),
        _ => Ok(Prompt::Text(text)),
    }
}

async fn run_chat(config: &Config, model: Option<String>, session: Option<String>) -> Result<()> {
    let handler = build_handler(config, model);
    let mut store = SessionStore::open(session_medium(config, session));

    println!("{}", style("Triage Chat").bold().cyan());
    println!(
        "{}",
        style("This is not medical advice. Seek care for severe or worsening symptoms.").dim()
    );
    println!("{}\n", style("Commands: /new /history /quit").dim());

    for message in store.messages() {
        println!("{}\n", render_message(message));
    }

    loop {
        // quick replies are only offered right after a structured answer
        let chips = store
            .messages()
            .last()
            .and_then(Message::structured_data)
            .map(|data| data.chips.clone())
            .unwrap_or_default();

        let text = match read_input(&chips)? {
            Prompt::Quit => break,
            Prompt::Text(text) => text,
        };

        match text.trim() {
            "" => continue,
            "/new" => {
                if let Err(e) = store.reset() {
                    warn!("Failed to delete saved session: {}", e);
                }
                println!("{}\n", style("Started a new chat.").green());
                continue;
            }
            "/history" => {
                for message in store.messages() {
                    println!("{}\n", render_message(message));
                }
                continue;
            }
            _ => {}
        }

        if !chips.is_empty() {
            println!("{}", render_user(&text));
        }
        let pb = spinner("Thinking...");
        let reply = handler.run_turn(&mut store, &text).await;
        pb.finish_and_clear();

        if let Some(reply) = reply {
            println!("\n{}\n", render_message(&reply));
        }
    }

    Ok(())
}

fn run_history(config: &Config, session: Option<String>) -> Result<()> {
    let mut store = SessionStore::new(session_medium(config, session));
    store.load()?;

    if store.is_empty() {
        println!("No saved conversation.");
        return Ok(());
    }
    for message in store.messages() {
        println!("{}\n", render_message(message));
    }
    Ok(())
}

fn run_reset(config: &Config, session: Option<String>) -> Result<()> {
    let mut store = SessionStore::new(session_medium(config, session));
    store.reset()?;
    println!("{}", style("Conversation cleared.").green());
    Ok(())
}

async fn run_serve(config: &Config, port: Option<u16>) -> Result<()> {
    let host = config.server.host.parse()?;
    let addr = SocketAddr::new(host, port.unwrap_or(config.server.port));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    let handler = build_handler(config, None);
    println!("{}", style("Starting triage-chat server...").bold().cyan());
    println!("Model: {} at {}", handler.model(), config.model.api_base);
    println!("Endpoint: http://{}/api/symptom-checker", addr);

    let state = AppState::new(handler);
    run_server(state, addr, shutdown_rx).await
}

fn run_status(loader: &ConfigLoader, config: &Config) -> Result<()> {
    println!("{}", style("Triage Chat Status").bold().cyan());
    println!("Version: {}\n", env!("CARGO_PKG_VERSION"));

    println!("{}", style("Configuration:").bold());
    println!("  Config directory: {}", loader.config_dir().display());
    println!("  Model host: {}", config.model.api_base);
    println!("  Model: {}", config.model.model);
    println!(
        "  JSON output: {}",
        if config.model.json_format {
            style("on").green()
        } else {
            style("off").dim()
        }
    );
    println!("  Context limit: {}", config.session.context_limit);
    println!();

    let medium = session_medium(config, None);
    let path = medium.path().to_path_buf();
    let mut store = SessionStore::new(medium);
    let status = match store.load() {
        Ok(()) if store.is_empty() => style("empty".to_string()).dim(),
        Ok(()) => style(format!("{} messages", store.len())).green(),
        Err(e) => style(format!("unreadable ({})", e)).red(),
    };

    println!("{}", style("Session:").bold());
    println!("  Key: {}", config.session.key);
    println!("  File: {}", path.display());
    println!("  State: {}", status);
    if let Some(data) = store.session().last_structured() {
        println!("  Last severity: {}", severity_gauge(data.severity_level()));
    }
    Ok(())
}
