//! parley-chat: interactive A2A client
//!
//! Usage:
//!   parley-chat [AGENT_URL]
//!   parley-chat --banterop

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tokio::io::BufReader;

use parley_a2a::A2aError;
use parley_cli::chat::{self, BANTEROP_URL, ChatSession, DEFAULT_AGENT_URL};
use parley_cli::{config, logging};

#[derive(Parser)]
#[command(name = "parley-chat", version, about = "Chat with an A2A agent from the terminal")]
struct Cli {
    /// Agent endpoint, e.g. http://localhost:3003/api/rooms/<room>/a2a
    #[arg(conflicts_with = "banterop")]
    url: Option<String>,

    /// Connect to the public Banterop prior-auth demo bridge
    #[arg(long)]
    banterop: bool,

    /// Config file (default: <config dir>/parley/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum number of task polls after each message
    #[arg(long)]
    max_polls: Option<u32>,

    /// Seconds between task polls
    #[arg(long)]
    poll_interval: Option<f64>,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut settings = config::load_config(cli.config.as_deref())?;
    if let Some(max_polls) = cli.max_polls {
        settings.chat.max_polls = max_polls;
    }
    if let Some(interval) = cli.poll_interval {
        settings.chat.poll_interval_secs = interval;
    }
    let poll = settings.chat.poll_config()?;

    let agent_url = if cli.banterop {
        BANTEROP_URL.to_string()
    } else {
        cli.url
            .or(settings.agent_url.clone())
            .unwrap_or_else(|| DEFAULT_AGENT_URL.to_string())
    };

    println!("Starting A2A Client...");
    let mut stdout = std::io::stdout();
    let conn = match chat::connect(&agent_url, &settings.chat, &mut stdout).await {
        Ok((_card, conn)) => conn,
        Err(e) => {
            if let Some(A2aError::Validation(report)) = e.downcast_ref::<A2aError>() {
                println!("❌ Agent card failed validation:\n{}", report);
            }
            println!("❌ Connection failed: {:#}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut session = ChatSession::new(conn, poll, stdout);
    session.run(BufReader::new(tokio::io::stdin())).await?;
    Ok(ExitCode::SUCCESS)
}
