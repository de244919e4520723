//! parley-validate: fetch an agent card and check it against the A2A schema
//!
//! Usage:
//!   parley-validate <agent-card-url>
//!
//! Example:
//!   parley-validate http://localhost:3003/rooms/abc/agent-card.json

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use parley_cli::validate::{self, Verdict};
use parley_cli::{config, logging};

#[derive(Parser)]
#[command(name = "parley-validate", version, about = "Validate an A2A agent card")]
struct Cli {
    /// Full URL of the agent card document
    url: String,

    /// Request timeout in seconds (default 10)
    #[arg(long)]
    timeout: Option<u64>,

    /// Config file (default: <config dir>/parley/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(msg) = validate::check_url(&cli.url) {
        println!("{}", msg);
        return ExitCode::FAILURE;
    }

    let settings = match config::load_config(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    let timeout = Duration::from_secs(cli.timeout.unwrap_or(settings.validate.timeout_secs));

    let mut stdout = std::io::stdout();
    match validate::run(&cli.url, timeout, &mut stdout).await {
        Ok(Verdict::Passed) => ExitCode::SUCCESS,
        Ok(Verdict::Failed | Verdict::Error) => ExitCode::FAILURE,
        Err(e) => {
            println!("❌ ERROR: Unexpected error occurred\n   Details: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
