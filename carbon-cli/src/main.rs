use std::io;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tracing::{debug, info};

use carbon_cli::app::{self, Exit};
use carbon_cli::config::{AppConfig, Cli};
use carbon_cli::logging::Logging;

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logging = Logging::init("warn")?;

    let cli = Cli::parse();
    let config = AppConfig::load(&cli, |key| std::env::var(key).ok())
        .context("Failed to load configuration")?;

    logging.apply(&config.logging)?;
    debug!(?config, "configuration resolved");

    let mut runtime = app::build_runtime(&config).await?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();
    let exit = app::run_interactive(&mut runtime, stdin, &mut stdout).await?;

    match exit {
        Exit::Quit => info!("user quit"),
        Exit::EndOfInput => info!("input closed"),
    }
    Ok(())
}
