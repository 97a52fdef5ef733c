mod answer;
mod cli;
mod config;
mod controller;
mod history;
mod readline;
mod session;

use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::prelude::*;

use cli::AskArgs;
use config::Config;
use controller::PromptController;

fn main() -> Result<()> {
    let args = match AskArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Help and version print straight through. Real parse errors wait
            // for an acknowledgment so the operator sees them before a hosting
            // window tears the screen down.
            if err.exit_code() == 0 {
                err.exit();
            }
            let _ = err.print();
            wait_for_ack();
            std::process::exit(err.exit_code());
        }
    };

    init_logging();

    let answer = PromptController::new(args, Config::load()).run()?;
    println!("{}", serde_json::to_string(&answer)?);
    Ok(())
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn wait_for_ack() {
    print!("Press enter to quit...");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}
