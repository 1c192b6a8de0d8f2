//! tether: run a window-grouping script against an in-process runtime mesh.
//!
//! Each script line is one command (see [`script`]). Events published by any
//! runtime are printed as JSON lines prefixed by the runtime name, followed
//! by one `{"success": ...}` reply per command.

mod runner;
mod script;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tether_config::{LoggingConfig, TetherConfig};

use crate::runner::Runner;

#[derive(Parser)]
#[command(name = "tether", about = "Run a window-grouping script against a runtime mesh")]
struct Args {
    /// Config file (defaults to the platform config dir).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective config as JSON and exit.
    #[arg(long)]
    print_config: bool,

    /// Script to run; reads stdin when omitted.
    script: Option<PathBuf>,
}

fn init_logging(logging: &LoggingConfig) {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| logging.level.as_directive().into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match tether_config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("tether: {e}");
            return ExitCode::FAILURE;
        }
    };
    if args.print_config {
        println!("{}", tether_config::config_to_json(&config));
        return ExitCode::SUCCESS;
    }
    init_logging(&config.logging);
    tracing::info!("tether v{} starting", env!("CARGO_PKG_VERSION"));

    match run(&config, args.script.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "script aborted");
            ExitCode::FAILURE
        }
    }
}

/// Feed every script line through a fresh runner. Command failures are
/// reported inline; only I/O errors end the run.
async fn run(config: &TetherConfig, script: Option<&Path>) -> tether_common::Result<()> {
    let input: Box<dyn BufRead> = match script {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut runner = Runner::new(config).await;
    let mut stdout = io::stdout().lock();

    for (idx, line) in input.lines().enumerate() {
        let line = line?;
        for out in runner.execute_line(idx + 1, &line).await {
            writeln!(stdout, "{out}")?;
        }
    }
    stdout.flush()?;
    Ok(())
}
