//! GamePipe
//!
//! Bridges a terminal to an interactive console program managed by the
//! session engine: each line read from stdin is executed as one command
//! and the collected output is printed back.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tracing::info;

use gamepipe_core::config::{LineEnding, load_config};
use gamepipe_core::tracing_init::init_tracing;
use gamepipe_engine::SessionRegistry;

#[derive(Parser, Debug)]
#[command(name = "gamepipe")]
#[command(version, about = "Interactive session engine for line-oriented console programs")]
struct Args {
    /// Program to run (must be resolvable on PATH, takes no arguments)
    program: String,

    /// Per-command idle timeout in milliseconds; the clock restarts on
    /// every output line
    #[arg(long, env = "GAMEPIPE_IDLE_TIMEOUT_MS")]
    idle_timeout_ms: Option<u64>,

    /// Line terminator appended to commands ("lf" or "crlf")
    #[arg(long, env = "GAMEPIPE_LINE_ENDING")]
    line_ending: Option<LineEnding>,

    /// Log level filter (e.g. "info", "debug", "warn")
    #[arg(long, default_value = "info", env = "GAMEPIPE_LOG_LEVEL")]
    log_level: String,

    /// Output logs as JSON (for structured log aggregation)
    #[arg(long, env = "GAMEPIPE_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(
        &format!(
            "gamepipe={},gamepipe_engine={}",
            args.log_level, args.log_level
        ),
        args.log_json,
    );

    let mut config = load_config(std::env::current_dir().ok().as_deref())?;
    if let Some(ms) = args.idle_timeout_ms {
        config.session.idle_timeout_ms = ms;
    }
    if let Some(ending) = args.line_ending {
        config.session.line_ending = ending;
    }

    info!(
        program = %args.program,
        idle_timeout_ms = config.session.idle_timeout_ms,
        "starting gamepipe"
    );

    let registry = SessionRegistry::new(config.session);

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        let output = registry.execute(&args.program, command).await?;
        if output.is_empty() {
            eprintln!("(no output)");
        } else {
            println!("{output}");
        }
    }

    registry.stop_all().await;
    Ok(())
}
