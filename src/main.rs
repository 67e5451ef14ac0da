// ABOUTME: Main entry point for aider-bridge
// Reads editor events as JSON lines on stdin and drives an assistant session in tmux

use aider_bridge::channel::{ChannelError, LaunchSpec, Launcher, Transport};
use aider_bridge::config::AppConfig;
use aider_bridge::engine::{BridgeEvent, EngineRuntime, ReconciliationEngine};
use aider_bridge::tmux::TmuxLauncher;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "aider-bridge", about = "Keep an aider session in step with your editor")]
struct Args {
    /// Configuration file (defaults to ~/.aider-bridge/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the session starts in
    #[arg(long)]
    working_dir: Option<PathBuf>,

    /// Print outgoing commands instead of launching tmux
    #[arg(long)]
    dry_run: bool,

    /// Log to stderr instead of the log directory
    #[arg(long)]
    stderr_log: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.stderr_log)?;

    let mut config = match &args.config {
        Some(path) => {
            let mut config = AppConfig::load_from(path)?;
            config.apply_env(|name| std::env::var(name).ok());
            config
        }
        None => AppConfig::load()?,
    };
    if let Some(dir) = args.working_dir {
        config.working_directory = Some(dir);
    }

    let mut engine = if args.dry_run {
        ReconciliationEngine::new(StdoutLauncher)
    } else {
        ReconciliationEngine::new(TmuxLauncher)
    };
    engine.on_close(|session, reason| info!("Session {} closed: {:?}", session.id, reason));

    let session = engine
        .open(config)
        .context("Failed to start assistant session")?;
    info!(
        "Session {} running in {}",
        session.id,
        session.working_directory.display()
    );

    let (runtime, handle) = EngineRuntime::new(engine);
    let worker = tokio::spawn(runtime.run());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match BridgeEvent::parse(line) {
            Ok(event) => {
                if !handle.send(event) {
                    warn!("Runtime stopped, ignoring remaining input");
                    break;
                }
            }
            Err(e) => error!("Invalid event {:?}: {}", line, e),
        }
    }

    drop(handle);
    worker.await.context("Runtime task failed")?;
    Ok(())
}

fn setup_logging(to_stderr: bool) -> Result<()> {
    use std::fs::OpenOptions;
    use tracing_subscriber::prelude::*;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "aider_bridge=info".into());

    if to_stderr {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init();
        return Ok(());
    }

    let log_dir = dirs::home_dir()
        .map(|home| home.join(".aider-bridge").join("logs"))
        .unwrap_or_else(|| PathBuf::from(".aider-bridge/logs"));
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create {}", log_dir.display()))?;

    let log_file = log_dir.join(format!(
        "aider-bridge-{}.log",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .with_context(|| format!("Failed to create log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(file)
                .with_ansi(false),
        )
        .with(filter)
        .init();
    Ok(())
}

/// Dry-run launcher: every line that would be typed is printed instead.
struct StdoutLauncher;

impl Launcher for StdoutLauncher {
    fn launch(&mut self, spec: &LaunchSpec) -> Result<Box<dyn Transport>, ChannelError> {
        println!(
            "# launch {} in {}: {}",
            spec.name,
            spec.working_directory.display(),
            spec.command_line
        );
        Ok(Box::new(StdoutTransport))
    }
}

struct StdoutTransport;

impl Transport for StdoutTransport {
    fn send_text(&mut self, text: &str, add_newline: bool) -> Result<(), ChannelError> {
        if add_newline {
            println!("{}", text);
        } else {
            print!("{}", text);
        }
        Ok(())
    }

    fn dispose(&mut self) {
        println!("# disposed");
    }
}
