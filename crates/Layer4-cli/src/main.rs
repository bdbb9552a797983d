//! ShellDock CLI - Main entry point
//!
//! Serves a persistent shell session to an agent host over MCP stdio.
//! stdout carries the protocol, so all logging goes to stderr.

use anyhow::Context;
use clap::Parser;
use dock_core::{
    all_tools, McpServer, RuntimeContext, SafetyFilter, SessionError, SessionOptions,
    SessionSupervisor, ToolDispatcher,
};
use dock_foundation::{ConfigLoader, DenyPatternSet, DockConfig, ShellType};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// ShellDock - a persistent shell session for AI agents
#[derive(Parser, Debug)]
#[command(name = "shelldock")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file to use instead of the user/project lookup
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Shell to run (bash, zsh, sh, xonsh)
    #[arg(long)]
    shell: Option<ShellType>,

    /// Explicit shell executable
    #[arg(long)]
    shell_path: Option<PathBuf>,

    /// Default command timeout in seconds
    #[arg(short, long)]
    timeout: Option<f64>,

    /// Directory the shell starts in
    #[arg(short, long)]
    working_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    /// Layered settings, then command-line overrides
    fn resolve_config(&self) -> anyhow::Result<DockConfig> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load_from(path)?,
            None => {
                let base = match &self.working_dir {
                    Some(dir) => dir.clone(),
                    None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
                };
                ConfigLoader::new(&base).load_all()?
            }
        };

        if let Some(shell) = self.shell {
            config.shell = shell;
        }
        if self.shell_path.is_some() {
            config.shell_path = self.shell_path.clone();
        }
        if let Some(secs) = self.timeout {
            config.timeouts.default_secs = secs;
        }
        if self.working_dir.is_some() {
            config.working_dir = self.working_dir.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(debug: bool) {
    let log_level = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn check_working_dir(dir: &Path) -> anyhow::Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("working directory '{}' is not a directory", dir.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let config = args.resolve_config().context("Failed to load configuration")?;
    if let Some(dir) = &config.working_dir {
        check_working_dir(dir)?;
    }

    let patterns = DenyPatternSet::with_extra(config.extra_deny_patterns.clone())
        .context("Invalid deny pattern")?;
    let filter = SafetyFilter::new(Arc::new(patterns));
    tracing::info!("Safety filter loaded with {} patterns", filter.pattern_count());

    let supervisor = Arc::new(SessionSupervisor::with_options(SessionOptions::from(&config)));
    let ctx = RuntimeContext::new(supervisor.clone(), filter, config.timeouts);
    let dispatcher = Arc::new(ToolDispatcher::new(all_tools(), Arc::new(ctx))?);

    match supervisor.open_eagerly().await {
        Ok(()) => tracing::info!("Shell session ready ({})", config.shell),
        Err(SessionError::SpawnError(e)) => {
            anyhow::bail!("Cannot start {}: {}", config.shell, e);
        }
        // Recreated on first use
        Err(e) => tracing::warn!("Shell session not ready yet: {}", e),
    }

    let server = McpServer::new(dispatcher);
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    let served = tokio::select! {
        result = server.serve(stdin, stdout) => result.context("MCP transport failed"),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            Ok(())
        }
    };

    supervisor.shutdown().await;
    served
}
