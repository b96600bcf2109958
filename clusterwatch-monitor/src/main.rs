//! Clusterwatch - cluster node health dashboard
//!
//! Runs the refresh loop as a background task and the command loop on
//! stdin. `q` or Ctrl-C raises the shutdown signal; the in-flight refresh
//! cycle finishes before the screen is cleared and the process exits.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use clusterwatch::refresh;
use clusterwatch::{CommandLoop, Exit, MonitorConfig, ProcessRunner, RefreshLoop, Terminal};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the dashboard
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("clusterwatch=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Clusterwatch starting...");

    let config = Arc::new(
        MonitorConfig::load()
            .await
            .context("Failed to load configuration")?,
    );
    let runner = Arc::new(ProcessRunner::new(config.remote.timeout()));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let refresh_loop = RefreshLoop::new(Arc::clone(&runner), Arc::clone(&config));
    let refresh_handle = tokio::spawn(async move {
        let mut terminal = Terminal;
        refresh_loop.run(&mut terminal, shutdown_rx).await
    });

    let mut commands = CommandLoop::new(runner, config);
    let mut terminal = Terminal;
    let stdin = BufReader::new(tokio::io::stdin());

    tokio::select! {
        exit = commands.run(stdin, &mut terminal, &shutdown_tx) => {
            if exit == Exit::InputClosed {
                info!("stdin closed, refreshing until Ctrl-C");
                tokio::signal::ctrl_c()
                    .await
                    .context("Failed to listen for Ctrl-C")?;
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
        }
    }

    let cycles = refresh::shutdown(&shutdown_tx, refresh_handle, &mut terminal).await?;
    info!("Clusterwatch stopped after {} cycles", cycles);

    // A pending blocking stdin read would otherwise hold the runtime open.
    std::process::exit(0);
}
