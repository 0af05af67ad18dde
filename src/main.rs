//! Supervisor entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use stackrun::config::loader;
use stackrun::lifecycle::{signals, startup, Shutdown};
use stackrun::observability::logging;

#[derive(Parser)]
#[command(name = "stackrun")]
#[command(about = "Minimal declarative service-stack supervisor", long_about = None)]
struct Args {
    /// Path to the stack definition. Without it the built-in stack is used.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => loader::load_config(path)?,
        None => loader::default_config()?,
    };

    logging::init_logging(&config.observability);

    tracing::info!(
        stack = %config.name,
        services = config.services.len(),
        volume_root = %config.volume.root.display(),
        gate_timeout_secs = config.supervisor.gate_timeout_secs,
        "configuration loaded"
    );

    let shutdown = Arc::new(Shutdown::new());
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    startup::run_stack(&config, shutdown).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
