//! Holdfast demo service entry point
//!
//! Thin bootstrap: parse the bind address, install tracing, and supervise
//! the demo HTTP service with the lifecycle orchestrator. Ctrl-C closes the
//! cycle; the first fatal task error is what decides the exit code.

use clap::Parser;
use holdfast_core_lifecycle::{Completion, LifecycleError, Orchestrator};
use holdfast_server::{run_server, ServerConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "holdfast", about = "Demo service supervised by the holdfast runtime")]
struct Args {
    /// Address to bind the demo service on
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ServerConfig {
        addr: args.addr,
        ..Default::default()
    };

    let orch = Orchestrator::new();
    orch.spawn(async move {
        run_server(config)
            .await
            .map_err(|e| LifecycleError::task(e.to_string()))
    });

    let closer = orch.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received, closing");
            closer.close();
        }
    });

    match orch.wait().await {
        Completion::Clean => Ok(()),
        Completion::Faulted(e) => Err(anyhow::anyhow!(e)),
    }
}
