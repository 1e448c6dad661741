use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

mod balancer;
mod config;
mod diversion;
mod error;
mod policy;
mod store;
mod sync;
mod worker;

use config::ConfigManager;
use store::SharedStateStore;
use worker::Worker;

#[derive(Parser)]
#[command(name = "fluxgate")]
#[command(about = "A dynamic A/B diversion and load-balancing data plane")]
struct Args {
    #[arg(short, long, default_value = "config/config.toml")]
    config: String,

    /// Override the sync endpoint bind address from the config file
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Override the number of data-plane workers
    #[arg(short, long)]
    workers: Option<usize>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("fluxgate={}", level))
        .init();

    info!("Starting fluxgate data plane");

    // Load configuration with hot reload
    let mut config_manager = ConfigManager::new(&args.config).await?;
    let config = config_manager.get_config();
    info!("Loaded configuration from {}", args.config);

    let bind = args.bind.unwrap_or(config.server.bind);
    let workers = args.workers.unwrap_or_else(|| config.get_workers());

    // Shared state store, seeded from the bootstrap upstreams so workers
    // have backends before the first control-plane push arrives
    let store = Arc::new(SharedStateStore::with_max_value_bytes(
        config.server.get_max_payload_bytes(),
    ));
    sync::seed_backends(&store, &config.upstreams)?;

    config_manager.set_store_reseed(Arc::clone(&store));
    config_manager.start_hot_reload().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Start the configuration sync endpoint
    let mut sync_handle =
        sync::start_sync_server(bind, Arc::clone(&store), shutdown_rx.clone()).await?;

    // Spawn data-plane workers
    let sync_interval = config.server.get_sync_interval();
    let mut worker_handles = Vec::with_capacity(workers);
    for id in 0..workers {
        let worker = Worker::new(id, Arc::clone(&store));
        worker_handles.push(tokio::spawn(worker.run(sync_interval, shutdown_rx.clone())));
    }
    info!("Spawned {} data-plane worker(s)", workers);

    // Setup graceful shutdown
    let shutdown_signal = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        warn!("Received CTRL+C, shutting down gracefully...");
    };

    tokio::select! {
        result = &mut sync_handle => {
            if let Err(e) = result {
                tracing::error!("Sync endpoint task terminated: {}", e);
            }
        }
        _ = shutdown_signal => {
            info!("Shutdown signal received");
        }
    }

    // Stop the sync endpoint and drain workers
    let _ = shutdown_tx.send(true);
    if !sync_handle.is_finished() {
        let _ = (&mut sync_handle).await;
    }
    for handle in worker_handles {
        let _ = handle.await;
    }

    info!("Fluxgate shutdown complete");
    Ok(())
}
