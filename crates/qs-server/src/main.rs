//! # QS Server
//!
//! Loads configuration, installs logging and metrics, wires the cache layer
//! and warms it, then runs until a shutdown signal arrives.

use qs_config::ConfigLoader;
use qs_core::telemetry::init_logging;
use qs_core::QsResult;
use qs_server::startup::{init_metrics, print_startup_info, CacheLayer};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Application error: {}", e);
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> QsResult<()> {
    let config = ConfigLoader::from_default_location().load()?;
    init_logging(&config.observability.logging_options())?;

    info!("Starting QS server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    print_startup_info(&config);

    init_metrics(&config.observability)?;

    let layer = CacheLayer::build(&config)?;
    layer.report_health().await;
    layer.warm().await;

    shutdown_signal().await;

    layer.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
