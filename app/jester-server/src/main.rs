//! jester server binary.
//!
//! ```bash
//! # Default config file (.configs/config.toml), info logs
//! cargo run -p jester-server
//!
//! # Another config file, debug logs
//! JESTER_CONFIG=/etc/jester.toml RUST_LOG=debug cargo run -p jester-server
//! ```

use std::process::ExitCode;

use jester_server::Config;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = Config::path_from_env();
    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(err) => {
            error!(path = %path.display(), error = %err, "unable to load configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(
        path = %path.display(),
        addr = %config.server.addr,
        names = %config.clients.name_service.base_url,
        jokes = %config.clients.joke_service.base_url,
        "starting jester"
    );

    match jester_server::run(config, shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = ?e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = ?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
