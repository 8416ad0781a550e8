//! Kraken signing proxy binary
//!
//! Configuration comes from `KRAKEN_PROXY_*` variables (see
//! [`kraken_proxy::config`]). `RUST_LOG` controls the log filter and
//! defaults to `info`.

use kraken_proxy::{serve, ProxyConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match ProxyConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(2);
        }
    };

    if let Err(e) = serve(config, shutdown_signal()).await {
        error!(error = %e, "Proxy exited with error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
