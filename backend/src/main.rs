use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use voucher_backend::config::AppConfig;
use voucher_backend::{create_router, Backend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    info!("Setting up voucher store");
    let backend = Backend::open(&config)
        .with_context(|| format!("Failed to open store in {}", config.data_dir.display()))?;

    let app = create_router(backend.state(), &config.shell_origin);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Flush the store on every exit path, including a failed server
    if let Err(e) = backend.close() {
        error!("Failed to close voucher store: {}", e);
    }

    served?;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
