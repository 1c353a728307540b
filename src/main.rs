//! Application entrypoint and state wiring.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use pow_ledger_node::cli::Cli;
use pow_ledger_node::{router, AppState, Ledger, NodeConfig, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("pow-ledger-node v{}", env!("CARGO_PKG_VERSION"));

    let config = NodeConfig::from_cli(&cli)?;
    info!(
        difficulty = config.ledger.difficulty,
        max_attempts = config.ledger.max_attempts,
        strategy = ?config.ledger.strategy,
        "ledger configured"
    );

    let ledger = Ledger::new(config.ledger.clone(), Arc::new(SystemClock));
    let app = router(AppState::new(ledger));

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
