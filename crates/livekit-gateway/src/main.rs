//! LiveKit gateway server

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use livekit_gateway::GatewayConfig;
use livekit_gateway::logging::{LoggingConfig, setup_logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    let config = GatewayConfig::from_env().context("Failed to load configuration")?;
    setup_logging(&LoggingConfig::from(&config)).context("Failed to set up logging")?;

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!(error = %e, "Ignoring unreadable .env file"),
    }

    let address = config.bind_address();
    info!(
        livekit_url = %config.livekit_url,
        api_key = %config.livekit_api_key,
        "Starting LiveKit gateway"
    );

    let app = livekit_gateway::init(config).context("Failed to build gateway")?;

    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!(%address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
