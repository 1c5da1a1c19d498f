//! Gateway server entry point.

use axum::Router;
use gateway::GatewayConfig;
use order_ledger::{InMemoryOrderLedger, PostgresOrderLedger};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn build_app(
    config: &GatewayConfig,
    metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
) -> Result<Router, order_ledger::LedgerError> {
    let state = match &config.orders_db_url {
        Some(url) => {
            let ledger = PostgresOrderLedger::connect(url).await?;
            tracing::info!("order ledger connected to PostgreSQL");
            gateway::create_default_state(config, ledger)
        }
        None => {
            tracing::warn!("ORDERS_DB_URL not set, orders are kept in memory");
            gateway::create_default_state(config, InMemoryOrderLedger::new())
        }
    };

    Ok(gateway::create_app(state, metrics_handle))
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let config = GatewayConfig::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = match metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
    {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "failed to install Prometheus recorder");
            return std::process::ExitCode::FAILURE;
        }
    };

    // 3. Wire the ledger, authorizer and notifier
    let app = match build_app(&config, metrics_handle).await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize order ledger");
            return std::process::ExitCode::FAILURE;
        }
    };

    // 4. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting gateway");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind address");
            return std::process::ExitCode::FAILURE;
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
        return std::process::ExitCode::FAILURE;
    }

    tracing::info!("server shut down gracefully");
    std::process::ExitCode::SUCCESS
}
