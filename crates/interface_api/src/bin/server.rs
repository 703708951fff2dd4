//! Inter-company Payables - API Server Binary
//!
//! # Usage
//!
//! ```bash
//! API_SPLIT__VAT_RATE=0.21 API_DATABASE_URL=postgres://... cargo run --bin payables-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_SPLIT__SHARE_A`, `API_SPLIT__SHARE_B` - Cost split (default: 0.65 / 0.35)
//! * `API_SPLIT__VAT_RATE` - VAT rate as a fraction (required)
//! * `API_SETTLEMENT__MAX_ATTEMPTS` - Settlement commit attempts (default: 3)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use domain_payables::PayablesEngine;
use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresPayablesAdapter};
use interface_api::{config::ApiConfig, create_router, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("Failed to load configuration")?;

    init_tracing(&config.log_level);

    let engine_config = config
        .engine_config()
        .context("Invalid split or VAT configuration")?;

    tracing::info!(
        host = %config.host,
        port = %config.port,
        vat_divisor = %engine_config.vat_divisor(),
        "Starting payables API server"
    );

    let pool = create_pool(DatabaseConfig::new(&config.database_url))
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool).await.context("Failed to apply migrations")?;

    let adapter = Arc::new(PostgresPayablesAdapter::new(pool));
    let engine = PayablesEngine::new(engine_config, adapter.clone(), adapter.clone());
    let app = create_router(AppState::new(engine, adapter, config.clone()));

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("Invalid server address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
