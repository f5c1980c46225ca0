//! Business Partner API Server
//!
//! # Usage
//!
//! ```bash
//! API_DATABASE_URL=postgres://... API_CLIENT_ID=11 cargo run --bin bpartner-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST`, `API_PORT` - bind address (default: 0.0.0.0:3000)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_DB_MAX_CONNECTIONS`, `API_DB_MIN_CONNECTIONS` - pool sizing (10 / 2)
//! * `API_CLIENT_ID`, `API_ORG_ID` - tenant scope of every request
//! * `API_CREATED_BY`, `API_UPDATED_BY` - actor recorded on new partners
//! * `API_ID_RANGE_START`, `API_ID_RANGE_END` - partner id range (1000-5000)
//! * `API_MAX_ATTEMPTS` - allocation attempts per creation (3)
//! * `API_LOG_LEVEL` - used when `RUST_LOG` is unset (default: info)
//! * `API_LOG_JSON` - `true` for JSON log lines
//!
//! A `.env` file in the working directory is loaded first.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_partner::PartnerService;
use infra_db::{close_pool, create_pool, PostgresPartnerStore, MIGRATOR};
use interface_api::{config::ApiConfig, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid API_* configuration")?;
    init_tracing(&config.log_level, config.log_json);

    tracing::info!(
        host = %config.host,
        port = config.port,
        client_id = config.client_id,
        "Starting business partner API server"
    );

    let id_range = config.id_range().context("invalid partner id range")?;
    let pool = create_pool(config.database())
        .await
        .context("failed to connect to database")?;

    tracing::info!("Running database migrations");
    MIGRATOR.run(&pool).await.context("failed to apply migrations")?;

    let service = PartnerService::new(
        Arc::new(PostgresPartnerStore::new(pool.clone())),
        config.tenant_metadata(),
    )
    .with_id_range(id_range)
    .with_max_attempts(config.max_attempts);

    let addr: SocketAddr = config.server_addr().parse().context("invalid bind address")?;
    let app = create_router(AppState::new(service, config));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(&pool).await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json());
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_target(true));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
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
