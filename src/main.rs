//! Catalog Analytics Service
//!
//! Storefront tracking and dashboard reporting for published catalog stores:
//! - Best-effort recording of visits, page views, interactions and menu item actions
//! - Period-based summaries, menu item and category performance
//! - Real-time snapshots and JSON/CSV export of daily rollups

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use api::{router, AppState};
use clickhouse_client::{ClickHouseClient, ClickHouseConfig, ClickHouseStore};
use telemetry::{init_tracing_from_env, metrics};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// Seconds between ClickHouse health probes
    #[serde(default = "default_health_interval_secs")]
    health_interval_secs: u64,

    #[serde(default)]
    clickhouse: ClickHouseConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_health_interval_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            health_interval_secs: default_health_interval_secs(),
            clickhouse: ClickHouseConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Catalog Analytics v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    let clickhouse = ClickHouseClient::new(config.clickhouse.clone())
        .context("Failed to create ClickHouse client")?;

    if let Err(e) = clickhouse_client::init_schema(&clickhouse).await {
        // Tables may already exist under a user without DDL rights
        error!("Failed to initialize ClickHouse schema: {}", e);
    }

    if clickhouse_client::check_connection(&clickhouse).await {
        info!("ClickHouse connection: healthy");
    } else {
        error!("ClickHouse connection: unhealthy");
    }

    let _health_task = spawn_health_checks(
        clickhouse.clone(),
        Duration::from_secs(config.health_interval_secs.max(1)),
    );

    let store = Arc::new(ClickHouseStore::new(clickhouse));
    let app = router(AppState::new(store));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");
    let snapshot = metrics().snapshot();
    info!(
        events_recorded = snapshot.events_recorded,
        record_failures = snapshot.record_failures,
        bounce_updates = snapshot.bounce_updates,
        read_queries = snapshot.read_queries,
        query_errors = snapshot.query_errors,
        exports = snapshot.exports,
        record_failure_ratio = snapshot.record_failure_ratio(),
        "Final metrics"
    );

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // CATALOG_ANALYTICS__PORT, CATALOG_ANALYTICS__CLICKHOUSE__URL, ...
        .add_source(
            config::Environment::with_prefix("CATALOG_ANALYTICS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Re-probes ClickHouse so readiness tracks the backend.
fn spawn_health_checks(client: ClickHouseClient, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            if !clickhouse_client::check_connection(&client).await {
                warn!("ClickHouse health probe failed");
            }
        }
    })
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
