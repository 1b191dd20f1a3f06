//! ClickHouse health checks.

use crate::client::ClickHouseClient;
use telemetry::health;
use tracing::{debug, error};

/// Pings ClickHouse and updates the `clickhouse` health component.
pub async fn check_connection(client: &ClickHouseClient) -> bool {
    let ping = tokio::time::timeout(
        client.config().timeout(),
        client.inner().query("SELECT 1").fetch_one::<u8>(),
    )
    .await;

    match ping {
        Ok(Ok(_)) => {
            debug!("ClickHouse connection healthy");
            health().clickhouse.set_healthy();
            true
        }
        Ok(Err(e)) => {
            error!("ClickHouse health check failed: {}", e);
            health().clickhouse.set_unhealthy(e.to_string());
            false
        }
        Err(_) => {
            error!("ClickHouse health check timed out");
            health().clickhouse.set_unhealthy("health check timed out");
            false
        }
    }
}
