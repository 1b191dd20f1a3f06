//! ClickHouse client wrapper.

use std::future::Future;
use std::time::Instant;

use analytics_core::{DbErrorCode, Error, Result};
use clickhouse::Client;
use telemetry::metrics;
use tracing::info;

use crate::config::ClickHouseConfig;

/// ClickHouse client bound to the analytics database.
#[derive(Clone)]
pub struct ClickHouseClient {
    inner: Client,
    config: ClickHouseConfig,
}

impl ClickHouseClient {
    /// Creates a new ClickHouse client.
    pub fn new(config: ClickHouseConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(Error::validation("clickhouse url must not be empty"));
        }

        let mut client = Client::default()
            .with_url(&config.url)
            .with_database(&config.database);

        if let Some(ref user) = config.username {
            client = client.with_user(user);
        }

        if let Some(ref pass) = config.password {
            client = client.with_password(pass);
        }

        info!(
            url = %config.url,
            database = %config.database,
            "Created ClickHouse client"
        );

        Ok(Self {
            inner: client,
            config,
        })
    }

    /// Returns the inner clickhouse client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClickHouseConfig {
        &self.config
    }

    /// Runs a read statement under the configured timeout, recording latency
    /// and mapping failures to `DB_001`.
    pub async fn read<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = clickhouse::error::Result<T>>,
    {
        let start = Instant::now();
        metrics().read_queries.inc();
        let result = self.timed(what, DbErrorCode::ReadFailed, fut).await;
        metrics().query_latency_ms.observe_since(start);
        if result.is_err() {
            metrics().query_errors.inc();
        }
        result
    }

    /// Runs a write statement under the configured timeout, recording latency
    /// and mapping failures to `DB_002`.
    pub async fn write<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = clickhouse::error::Result<T>>,
    {
        let start = Instant::now();
        let result = self.timed(what, DbErrorCode::WriteFailed, fut).await;
        metrics().insert_latency_ms.observe_since(start);
        result
    }

    async fn timed<T, F>(&self, what: &str, code: DbErrorCode, fut: F) -> Result<T>
    where
        F: Future<Output = clickhouse::error::Result<T>>,
    {
        match tokio::time::timeout(self.config.timeout(), fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(Error::database(code, format!("{}: {}", what, e))),
            Err(_) => Err(Error::database(
                code,
                format!("{}: timed out after {}s", what, self.config.timeout_secs),
            )),
        }
    }
}
