//! ClickHouse table schemas.
//!
//! - Raw event tables are append-only MergeTree ordered by store and time
//! - `store_visits`, `daily_analytics` and `menu_items` are ReplacingMergeTree
//!   so re-emitted rows collapse to one per key; reads use `FINAL`
//! - Map-valued rollup columns hold compact JSON text

use analytics_core::{DbErrorCode, Error, Result};
use tracing::info;

use crate::client::ClickHouseClient;

pub const STORE_VISITS: &str = "store_visits";
pub const PAGE_VIEWS: &str = "page_views";
pub const USER_INTERACTIONS: &str = "user_interactions";
pub const MENU_ITEM_ANALYTICS: &str = "menu_item_analytics";
pub const MENU_ITEMS: &str = "menu_items";
pub const DAILY_ANALYTICS: &str = "daily_analytics";

/// One row per session start. The first interaction of a session re-inserts
/// its bounced visits with `is_bounce = 0`; the newer `updated_at` wins.
pub const CREATE_STORE_VISITS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS store_visits (
    id String,
    store_id String,
    visitor_id String,
    session_id String,
    user_agent Nullable(String),
    device_type LowCardinality(String),
    browser Nullable(String),
    os Nullable(String),
    referrer Nullable(String),
    country Nullable(String),
    city Nullable(String),
    visit_date Date,
    visit_timestamp DateTime64(3, 'UTC'),
    page_views_count UInt32,
    is_bounce UInt8,
    updated_at DateTime64(3, 'UTC') DEFAULT now64(3)
)
ENGINE = ReplacingMergeTree(updated_at)
PARTITION BY toYYYYMM(visit_date)
ORDER BY (store_id, visit_timestamp, session_id, id)
SETTINGS index_granularity = 8192
"#;

pub const CREATE_PAGE_VIEWS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS page_views (
    id String,
    store_id String,
    visitor_id String,
    session_id String,
    page_type LowCardinality(String),
    page_url Nullable(String),
    viewed_at DateTime64(3, 'UTC'),
    time_on_page Nullable(UInt32),
    scroll_depth Nullable(Float64)
)
ENGINE = MergeTree()
PARTITION BY toYYYYMM(viewed_at)
ORDER BY (store_id, viewed_at)
SETTINGS index_granularity = 8192
"#;

pub const CREATE_USER_INTERACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS user_interactions (
    id String,
    store_id String,
    visitor_id String,
    session_id String,
    interaction_type LowCardinality(String),
    target_id Nullable(String),
    data Nullable(String),
    created_at DateTime64(3, 'UTC')
)
ENGINE = MergeTree()
PARTITION BY toYYYYMM(created_at)
ORDER BY (store_id, created_at)
SETTINGS index_granularity = 8192
"#;

pub const CREATE_MENU_ITEM_ANALYTICS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS menu_item_analytics (
    id String,
    store_id String,
    menu_item_id String,
    visitor_id String,
    session_id String,
    action_type LowCardinality(String),
    time_spent Nullable(UInt32),
    created_at DateTime64(3, 'UTC')
)
ENGINE = MergeTree()
PARTITION BY toYYYYMM(created_at)
ORDER BY (store_id, created_at, menu_item_id)
SETTINGS index_granularity = 8192
"#;

/// Catalog projection: just enough to name items and their categories.
pub const CREATE_MENU_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS menu_items (
    id String,
    store_id String,
    name String,
    category_id Nullable(String),
    category_name Nullable(String),
    updated_at DateTime64(3, 'UTC')
)
ENGINE = ReplacingMergeTree(updated_at)
ORDER BY (store_id, id)
"#;

/// Output of the rollup job, one row per store and day after merges.
pub const CREATE_DAILY_ANALYTICS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS daily_analytics (
    id String,
    store_id String,
    date Date,
    total_visits UInt64,
    unique_visitors UInt64,
    total_page_views UInt64,
    avg_session_duration Float64,
    bounce_rate Float64,
    email_clicks UInt64,
    phone_clicks UInt64,
    whatsapp_clicks UInt64,
    map_clicks UInt64,
    social_clicks UInt64,
    share_clicks UInt64,
    menu_item_clicks UInt64,
    mobile_visits UInt64,
    desktop_visits UInt64,
    tablet_visits UInt64,
    top_countries String,
    top_cities String,
    peak_hours String,
    updated_at DateTime64(3, 'UTC') DEFAULT now64(3)
)
ENGINE = ReplacingMergeTree(updated_at)
PARTITION BY toYYYYMM(date)
ORDER BY (store_id, date)
"#;

/// All table creation statements, in dependency order.
pub fn all_tables() -> [&'static str; 6] {
    [
        CREATE_STORE_VISITS_TABLE,
        CREATE_PAGE_VIEWS_TABLE,
        CREATE_USER_INTERACTIONS_TABLE,
        CREATE_MENU_ITEM_ANALYTICS_TABLE,
        CREATE_MENU_ITEMS_TABLE,
        CREATE_DAILY_ANALYTICS_TABLE,
    ]
}

/// Creates the configured database and every table if they don't exist.
pub async fn init_schema(client: &ClickHouseClient) -> Result<()> {
    let database = &client.config().database;
    if !is_valid_identifier(database) {
        return Err(Error::validation(format!(
            "invalid clickhouse database name: {}",
            database
        )));
    }

    // The bound client targets the database being created, so use `default`.
    let bootstrap = client.inner().clone().with_database("default");
    bootstrap
        .query(&format!("CREATE DATABASE IF NOT EXISTS {}", database))
        .execute()
        .await
        .map_err(|e| Error::database(DbErrorCode::WriteFailed, format!("schema init: {}", e)))?;

    for ddl in all_tables() {
        client
            .inner()
            .query(ddl)
            .execute()
            .await
            .map_err(|e| Error::database(DbErrorCode::WriteFailed, format!("schema init: {}", e)))?;
    }

    info!(database = %database, tables = all_tables().len(), "ClickHouse schema initialized");
    Ok(())
}

fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}
