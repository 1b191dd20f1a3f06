//! Insert helpers for ClickHouse.

use analytics_core::{DailyAnalytics, Result};
use clickhouse::Row;
use serde::Serialize;
use tracing::debug;

use crate::client::ClickHouseClient;
use crate::rows::{DailyAnalyticsRow, MenuItemRow};
use crate::schema::{DAILY_ANALYTICS, MENU_ITEMS};

/// Writes rows into `table` as one insert.
pub async fn insert_rows<T>(client: &ClickHouseClient, table: &str, rows: &[T]) -> Result<usize>
where
    T: Row + Serialize,
{
    if rows.is_empty() {
        return Ok(0);
    }

    let what = format!("insert into {}", table);
    client
        .write(&what, async {
            let mut insert = client.inner().insert::<T>(table)?;
            for row in rows {
                insert.write(row).await?;
            }
            insert.end().await
        })
        .await?;

    debug!(table = table, count = rows.len(), "Inserted rows to ClickHouse");
    Ok(rows.len())
}

/// Inserts a single event row.
pub async fn insert_event<T>(client: &ClickHouseClient, table: &str, row: &T) -> Result<()>
where
    T: Row + Serialize,
{
    insert_rows(client, table, std::slice::from_ref(row)).await?;
    Ok(())
}

/// Writes or replaces catalog names for menu items.
pub async fn upsert_menu_items(client: &ClickHouseClient, items: &[MenuItemRow]) -> Result<usize> {
    insert_rows(client, MENU_ITEMS, items).await
}

/// Writes rollup rows produced by the daily job. A later row for the same
/// store and day replaces the earlier one.
pub async fn insert_daily_rows(client: &ClickHouseClient, rows: &[DailyAnalytics]) -> Result<usize> {
    let rows = rows
        .iter()
        .map(DailyAnalyticsRow::try_from_daily)
        .collect::<Result<Vec<_>>>()?;
    insert_rows(client, DAILY_ANALYTICS, &rows).await
}
