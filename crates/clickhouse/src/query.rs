//! Range queries over the event and rollup tables.

use analytics_core::{
    DailyAnalytics, DateRange, Error, MenuItemActionRecord, PageView, Result, StoreVisit,
    UserInteraction, ValidationErrorCode,
};
use chrono::{DateTime, Days, Local, NaiveDate, TimeZone, Utc};

use crate::client::ClickHouseClient;
use crate::rows::{
    DailyAnalyticsRow, MenuItemActionJoinRow, PageViewRow, StoreVisitRow,
    UserInteractionRow,
};

/// UTC instants bounding the local calendar days of `range`: `[start, end)`.
pub fn local_day_bounds(range: DateRange) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let out_of_range = || {
        Error::validation_code(
            ValidationErrorCode::InvalidFormat,
            format!("date range {} is outside the supported calendar", range),
        )
    };
    let next = range.end.checked_add_days(Days::new(1)).ok_or_else(out_of_range)?;
    let start = start_of_day(&Local, range.start).ok_or_else(out_of_range)?;
    let end = start_of_day(&Local, next).ok_or_else(out_of_range)?;
    Ok((start, end))
}

/// First instant of `date` in `tz`. Where midnight falls in a DST gap the day
/// starts at the first hour that exists.
fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    (0..24).find_map(|hour| {
        let naive = date.and_hms_opt(hour, 0, 0)?;
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

pub async fn daily_rows(
    client: &ClickHouseClient,
    store_id: &str,
    range: DateRange,
) -> Result<Vec<DailyAnalytics>> {
    let rows: Vec<DailyAnalyticsRow> = client
        .read(
            "daily rows",
            client
                .inner()
                .query(
                    "SELECT ?fields FROM daily_analytics FINAL \
                     WHERE store_id = ? AND date >= toDate(?) AND date <= toDate(?) ORDER BY date ASC",
                )
                .bind(store_id)
                .bind(range.start.to_string())
                .bind(range.end.to_string())
                .fetch_all(),
        )
        .await?;
    rows.into_iter().map(DailyAnalytics::try_from).collect()
}

pub async fn daily_row(
    client: &ClickHouseClient,
    store_id: &str,
    date: NaiveDate,
) -> Result<Option<DailyAnalytics>> {
    let row: Option<DailyAnalyticsRow> = client
        .read(
            "daily row",
            client
                .inner()
                .query("SELECT ?fields FROM daily_analytics FINAL WHERE store_id = ? AND date = toDate(?) LIMIT 1")
                .bind(store_id)
                .bind(date.to_string())
                .fetch_optional(),
        )
        .await?;
    row.map(DailyAnalytics::try_from).transpose()
}

pub async fn interactions(
    client: &ClickHouseClient,
    store_id: &str,
    range: DateRange,
) -> Result<Vec<UserInteraction>> {
    let (from, to) = local_day_bounds(range)?;
    let rows: Vec<UserInteractionRow> = client
        .read(
            "interactions",
            client
                .inner()
                .query(
                    "SELECT ?fields FROM user_interactions \
                     WHERE store_id = ? \
                       AND created_at >= fromUnixTimestamp64Milli(?) \
                       AND created_at < fromUnixTimestamp64Milli(?) \
                     ORDER BY created_at ASC",
                )
                .bind(store_id)
                .bind(from.timestamp_millis())
                .bind(to.timestamp_millis())
                .fetch_all(),
        )
        .await?;
    rows.into_iter().map(UserInteraction::try_from).collect()
}

pub async fn recent_interactions(
    client: &ClickHouseClient,
    store_id: &str,
    limit: usize,
) -> Result<Vec<UserInteraction>> {
    let rows: Vec<UserInteractionRow> = client
        .read(
            "recent interactions",
            client
                .inner()
                .query("SELECT ?fields FROM user_interactions WHERE store_id = ? ORDER BY created_at DESC LIMIT ?")
                .bind(store_id)
                .bind(limit as u64)
                .fetch_all(),
        )
        .await?;
    rows.into_iter().map(UserInteraction::try_from).collect()
}

pub async fn menu_item_actions(
    client: &ClickHouseClient,
    store_id: &str,
    range: DateRange,
) -> Result<Vec<MenuItemActionRecord>> {
    let (from, to) = local_day_bounds(range)?;
    let rows: Vec<MenuItemActionJoinRow> = client
        .read(
            "menu item actions",
            client
                .inner()
                .query(
                    "SELECT a.id, a.store_id, a.menu_item_id, a.visitor_id, a.session_id, \
                            a.action_type, a.time_spent, a.created_at, \
                            m.name AS menu_item_name, m.category_id, m.category_name \
                     FROM menu_item_analytics AS a \
                     LEFT JOIN (SELECT id, name, category_id, category_name \
                                FROM menu_items FINAL WHERE store_id = ?) AS m \
                       ON a.menu_item_id = m.id \
                     WHERE a.store_id = ? \
                       AND a.created_at >= fromUnixTimestamp64Milli(?) \
                       AND a.created_at < fromUnixTimestamp64Milli(?) \
                     ORDER BY a.created_at ASC",
                )
                .bind(store_id)
                .bind(store_id)
                .bind(from.timestamp_millis())
                .bind(to.timestamp_millis())
                .fetch_all(),
        )
        .await?;
    rows.into_iter().map(MenuItemActionRecord::try_from).collect()
}

pub async fn visits_since(
    client: &ClickHouseClient,
    store_id: &str,
    since: DateTime<Utc>,
) -> Result<Vec<StoreVisit>> {
    let rows: Vec<StoreVisitRow> = client
        .read(
            "visits since",
            client
                .inner()
                .query(
                    "SELECT ?fields FROM store_visits FINAL \
                     WHERE store_id = ? AND visit_timestamp >= fromUnixTimestamp64Milli(?) \
                     ORDER BY visit_timestamp ASC",
                )
                .bind(store_id)
                .bind(since.timestamp_millis())
                .fetch_all(),
        )
        .await?;
    rows.into_iter().map(StoreVisit::try_from).collect()
}

pub async fn page_views_since(
    client: &ClickHouseClient,
    store_id: &str,
    since: DateTime<Utc>,
) -> Result<Vec<PageView>> {
    let rows: Vec<PageViewRow> = client
        .read(
            "page views since",
            client
                .inner()
                .query(
                    "SELECT ?fields FROM page_views \
                     WHERE store_id = ? AND viewed_at >= fromUnixTimestamp64Milli(?) \
                     ORDER BY viewed_at ASC",
                )
                .bind(store_id)
                .bind(since.timestamp_millis())
                .fetch_all(),
        )
        .await?;
    rows.into_iter().map(PageView::try_from).collect()
}
