//! Backend seam for analytics persistence.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::entities::{
    DailyAnalytics, MenuItemActionRecord, MenuItemAnalytics, PageView, StoreVisit,
    UserInteraction,
};
use crate::error::Result;
use crate::period::DateRange;

/// Trait for analytics backends.
///
/// The ClickHouse store implements this in production; tests use an
/// in-memory implementation. Inserts return the persisted record with its
/// backend-assigned id.
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    async fn insert_visit(&self, visit: StoreVisit) -> Result<StoreVisit>;

    async fn insert_page_view(&self, view: PageView) -> Result<PageView>;

    async fn insert_interaction(&self, interaction: UserInteraction) -> Result<UserInteraction>;

    async fn insert_menu_item_action(&self, action: MenuItemAnalytics)
        -> Result<MenuItemAnalytics>;

    /// Clears the bounce flag on every visit row of the session.
    async fn mark_session_engaged(&self, store_id: &str, session_id: &str) -> Result<()>;

    /// Daily rollups within the range, ascending by date.
    async fn daily_rows(&self, store_id: &str, range: DateRange) -> Result<Vec<DailyAnalytics>>;

    /// The rollup for one day, if the rollup job produced it.
    async fn daily_row(&self, store_id: &str, date: NaiveDate) -> Result<Option<DailyAnalytics>>;

    /// Interactions whose local calendar day falls within the range.
    async fn interactions(&self, store_id: &str, range: DateRange)
        -> Result<Vec<UserInteraction>>;

    /// Most recent interactions, newest first.
    async fn recent_interactions(&self, store_id: &str, limit: usize)
        -> Result<Vec<UserInteraction>>;

    /// Menu item actions within the range, joined with catalog names.
    async fn menu_item_actions(
        &self,
        store_id: &str,
        range: DateRange,
    ) -> Result<Vec<MenuItemActionRecord>>;

    /// Visits started at or after `since`.
    async fn visits_since(&self, store_id: &str, since: DateTime<Utc>) -> Result<Vec<StoreVisit>>;

    /// Page views at or after `since`.
    async fn page_views_since(&self, store_id: &str, since: DateTime<Utc>)
        -> Result<Vec<PageView>>;

    /// Whether the backend is reachable.
    fn is_healthy(&self) -> bool;
}
