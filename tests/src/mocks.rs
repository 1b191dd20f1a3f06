//! Mock implementations for testing.

use std::collections::HashMap;
use std::sync::Arc;

use analytics_core::{
    AnalyticsStore, DailyAnalytics, DateRange, DbErrorCode, Error, MenuItemActionRecord,
    MenuItemAnalytics, PageView, Result, StoreVisit, UserInteraction,
};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

/// Catalog names for a menu item.
#[derive(Debug, Clone)]
struct MenuItemNames {
    name: String,
    category_id: Option<String>,
    category_name: Option<String>,
}

#[derive(Default)]
struct Tables {
    visits: Vec<StoreVisit>,
    page_views: Vec<PageView>,
    interactions: Vec<UserInteraction>,
    menu_item_actions: Vec<MenuItemAnalytics>,
    menu_items: HashMap<(String, String), MenuItemNames>,
    daily: HashMap<(String, NaiveDate), DailyAnalytics>,
}

/// In-memory analytics store.
///
/// Implements the same `AnalyticsStore` trait as `ClickHouseStore`, so the
/// recorder, reporting service and router run their production code paths.
/// Reads and writes can be told to fail independently.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_writes: Arc<Mutex<bool>>,
    fail_reads: Arc<Mutex<bool>>,
}

fn local_day(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Local).date_naive()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every insert and the bounce update fail.
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    /// Make every read fail.
    pub fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.lock() = fail;
    }

    fn check_write(&self) -> Result<()> {
        if *self.fail_writes.lock() {
            return Err(Error::database(DbErrorCode::WriteFailed, "mock store write failure"));
        }
        Ok(())
    }

    fn check_read(&self) -> Result<()> {
        if *self.fail_reads.lock() {
            return Err(Error::database(DbErrorCode::ReadFailed, "mock store read failure"));
        }
        Ok(())
    }

    /// Stores a rollup row, replacing any row for the same store and day.
    pub fn put_daily(&self, row: DailyAnalytics) {
        self.tables
            .lock()
            .daily
            .insert((row.store_id.clone(), row.date), row);
    }

    /// Registers catalog names used by the menu item join.
    pub fn put_menu_item(
        &self,
        store_id: &str,
        menu_item_id: &str,
        name: &str,
        category: Option<(&str, &str)>,
    ) {
        self.tables.lock().menu_items.insert(
            (store_id.to_string(), menu_item_id.to_string()),
            MenuItemNames {
                name: name.to_string(),
                category_id: category.map(|(id, _)| id.to_string()),
                category_name: category.map(|(_, name)| name.to_string()),
            },
        );
    }

    /// Inserts a visit as-is, bypassing the failure switch.
    pub fn put_visit(&self, visit: StoreVisit) {
        self.tables.lock().visits.push(visit);
    }

    /// Inserts a page view as-is, bypassing the failure switch.
    pub fn put_page_view(&self, view: PageView) {
        self.tables.lock().page_views.push(view);
    }

    /// Inserts an interaction as-is, bypassing the failure switch.
    pub fn put_interaction(&self, interaction: UserInteraction) {
        self.tables.lock().interactions.push(interaction);
    }

    /// Inserts a menu item action as-is, bypassing the failure switch.
    pub fn put_menu_item_action(&self, action: MenuItemAnalytics) {
        self.tables.lock().menu_item_actions.push(action);
    }

    pub fn visits(&self) -> Vec<StoreVisit> {
        self.tables.lock().visits.clone()
    }

    pub fn page_views(&self) -> Vec<PageView> {
        self.tables.lock().page_views.clone()
    }

    pub fn stored_interactions(&self) -> Vec<UserInteraction> {
        self.tables.lock().interactions.clone()
    }

    pub fn stored_menu_item_actions(&self) -> Vec<MenuItemAnalytics> {
        self.tables.lock().menu_item_actions.clone()
    }

    /// Total rows across the raw event tables.
    pub fn event_count(&self) -> usize {
        let tables = self.tables.lock();
        tables.visits.len()
            + tables.page_views.len()
            + tables.interactions.len()
            + tables.menu_item_actions.len()
    }
}

#[async_trait]
impl AnalyticsStore for MemoryStore {
    async fn insert_visit(&self, mut visit: StoreVisit) -> Result<StoreVisit> {
        self.check_write()?;
        visit.id = Uuid::new_v4().to_string();
        self.tables.lock().visits.push(visit.clone());
        Ok(visit)
    }

    async fn insert_page_view(&self, mut view: PageView) -> Result<PageView> {
        self.check_write()?;
        view.id = Uuid::new_v4().to_string();
        self.tables.lock().page_views.push(view.clone());
        Ok(view)
    }

    async fn insert_interaction(&self, mut interaction: UserInteraction) -> Result<UserInteraction> {
        self.check_write()?;
        interaction.id = Uuid::new_v4().to_string();
        self.tables.lock().interactions.push(interaction.clone());
        Ok(interaction)
    }

    async fn insert_menu_item_action(&self, mut action: MenuItemAnalytics) -> Result<MenuItemAnalytics> {
        self.check_write()?;
        action.id = Uuid::new_v4().to_string();
        self.tables.lock().menu_item_actions.push(action.clone());
        Ok(action)
    }

    async fn mark_session_engaged(&self, store_id: &str, session_id: &str) -> Result<()> {
        self.check_write()?;
        for visit in self
            .tables
            .lock()
            .visits
            .iter_mut()
            .filter(|v| v.store_id == store_id && v.session_id == session_id)
        {
            visit.is_bounce = false;
        }
        Ok(())
    }

    async fn daily_rows(&self, store_id: &str, range: DateRange) -> Result<Vec<DailyAnalytics>> {
        self.check_read()?;
        let mut rows: Vec<DailyAnalytics> = self
            .tables
            .lock()
            .daily
            .values()
            .filter(|d| d.store_id == store_id && range.contains(d.date))
            .cloned()
            .collect();
        rows.sort_by_key(|d| d.date);
        Ok(rows)
    }

    async fn daily_row(&self, store_id: &str, date: NaiveDate) -> Result<Option<DailyAnalytics>> {
        self.check_read()?;
        Ok(self
            .tables
            .lock()
            .daily
            .get(&(store_id.to_string(), date))
            .cloned())
    }

    async fn interactions(&self, store_id: &str, range: DateRange) -> Result<Vec<UserInteraction>> {
        self.check_read()?;
        Ok(self
            .tables
            .lock()
            .interactions
            .iter()
            .filter(|i| i.store_id == store_id && range.contains(local_day(i.created_at)))
            .cloned()
            .collect())
    }

    async fn recent_interactions(&self, store_id: &str, limit: usize) -> Result<Vec<UserInteraction>> {
        self.check_read()?;
        let mut rows: Vec<UserInteraction> = self
            .tables
            .lock()
            .interactions
            .iter()
            .filter(|i| i.store_id == store_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn menu_item_actions(
        &self,
        store_id: &str,
        range: DateRange,
    ) -> Result<Vec<MenuItemActionRecord>> {
        self.check_read()?;
        let tables = self.tables.lock();
        Ok(tables
            .menu_item_actions
            .iter()
            .filter(|a| a.store_id == store_id && range.contains(local_day(a.created_at)))
            .map(|a| {
                let names = tables
                    .menu_items
                    .get(&(a.store_id.clone(), a.menu_item_id.clone()));
                MenuItemActionRecord {
                    action: a.clone(),
                    menu_item_name: names
                        .map(|n| n.name.clone())
                        .unwrap_or_else(|| a.menu_item_id.clone()),
                    category_id: names.and_then(|n| n.category_id.clone()),
                    category_name: names.and_then(|n| n.category_name.clone()),
                }
            })
            .collect())
    }

    async fn visits_since(&self, store_id: &str, since: DateTime<Utc>) -> Result<Vec<StoreVisit>> {
        self.check_read()?;
        Ok(self
            .tables
            .lock()
            .visits
            .iter()
            .filter(|v| v.store_id == store_id && v.visit_timestamp >= since)
            .cloned()
            .collect())
    }

    async fn page_views_since(&self, store_id: &str, since: DateTime<Utc>) -> Result<Vec<PageView>> {
        self.check_read()?;
        Ok(self
            .tables
            .lock()
            .page_views
            .iter()
            .filter(|v| v.store_id == store_id && v.viewed_at >= since)
            .cloned()
            .collect())
    }

    fn is_healthy(&self) -> bool {
        !*self.fail_reads.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn test_memory_store_assigns_ids() {
        let store = MemoryStore::new();
        let visit = store
            .insert_visit(fixtures::visit("store-1", "session-1", Utc::now()))
            .await
            .unwrap();
        assert!(!visit.id.is_empty());
        assert_eq!(store.visits().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_failure_switches() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let err = store
            .insert_visit(fixtures::visit("store-1", "session-1", Utc::now()))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), Some("DB_002"));

        store.set_fail_reads(true);
        assert!(!store.is_healthy());
        assert!(store.recent_interactions("store-1", 10).await.is_err());
    }

    #[tokio::test]
    async fn test_mark_session_engaged_scoped_to_store() {
        let store = MemoryStore::new();
        store.put_visit(fixtures::visit("store-1", "session-1", Utc::now()));
        store.put_visit(fixtures::visit("store-2", "session-1", Utc::now()));

        store.mark_session_engaged("store-1", "session-1").await.unwrap();
        let visits = store.visits();
        assert!(!visits[0].is_bounce);
        assert!(visits[1].is_bounce);
    }

    #[test]
    fn test_daily_rows_replace_per_day() {
        let store = MemoryStore::new();
        let today = Local::now().date_naive();
        store.put_daily(fixtures::daily("store-1", today, 5));
        store.put_daily(fixtures::daily("store-1", today, 9));
        assert_eq!(store.tables.lock().daily.len(), 1);
    }
}
