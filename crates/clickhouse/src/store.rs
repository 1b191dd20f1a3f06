//! `AnalyticsStore` backed by ClickHouse.

use analytics_core::{
    AnalyticsStore, DailyAnalytics, DateRange, MenuItemActionRecord, MenuItemAnalytics, PageView,
    Result, StoreVisit, UserInteraction,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use telemetry::{health, metrics};
use tracing::debug;
use uuid::Uuid;

use crate::client::ClickHouseClient;
use crate::insert::{insert_event, insert_rows};
use crate::query;
use crate::rows::{MenuItemAnalyticsRow, PageViewRow, StoreVisitRow, UserInteractionRow};
use crate::schema::{MENU_ITEM_ANALYTICS, PAGE_VIEWS, STORE_VISITS, USER_INTERACTIONS};

/// Analytics persistence on ClickHouse.
#[derive(Clone)]
pub struct ClickHouseStore {
    client: ClickHouseClient,
}

impl ClickHouseStore {
    pub fn new(client: ClickHouseClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ClickHouseClient {
        &self.client
    }
}

fn assign_id(id: &mut String) {
    *id = Uuid::new_v4().to_string();
}

#[async_trait]
impl AnalyticsStore for ClickHouseStore {
    async fn insert_visit(&self, mut visit: StoreVisit) -> Result<StoreVisit> {
        assign_id(&mut visit.id);
        insert_event(&self.client, STORE_VISITS, &StoreVisitRow::from(&visit)).await?;
        Ok(visit)
    }

    async fn insert_page_view(&self, mut view: PageView) -> Result<PageView> {
        assign_id(&mut view.id);
        insert_event(&self.client, PAGE_VIEWS, &PageViewRow::from(&view)).await?;
        Ok(view)
    }

    async fn insert_interaction(&self, mut interaction: UserInteraction) -> Result<UserInteraction> {
        assign_id(&mut interaction.id);
        let row = UserInteractionRow::try_from_interaction(&interaction)?;
        insert_event(&self.client, USER_INTERACTIONS, &row).await?;
        Ok(interaction)
    }

    async fn insert_menu_item_action(
        &self,
        mut action: MenuItemAnalytics,
    ) -> Result<MenuItemAnalytics> {
        assign_id(&mut action.id);
        insert_event(&self.client, MENU_ITEM_ANALYTICS, &MenuItemAnalyticsRow::from(&action))
            .await?;
        Ok(action)
    }

    async fn mark_session_engaged(&self, store_id: &str, session_id: &str) -> Result<()> {
        let bounced: Vec<StoreVisitRow> = self
            .client
            .read(
                "bounced visits",
                self.client
                    .inner()
                    .query(
                        "SELECT ?fields FROM store_visits FINAL \
                         WHERE store_id = ? AND session_id = ? AND is_bounce = 1",
                    )
                    .bind(store_id)
                    .bind(session_id)
                    .fetch_all(),
            )
            .await?;
        if bounced.is_empty() {
            return Ok(());
        }

        // Superseding copies; FINAL reads keep only the newest version per visit.
        let engaged: Vec<StoreVisitRow> = bounced
            .into_iter()
            .map(|row| StoreVisitRow { is_bounce: 0, ..row })
            .collect();
        let cleared = insert_rows(&self.client, STORE_VISITS, &engaged).await?;

        metrics().bounce_updates.inc();
        debug!(
            store_id = store_id,
            session_id = session_id,
            visits = cleared,
            "Cleared bounce flag"
        );
        Ok(())
    }

    async fn daily_rows(&self, store_id: &str, range: DateRange) -> Result<Vec<DailyAnalytics>> {
        query::daily_rows(&self.client, store_id, range).await
    }

    async fn daily_row(&self, store_id: &str, date: NaiveDate) -> Result<Option<DailyAnalytics>> {
        query::daily_row(&self.client, store_id, date).await
    }

    async fn interactions(
        &self,
        store_id: &str,
        range: DateRange,
    ) -> Result<Vec<UserInteraction>> {
        query::interactions(&self.client, store_id, range).await
    }

    async fn recent_interactions(
        &self,
        store_id: &str,
        limit: usize,
    ) -> Result<Vec<UserInteraction>> {
        query::recent_interactions(&self.client, store_id, limit).await
    }

    async fn menu_item_actions(
        &self,
        store_id: &str,
        range: DateRange,
    ) -> Result<Vec<MenuItemActionRecord>> {
        query::menu_item_actions(&self.client, store_id, range).await
    }

    async fn visits_since(&self, store_id: &str, since: DateTime<Utc>) -> Result<Vec<StoreVisit>> {
        query::visits_since(&self.client, store_id, since).await
    }

    async fn page_views_since(&self, store_id: &str, since: DateTime<Utc>) -> Result<Vec<PageView>> {
        query::page_views_since(&self.client, store_id, since).await
    }

    fn is_healthy(&self) -> bool {
        health().clickhouse.is_healthy()
    }
}
