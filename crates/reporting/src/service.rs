//! Reporting facade over an [`AnalyticsStore`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use analytics_core::aggregate::{
    category_performance, growth_rate, menu_item_performance, rank_counts, summarize,
};
use analytics_core::export::export_rows;
use analytics_core::{
    resolve_range, AnalyticsFilters, AnalyticsStore, AnalyticsSummary, CategoryPerformance,
    DateRange, ExportOptions, MenuItemPerformance, PageCount, PeriodComparison, PeriodTotals,
    RealTimeAnalytics, Result,
};
use chrono::{DateTime, Duration, Local, Utc};
use telemetry::metrics;
use tracing::{debug, warn};

/// Minutes in which a session counts as a current visitor.
pub const REALTIME_WINDOW_MINUTES: i64 = 30;

/// Hours covered by the real-time top pages ranking.
pub const TOP_PAGES_WINDOW_HOURS: i64 = 24;

/// Number of interactions in the real-time feed.
pub const RECENT_INTERACTIONS: usize = 10;

/// Number of page types in the real-time ranking.
pub const TOP_PAGES: usize = 5;

/// Dashboard queries for a store.
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn AnalyticsStore>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn AnalyticsStore>) -> Self {
        Self { store }
    }

    fn range(filters: &AnalyticsFilters) -> DateRange {
        resolve_range(filters.period, filters.start_date, filters.end_date)
    }

    pub async fn get_analytics_summary(
        &self,
        store_id: &str,
        filters: &AnalyticsFilters,
    ) -> Result<AnalyticsSummary> {
        let range = Self::range(filters);
        observe("summary", store_id, self.summary_for(store_id, range)).await
    }

    async fn summary_for(&self, store_id: &str, range: DateRange) -> Result<AnalyticsSummary> {
        let daily = self.store.daily_rows(store_id, range).await?;
        let interactions = self.store.interactions(store_id, range).await?;
        debug!(
            store_id = store_id,
            range = %range,
            days = daily.len(),
            interactions = interactions.len(),
            "Folding summary"
        );
        Ok(summarize(&daily, &interactions))
    }

    pub async fn get_menu_item_performance(
        &self,
        store_id: &str,
        filters: &AnalyticsFilters,
    ) -> Result<Vec<MenuItemPerformance>> {
        let range = Self::range(filters);
        observe("menu_items", store_id, async {
            let rows = self.store.menu_item_actions(store_id, range).await?;
            Ok(menu_item_performance(&rows))
        })
        .await
    }

    pub async fn get_category_performance(
        &self,
        store_id: &str,
        filters: &AnalyticsFilters,
    ) -> Result<Vec<CategoryPerformance>> {
        let range = Self::range(filters);
        observe("categories", store_id, async {
            let rows = self.store.menu_item_actions(store_id, range).await?;
            Ok(category_performance(&rows))
        })
        .await
    }

    pub async fn get_real_time_analytics(&self, store_id: &str) -> Result<RealTimeAnalytics> {
        self.get_real_time_analytics_at(store_id, Utc::now()).await
    }

    /// Real-time snapshot as seen at `now`. Reads raw rows, not rollups.
    pub async fn get_real_time_analytics_at(
        &self,
        store_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RealTimeAnalytics> {
        observe("realtime", store_id, async {
            let visits = self
                .store
                .visits_since(store_id, now - Duration::minutes(REALTIME_WINDOW_MINUTES))
                .await?;
            let current_visitors = visits
                .iter()
                .map(|v| v.session_id.as_str())
                .collect::<HashSet<_>>()
                .len() as u64;

            let today = now.with_timezone(&Local).date_naive();
            let (today_visits, today_interactions) = match self.store.daily_row(store_id, today).await? {
                Some(row) => (row.total_visits, row.total_interactions()),
                None => (0, 0),
            };

            let recent_interactions = self
                .store
                .recent_interactions(store_id, RECENT_INTERACTIONS)
                .await?;

            let views = self
                .store
                .page_views_since(store_id, now - Duration::hours(TOP_PAGES_WINDOW_HOURS))
                .await?;
            let top_pages = rank_counts(views.iter().map(|v| v.page_type.as_str()), TOP_PAGES)
                .into_iter()
                .map(|(page_type, views)| PageCount {
                    page_type: page_type.to_string(),
                    views,
                })
                .collect();

            Ok(RealTimeAnalytics {
                current_visitors,
                today_visits,
                today_interactions,
                top_pages,
                recent_interactions,
            })
        })
        .await
    }

    /// Serializes the range's daily rollups as JSON or CSV.
    pub async fn export_analytics(&self, store_id: &str, options: &ExportOptions) -> Result<String> {
        let filters = options.filters();
        let range = Self::range(&filters);
        let body = observe("export", store_id, async {
            let rows = self.store.daily_rows(store_id, range).await?;
            debug!(store_id = store_id, range = %range, rows = rows.len(), format = %options.format, "Exporting");
            export_rows(&rows, options.format)
        })
        .await?;

        metrics().exports.inc();
        Ok(body)
    }

    /// Current range against the preceding range of the same length.
    pub async fn get_period_comparison(
        &self,
        store_id: &str,
        filters: &AnalyticsFilters,
    ) -> Result<PeriodComparison> {
        let range = Self::range(filters);

        observe("comparison", store_id, async {
            let previous_range = range.previous()?;
            let current = self.summary_for(store_id, range).await?;
            let previous_daily = self.store.daily_rows(store_id, previous_range).await?;
            let previous = PeriodTotals::from(&summarize(&previous_daily, &[]));

            Ok(PeriodComparison {
                range,
                previous_range,
                visits_growth: growth_rate(current.total_visits, previous.total_visits),
                page_views_growth: growth_rate(current.total_page_views, previous.total_page_views),
                interactions_growth: growth_rate(
                    current.total_interactions,
                    previous.total_interactions,
                ),
                current,
                previous,
            })
        })
        .await
    }
}

/// Times a report and logs its failure before handing it back.
async fn observe<T, F>(report: &'static str, store_id: &str, fut: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    let start = Instant::now();
    let result = fut.await;
    metrics().report_latency_ms.observe_since(start);

    if let Err(ref e) = result {
        warn!(
            report = report,
            store_id = store_id,
            code = e.error_code().unwrap_or("-"),
            error = %e,
            "Report failed"
        );
    }
    result
}
