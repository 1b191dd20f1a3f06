//! Tests for the dashboard reports.
//!
//! Seeds the in-memory store with rollups and raw events, then reads them
//! back through the `/stores/:store_id/analytics/*` endpoints.

use analytics_core::{
    AnalyticsSummary, CategoryPerformance, DailyAnalytics, InteractionType, MenuItemAction,
    MenuItemPerformance, PeriodComparison, RealTimeAnalytics,
};
use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Days, Duration, Utc};
use integration_tests::{fixtures, setup::TestContext};

fn server(ctx: &TestContext) -> TestServer {
    TestServer::new(ctx.router.clone()).expect("Failed to create test server")
}

/// Test the summary folds today's rollup and interactions
#[tokio::test]
async fn test_summary_for_today() {
    let ctx = TestContext::new();
    let store_id = fixtures::store_id();
    ctx.store.put_daily(fixtures::daily(&store_id, fixtures::today(), 10));
    ctx.store.put_interaction(fixtures::interaction(&store_id, InteractionType::EmailClick, Utc::now()));
    ctx.store.put_interaction(fixtures::interaction(&store_id, InteractionType::EmailClick, Utc::now()));
    ctx.store.put_interaction(fixtures::interaction(&store_id, InteractionType::MapClick, Utc::now()));

    let response = server(&ctx)
        .get(&format!("/stores/{}/analytics/summary", store_id))
        .add_query_param("period", "today")
        .await;
    response.assert_status_ok();

    let summary: AnalyticsSummary = response.json();
    assert_eq!(summary.total_visits, 10);
    assert_eq!(summary.unique_visitors, 10);
    assert_eq!(summary.total_page_views, 20);
    assert_eq!(summary.total_interactions, 2);
    assert_eq!(summary.bounce_rate, 50.0);
    assert_eq!(summary.device_breakdown.desktop, 10);
    assert_eq!(summary.daily_trends.len(), 1);
    assert_eq!(summary.top_interactions[0].interaction_type, "email_click");
    assert_eq!(summary.top_interactions[0].count, 2);
}

/// Test an empty range yields a zeroed summary
#[tokio::test]
async fn test_summary_without_data() {
    let ctx = TestContext::new();

    let response = server(&ctx)
        .get("/stores/unknown-store/analytics/summary")
        .add_query_param("period", "not_a_period")
        .await;
    response.assert_status_ok();

    let summary: AnalyticsSummary = response.json();
    assert_eq!(summary, AnalyticsSummary::default());
}

/// Test rollups outside the resolved range are ignored
#[tokio::test]
async fn test_summary_custom_range() {
    let ctx = TestContext::new();
    let store_id = fixtures::store_id();
    let today = fixtures::today();
    let old = today - Days::new(40);
    ctx.store.put_daily(fixtures::daily(&store_id, old, 7));
    ctx.store.put_daily(fixtures::daily(&store_id, today, 3));

    let response = server(&ctx)
        .get(&format!("/stores/{}/analytics/summary", store_id))
        .add_query_param("period", "custom")
        .add_query_param("start_date", old.to_string())
        .add_query_param("end_date", old.to_string())
        .await;
    response.assert_status_ok();

    let summary: AnalyticsSummary = response.json();
    assert_eq!(summary.total_visits, 7);
    assert_eq!(summary.daily_trends[0].date, old);
}

/// Test menu item and category performance
#[tokio::test]
async fn test_menu_item_and_category_performance() {
    let ctx = TestContext::new();
    let store_id = fixtures::store_id();
    let now = Utc::now();
    ctx.store
        .put_menu_item(&store_id, "item-1", "Flat White", Some(("cat-1", "Coffee")));
    for action in [MenuItemAction::View, MenuItemAction::View, MenuItemAction::Click] {
        ctx.store
            .put_menu_item_action(fixtures::menu_action(&store_id, "item-1", action, now));
    }
    for action in [MenuItemAction::View, MenuItemAction::Click] {
        ctx.store
            .put_menu_item_action(fixtures::menu_action(&store_id, "item-2", action, now));
    }

    let server = server(&ctx);
    let response = server
        .get(&format!("/stores/{}/analytics/menu-items", store_id))
        .add_query_param("period", "today")
        .await;
    response.assert_status_ok();

    let items: Vec<MenuItemPerformance> = response.json();
    assert_eq!(items.len(), 2);
    // item-2 has no catalog entry, so its name falls back to the id
    assert_eq!(items[0].menu_item_name, "item-2");
    assert_eq!(items[0].engagement_rate, 100.0);
    assert_eq!(items[1].menu_item_name, "Flat White");
    assert_eq!(items[1].category_name.as_deref(), Some("Coffee"));
    assert_eq!(items[1].engagement_rate, 50.0);

    let response = server
        .get(&format!("/stores/{}/analytics/categories", store_id))
        .add_query_param("period", "today")
        .await;
    response.assert_status_ok();

    let categories: Vec<CategoryPerformance> = response.json();
    assert_eq!(categories.len(), 1, "uncategorized items are excluded");
    assert_eq!(categories[0].category_name, "Coffee");
    assert_eq!(categories[0].total_views, 2);
    assert_eq!(categories[0].total_clicks, 1);
    assert_eq!(categories[0].items_count, 1);
}

/// Test the real-time snapshot
#[tokio::test]
async fn test_realtime_snapshot() {
    let ctx = TestContext::new();
    let store_id = fixtures::store_id();
    let now = Utc::now();

    ctx.store.put_visit(fixtures::visit(&store_id, "session-a", now - Duration::minutes(5)));
    ctx.store.put_visit(fixtures::visit(&store_id, "session-a", now - Duration::minutes(3)));
    ctx.store.put_visit(fixtures::visit(&store_id, "session-b", now - Duration::minutes(1)));
    ctx.store.put_visit(fixtures::visit(&store_id, "session-c", now - Duration::hours(2)));

    for page in ["menu", "menu", "menu", "store_main"] {
        ctx.store.put_page_view(fixtures::page_view(&store_id, page, now - Duration::minutes(10)));
    }
    ctx.store.put_page_view(fixtures::page_view(&store_id, "about", now - Duration::hours(30)));

    for minutes in 1..=12 {
        ctx.store.put_interaction(fixtures::interaction(
            &store_id,
            InteractionType::ShareClick,
            now - Duration::minutes(minutes),
        ));
    }
    ctx.store.put_daily(fixtures::daily(&store_id, fixtures::today(), 10));

    let response = server(&ctx)
        .get(&format!("/stores/{}/analytics/realtime", store_id))
        .await;
    response.assert_status_ok();

    let realtime: RealTimeAnalytics = response.json();
    assert_eq!(realtime.current_visitors, 2);
    assert_eq!(realtime.today_visits, 10);
    assert_eq!(realtime.today_interactions, 2);
    assert_eq!(realtime.top_pages[0].page_type, "menu");
    assert_eq!(realtime.top_pages[0].views, 3);
    assert!(realtime.top_pages.iter().all(|p| p.page_type != "about"));
    assert_eq!(realtime.recent_interactions.len(), 10);
    assert!(realtime.recent_interactions[0].created_at > realtime.recent_interactions[9].created_at);
}

/// Test the comparison against the preceding period
#[tokio::test]
async fn test_period_comparison() {
    let ctx = TestContext::new();
    let store_id = fixtures::store_id();
    let today = fixtures::today();
    ctx.store.put_daily(fixtures::daily(&store_id, today, 10));
    ctx.store.put_daily(fixtures::daily(&store_id, today - Days::new(10), 5));

    let response = server(&ctx)
        .get(&format!("/stores/{}/analytics/comparison", store_id))
        .add_query_param("period", "last_7_days")
        .await;
    response.assert_status_ok();

    let comparison: PeriodComparison = response.json();
    assert_eq!(comparison.range.days(), comparison.previous_range.days());
    assert_eq!(comparison.current.total_visits, 10);
    assert_eq!(comparison.previous.total_visits, 5);
    assert_eq!(comparison.visits_growth, 100.0);
    assert_eq!(comparison.interactions_growth, 0.0);
}

/// Test JSON export parses back into the seeded rollups
#[tokio::test]
async fn test_export_json() {
    let ctx = TestContext::new();
    let store_id = fixtures::store_id();
    let today = fixtures::today();
    let rows = vec![
        fixtures::daily(&store_id, today - Days::new(1), 4),
        fixtures::daily(&store_id, today, 6),
    ];
    for row in &rows {
        ctx.store.put_daily(row.clone());
    }

    let response = server(&ctx)
        .get(&format!("/stores/{}/analytics/export", store_id))
        .add_query_param("period", "last_7_days")
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.header("content-type").to_str().unwrap(),
        "application/json"
    );

    let exported: Vec<DailyAnalytics> = serde_json::from_str(&response.text()).unwrap();
    assert_eq!(exported, rows);
}

/// Test CSV export is served as a download
#[tokio::test]
async fn test_export_csv_download() {
    let ctx = TestContext::new();
    let store_id = fixtures::store_id();
    ctx.store.put_daily(fixtures::daily(&store_id, fixtures::today(), 6));

    let response = server(&ctx)
        .get(&format!("/stores/{}/analytics/export", store_id))
        .add_query_param("period", "today")
        .add_query_param("format", "csv")
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type").to_str().unwrap(), "text/csv");

    let disposition = response.header("content-disposition");
    let disposition = disposition.to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"analytics-"));
    assert!(disposition.ends_with(".csv\""));

    let body = response.text();
    let mut reader = csv::Reader::from_reader(body.as_bytes());
    assert!(reader.headers().unwrap().iter().any(|h| h == "total_visits"));
    assert_eq!(reader.records().count(), 1);
}

/// Test an unsupported export format is rejected
#[tokio::test]
async fn test_export_unknown_format() {
    let ctx = TestContext::new();

    let response = server(&ctx)
        .get("/stores/store-1/analytics/export")
        .add_query_param("format", "xml")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}

/// Test read failures surface as coded gateway errors
#[tokio::test]
async fn test_read_failure_is_reported() {
    let ctx = TestContext::new();
    ctx.set_read_failure(true);
    let server = server(&ctx);

    for report in ["summary", "menu-items", "categories", "realtime", "comparison", "export"] {
        let response = server
            .get(&format!("/stores/store-1/analytics/{}", report))
            .await;
        response.assert_status(StatusCode::BAD_GATEWAY);

        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "DB_001", "report {}", report);
    }
}

/// Test reports called directly on the service
#[tokio::test]
async fn test_service_export_matches_endpoint() {
    let ctx = TestContext::new();
    let store_id = fixtures::store_id();
    ctx.store.put_daily(fixtures::daily(&store_id, fixtures::today(), 2));

    let options = analytics_core::ExportOptions::new(
        analytics_core::ExportFormat::Csv,
        analytics_core::Period::Today,
    );
    let direct = ctx.analytics.export_analytics(&store_id, &options).await.unwrap();

    let response = server(&ctx)
        .get(&format!("/stores/{}/analytics/export", store_id))
        .add_query_param("period", "today")
        .add_query_param("format", "csv")
        .await;
    assert_eq!(response.text(), direct);
}
