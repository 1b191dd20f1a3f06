//! Tests for the tracking write path.
//!
//! Covers the `Tracker` API and the `/track/*` endpoints against the
//! in-memory store.

use analytics_core::{DeviceType, InteractionType, MenuItemAction, PLACEHOLDER_ID};
use axum::http::StatusCode;
use axum_test::TestServer;
use integration_tests::{fixtures, setup::TestContext};
use serde_json::json;

/// Test a full storefront session through the tracker
#[tokio::test]
async fn test_tracker_session_flow() {
    let ctx = TestContext::new();
    let store_id = fixtures::store_id();
    let tracker = ctx.tracker().with_user_agent(fixtures::IPHONE_UA);

    let visit = tracker.track_store_visit(&store_id).await;
    assert_ne!(visit.id, PLACEHOLDER_ID);
    assert_eq!(visit.device_type, DeviceType::Mobile);
    assert!(visit.is_bounce);

    let view = tracker.track_page_view(&store_id, "menu").await;
    assert_eq!(view.page_type, "menu");
    assert_eq!(view.session_id, tracker.identity().session_id);

    let action = tracker
        .track_menu_item_analytics(&store_id, "item-1", MenuItemAction::Hover, Some(4))
        .await;
    assert_eq!(action.time_spent, Some(4));

    assert_eq!(ctx.store.event_count(), 3);
    assert!(ctx.store.visits()[0].is_bounce, "no interaction yet");
}

/// Test that the first interaction clears the session's bounce flag
#[tokio::test]
async fn test_interaction_clears_bounce() {
    let ctx = TestContext::new();
    let store_id = fixtures::store_id();
    let tracker = ctx.tracker();
    let other = ctx.tracker();

    tracker.track_store_visit(&store_id).await;
    other.track_store_visit(&store_id).await;

    let interaction = tracker
        .track_user_interaction(
            &store_id,
            InteractionType::WhatsappClick,
            Some("contact"),
            Some(json!({ "source": "footer" })),
        )
        .await;
    assert_ne!(interaction.id, PLACEHOLDER_ID);
    assert_eq!(interaction.target_id.as_deref(), Some("contact"));

    let visits = ctx.store.visits();
    let engaged = visits
        .iter()
        .find(|v| v.session_id == tracker.identity().session_id)
        .unwrap();
    let bounced = visits
        .iter()
        .find(|v| v.session_id == other.identity().session_id)
        .unwrap();
    assert!(!engaged.is_bounce);
    assert!(bounced.is_bounce);
}

/// Test that a backend outage yields placeholders instead of errors
#[tokio::test]
async fn test_tracker_returns_placeholders_on_failure() {
    let ctx = TestContext::new();
    let store_id = fixtures::store_id();
    let tracker = ctx.tracker().with_user_agent(fixtures::IPAD_UA);
    ctx.set_write_failure(true);

    let visit = tracker.track_store_visit(&store_id).await;
    assert_eq!(visit.id, PLACEHOLDER_ID);
    assert_eq!(visit.store_id, store_id);
    assert_eq!(visit.device_type, DeviceType::Tablet);

    let interaction = tracker
        .track_user_interaction(&store_id, InteractionType::PhoneClick, None, None)
        .await;
    assert_eq!(interaction.id, PLACEHOLDER_ID);
    assert_eq!(interaction.interaction_type, InteractionType::PhoneClick);

    assert_eq!(ctx.store.event_count(), 0);
}

/// Test fire-and-forget tracking
#[tokio::test]
async fn test_spawned_tracking_completes() {
    let ctx = TestContext::new();
    let store_id = fixtures::store_id();
    let tracker = ctx.tracker();

    let handles = vec![
        tracker.spawn_page_view(&store_id, "store_main"),
        tracker.spawn_page_view(&store_id, "menu"),
    ];
    for handle in handles {
        let view = handle.await.expect("tracking task panicked");
        assert_ne!(view.id, PLACEHOLDER_ID);
    }
    let visit = tracker.spawn_store_visit(&store_id).await.unwrap();
    assert_eq!(visit.store_id, store_id);

    assert_eq!(ctx.store.page_views().len(), 2);
    assert_eq!(ctx.store.visits().len(), 1);
}

/// Test fire-and-forget interactions and menu item actions
#[tokio::test]
async fn test_spawned_interaction_and_menu_action_complete() {
    let ctx = TestContext::new();
    let store_id = fixtures::store_id();
    let tracker = ctx.tracker();

    tracker.spawn_store_visit(&store_id).await.unwrap();

    let interaction = tracker
        .spawn_user_interaction(
            &store_id,
            InteractionType::EmailClick,
            Some("contact"),
            Some(json!({ "source": "header" })),
        )
        .await
        .expect("tracking task panicked");
    assert_ne!(interaction.id, PLACEHOLDER_ID);
    assert_eq!(interaction.target_id.as_deref(), Some("contact"));
    assert_eq!(interaction.session_id, tracker.identity().session_id);
    assert!(!ctx.store.visits()[0].is_bounce);

    let action = tracker
        .spawn_menu_item_analytics(&store_id, "item-7", MenuItemAction::Hover, Some(12))
        .await
        .expect("tracking task panicked");
    assert_ne!(action.id, PLACEHOLDER_ID);
    assert_eq!(action.menu_item_id, "item-7");
    assert_eq!(action.action_type, MenuItemAction::Hover);
    assert_eq!(action.time_spent, Some(12));

    assert_eq!(ctx.store.stored_interactions().len(), 1);
    let stored = ctx.store.stored_menu_item_actions();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].visitor_id, tracker.identity().visitor_id);
}

/// Test spawned tracking still resolves to placeholders during an outage
#[tokio::test]
async fn test_spawned_tracking_placeholder_on_failure() {
    let ctx = TestContext::new();
    let store_id = fixtures::store_id();
    let tracker = ctx.tracker();
    ctx.set_write_failure(true);

    let interaction = tracker
        .spawn_user_interaction(&store_id, InteractionType::PhoneClick, None, None)
        .await
        .unwrap();
    assert_eq!(interaction.id, PLACEHOLDER_ID);

    let action = tracker
        .spawn_menu_item_analytics(&store_id, "item-7", MenuItemAction::Click, None)
        .await
        .unwrap();
    assert_eq!(action.id, PLACEHOLDER_ID);
    assert_eq!(action.store_id, store_id);

    assert_eq!(ctx.store.event_count(), 0);
}

/// Test POST /track/visit enriches from the User-Agent header
#[tokio::test]
async fn test_track_visit_endpoint() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let identity = fixtures::identity();
    let store_id = fixtures::store_id();

    let response = server
        .post("/track/visit")
        .add_header("user-agent", fixtures::CHROME_MAC_UA)
        .add_header("referer", "https://search.example.com/")
        .json(&fixtures::visit_body(&identity, &store_id))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_ne!(body["id"], PLACEHOLDER_ID);
    assert_eq!(body["device_type"], "desktop");
    assert_eq!(body["referrer"], "https://search.example.com/");
    assert_eq!(body["visitor_id"], identity.visitor_id.as_str());
    assert_eq!(body["is_bounce"], true);

    assert_eq!(ctx.store.visits().len(), 1);
}

/// Test every tracking endpoint persists its event
#[tokio::test]
async fn test_track_endpoints_persist_events() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let identity = fixtures::identity();
    let store_id = fixtures::store_id();

    server
        .post("/track/visit")
        .json(&fixtures::visit_body(&identity, &store_id))
        .await
        .assert_status_ok();
    server
        .post("/track/page-view")
        .json(&fixtures::page_view_body(&identity, &store_id, "menu"))
        .await
        .assert_status_ok();

    let response = server
        .post("/track/interaction")
        .json(&fixtures::interaction_body(&identity, &store_id, "email_click"))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["interaction_type"], "email_click");
    assert_eq!(body["data"]["source"], "header");

    let response = server
        .post("/track/menu-item")
        .json(&fixtures::menu_item_body(&identity, &store_id, "item-7", "share"))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["menu_item_id"], "item-7");
    assert_eq!(body["action_type"], "share");

    assert_eq!(ctx.store.event_count(), 4);
    assert!(!ctx.store.visits()[0].is_bounce);
}

/// Test a failing backend still answers 200 with a placeholder
#[tokio::test]
async fn test_track_endpoint_placeholder_on_failure() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    ctx.set_write_failure(true);

    let identity = fixtures::identity();
    let response = server
        .post("/track/page-view")
        .json(&fixtures::page_view_body(&identity, "store-1", "menu"))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], PLACEHOLDER_ID);
    assert_eq!(body["page_type"], "menu");
}

/// Test an invalid draft is swallowed like a backend failure
#[tokio::test]
async fn test_track_invalid_draft_returns_placeholder() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");
    let identity = fixtures::identity();

    let response = server
        .post("/track/visit")
        .json(&fixtures::visit_body(&identity, ""))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], PLACEHOLDER_ID);
    assert_eq!(ctx.store.event_count(), 0);
}

/// Test a missing identity is rejected
#[tokio::test]
async fn test_track_rejects_empty_identity() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("Failed to create test server");

    let response = server
        .post("/track/visit")
        .json(&json!({ "visitor_id": "", "session_id": "session-1", "store_id": "store-1" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_001");
    assert_eq!(ctx.store.event_count(), 0);
}
