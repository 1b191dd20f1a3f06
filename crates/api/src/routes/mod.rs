//! API routes.

pub mod analytics;
pub mod health;
pub mod track;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let track = Router::new()
        .route("/visit", post(track::visit_handler))
        .route("/page-view", post(track::page_view_handler))
        .route("/interaction", post(track::interaction_handler))
        .route("/menu-item", post(track::menu_item_handler));

    let analytics = Router::new()
        .route("/summary", get(analytics::summary_handler))
        .route("/menu-items", get(analytics::menu_items_handler))
        .route("/categories", get(analytics::categories_handler))
        .route("/realtime", get(analytics::realtime_handler))
        .route("/comparison", get(analytics::comparison_handler))
        .route("/export", get(analytics::export_handler));

    Router::new()
        .nest("/track", track)
        .nest("/stores/:store_id/analytics", analytics)
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}
