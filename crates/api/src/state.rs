//! Application state shared across handlers.

use std::sync::Arc;

use analytics_core::AnalyticsStore;
use recorder::EventRecorder;
use reporting::AnalyticsService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Backing store (ClickHouse in production, in-memory in tests)
    pub store: Arc<dyn AnalyticsStore>,
    /// Best-effort write path
    pub recorder: EventRecorder,
    /// Dashboard read path
    pub analytics: AnalyticsService,
}

impl AppState {
    pub fn new(store: Arc<dyn AnalyticsStore>) -> Self {
        Self {
            recorder: EventRecorder::new(store.clone()),
            analytics: AnalyticsService::new(store.clone()),
            store,
        }
    }
}
