//! Read path of the analytics pipeline.
//!
//! Unlike the recorder, every backend failure here reaches the caller.

pub mod service;

pub use service::{
    AnalyticsService, REALTIME_WINDOW_MINUTES, RECENT_INTERACTIONS, TOP_PAGES, TOP_PAGES_WINDOW_HOURS,
};
