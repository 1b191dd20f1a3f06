//! Core types, period resolution, and aggregation for store analytics.

pub mod aggregate;
pub mod entities;
pub mod error;
pub mod export;
pub mod identity;
pub mod period;
pub mod store;
pub mod summary;

pub use entities::*;
pub use error::{DbErrorCode, Error, Result, ValidationErrorCode};
pub use export::{ExportFormat, ExportOptions};
pub use identity::IdentityContext;
pub use period::{resolve_range, resolve_range_at, DateRange, Period};
pub use store::AnalyticsStore;
pub use summary::*;
