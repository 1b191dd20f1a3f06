//! Telemetry for the catalog analytics service.
//!
//! In-process metrics, component health, and tracing subscriber setup.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
