//! Write path of the analytics pipeline.
//!
//! Every public recording call succeeds from the caller's point of view.
//! Failures are logged and counted, and the caller receives a placeholder
//! record whose id is [`analytics_core::PLACEHOLDER_ID`].

pub mod enrichment;
pub mod recorder;
pub mod tracker;

pub use enrichment::{DeviceClassifier, DeviceInfo};
pub use recorder::EventRecorder;
pub use tracker::Tracker;
