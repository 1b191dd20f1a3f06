//! Component health for the analytics service.
//!
//! The only dependency is ClickHouse. Tracking keeps answering (with
//! placeholders) while it is down, so an outage after a successful start
//! reports `degraded`, and only a store that never answered is `unhealthy`.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        }
    }
}

/// Health of one dependency, updated by its periodic check.
#[derive(Debug)]
pub struct ComponentHealth {
    name: &'static str,
    healthy: AtomicBool,
    message: RwLock<Option<String>>,
    last_healthy_at: RwLock<Option<DateTime<Utc>>>,
}

impl ComponentHealth {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            healthy: AtomicBool::new(false),
            message: RwLock::new(None),
            last_healthy_at: RwLock::new(None),
        }
    }

    pub fn set_healthy(&self) {
        self.healthy.store(true, Ordering::Relaxed);
        *self.message.write() = None;
        *self.last_healthy_at.write() = Some(Utc::now());
    }

    pub fn set_unhealthy(&self, msg: impl Into<String>) {
        self.healthy.store(false, Ordering::Relaxed);
        *self.message.write() = Some(msg.into());
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last failure message, cleared on recovery.
    pub fn message(&self) -> Option<String> {
        self.message.read().clone()
    }

    pub fn last_healthy_at(&self) -> Option<DateTime<Utc>> {
        *self.last_healthy_at.read()
    }

    fn status(&self) -> HealthStatus {
        if self.is_healthy() {
            HealthStatus::Healthy
        } else if self.last_healthy_at().is_some() {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub components: Vec<ComponentHealthReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealthReport {
    pub name: String,
    pub status: HealthStatus,
    pub message: Option<String>,
    pub last_healthy_at: Option<DateTime<Utc>>,
}

impl From<&ComponentHealth> for ComponentHealthReport {
    fn from(component: &ComponentHealth) -> Self {
        Self {
            name: component.name().to_string(),
            status: component.status(),
            message: component.message(),
            last_healthy_at: component.last_healthy_at(),
        }
    }
}

pub struct HealthRegistry {
    pub clickhouse: ComponentHealth,
}

impl HealthRegistry {
    pub const fn new() -> Self {
        Self {
            clickhouse: ComponentHealth::new("clickhouse"),
        }
    }

    pub fn report(&self) -> HealthReport {
        HealthReport {
            status: self.clickhouse.status(),
            components: vec![ComponentHealthReport::from(&self.clickhouse)],
        }
    }

    /// Reports can only be served once the store answers.
    pub fn is_ready(&self) -> bool {
        self.clickhouse.is_healthy()
    }

    /// The process is alive whenever it can answer at all.
    pub fn is_alive(&self) -> bool {
        true
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub static HEALTH: HealthRegistry = HealthRegistry::new();

/// Get the global health registry.
pub fn health() -> &'static HealthRegistry {
    &HEALTH
}
