//! Health tracking for the hiring service
//!
//! Components report their own status; readiness additionally requires a
//! loaded model.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Operational with reduced capability, e.g. serving fallback scores
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        matches!(self, ComponentStatus::Healthy | ComponentStatus::Degraded)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn with(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::with(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::with(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::with(ComponentStatus::Unhealthy, Some(message.into()))
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub model_loaded: bool,
    pub model_version: Option<String>,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status across all components
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        let mut has_degraded = false;
        for health in components.values() {
            match health.status {
                ComponentStatus::Unhealthy => return ComponentStatus::Unhealthy,
                ComponentStatus::Degraded => has_degraded = true,
                ComponentStatus::Healthy => {}
            }
        }
        if has_degraded {
            ComponentStatus::Degraded
        } else {
            ComponentStatus::Healthy
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub mod components {
    pub const MODEL: &str = "model";
    pub const TRAINER: &str = "trainer";
}

#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn update(&self, name: &str, health: ComponentHealth) {
        self.components.write().await.insert(name.to_string(), health);
    }

    pub async fn set_healthy(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::degraded(message)).await;
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::unhealthy(message)).await;
    }

    /// Health report; model state comes from the caller's model handle
    pub async fn health(&self, model_version: Option<String>) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse {
            status,
            model_loaded: model_version.is_some(),
            model_version,
            components,
        }
    }

    pub async fn readiness(&self, model_loaded: bool) -> ReadinessResponse {
        let components = self.components.read().await;
        let status = HealthResponse::compute_status(&components);

        let reason = if !model_loaded {
            Some("No trained model loaded")
        } else if !status.is_operational() {
            Some("Critical component unhealthy")
        } else {
            None
        };
        ReadinessResponse {
            ready: reason.is_none(),
            reason: reason.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_state() {
        let registry = HealthRegistry::new();
        let health = registry.health(None).await;
        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(!health.model_loaded);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn test_model_version_marks_loaded() {
        let registry = HealthRegistry::new();
        registry.register(components::MODEL).await;
        let health = registry.health(Some("rf-0123456789ab".into())).await;
        assert!(health.model_loaded);
        assert_eq!(health.components[components::MODEL].status, ComponentStatus::Healthy);
    }

    #[tokio::test]
    async fn test_worst_status_wins() {
        let registry = HealthRegistry::new();
        registry.register(components::MODEL).await;
        registry.register(components::TRAINER).await;

        registry.set_degraded(components::MODEL, "serving fallback scores").await;
        assert_eq!(registry.health(None).await.status, ComponentStatus::Degraded);

        registry.set_unhealthy(components::TRAINER, "training data unreadable").await;
        assert_eq!(registry.health(None).await.status, ComponentStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_readiness_requires_model() {
        let registry = HealthRegistry::new();
        let readiness = registry.readiness(false).await;
        assert!(!readiness.ready);
        assert!(readiness.reason.is_some());

        assert!(registry.readiness(true).await.ready);
    }

    #[tokio::test]
    async fn test_readiness_not_ready_when_unhealthy() {
        let registry = HealthRegistry::new();
        registry.register(components::MODEL).await;
        registry.set_unhealthy(components::MODEL, "artifact corrupt").await;
        assert!(!registry.readiness(true).await.ready);
    }
}
