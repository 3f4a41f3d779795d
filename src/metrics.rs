//! Plain-counter metrics for engine observability

use tokio::sync::RwLock;

/// Engine decision counters
#[derive(Debug, Clone, Default)]
pub struct EngineMetrics {
    /// Total authorization requests
    pub total_requests: u64,

    /// Allowed decisions
    pub allowed_decisions: u64,

    /// Denied decisions
    pub denied_decisions: u64,

    /// Requests short-circuited by the administrator override
    pub admin_overrides: u64,

    /// Resolution/data errors
    pub error_count: u64,
}

impl EngineMetrics {
    pub fn allow_rate(&self) -> f64 {
        let total = self.allowed_decisions + self.denied_decisions;
        if total == 0 {
            0.0
        } else {
            self.allowed_decisions as f64 / total as f64
        }
    }
}

/// Thread-safe collector for [`EngineMetrics`]
#[derive(Debug, Default)]
pub struct MetricsCollector {
    inner: RwLock<EngineMetrics>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_request(&self) {
        self.inner.write().await.total_requests += 1;
    }

    pub async fn record_decision(&self, allowed: bool) {
        let mut metrics = self.inner.write().await;
        if allowed {
            metrics.allowed_decisions += 1;
        } else {
            metrics.denied_decisions += 1;
        }
    }

    pub async fn record_admin_override(&self) {
        self.inner.write().await.admin_overrides += 1;
    }

    pub async fn record_error(&self) {
        self.inner.write().await.error_count += 1;
    }

    pub async fn snapshot(&self) -> EngineMetrics {
        self.inner.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counters_and_allow_rate() {
        let collector = MetricsCollector::new();
        collector.record_request().await;
        collector.record_decision(true).await;
        collector.record_request().await;
        collector.record_decision(false).await;
        collector.record_admin_override().await;

        let metrics = collector.snapshot().await;
        assert_eq!(metrics.total_requests, 2);
        assert_eq!(metrics.allowed_decisions, 1);
        assert_eq!(metrics.denied_decisions, 1);
        assert_eq!(metrics.admin_overrides, 1);
        assert!((metrics.allow_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_empty_allow_rate() {
        let collector = MetricsCollector::new();
        assert_eq!(collector.snapshot().await.allow_rate(), 0.0);
    }
}
