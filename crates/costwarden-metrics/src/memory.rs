use crate::error::{MetricError, Result};
use crate::{MetricKind, MetricSource};
use async_trait::async_trait;
use costwarden_common::types::ResourceKind;
use std::collections::{HashMap, HashSet};

/// Map-backed [`MetricSource`] for tests and demos.
///
/// Readings missing from the map yield `0.0`, matching the
/// no-datapoints contract of real providers. Individual resources can be
/// marked as failing to exercise per-resource failure isolation.
#[derive(Default)]
pub struct InMemoryMetricSource {
    readings: HashMap<(String, MetricKind), f64>,
    failing: HashSet<String>,
}

impl InMemoryMetricSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reading(
        mut self,
        resource_id: impl Into<String>,
        metric: MetricKind,
        value: f64,
    ) -> Self {
        self.readings.insert((resource_id.into(), metric), value);
        self
    }

    /// Every fetch for `resource_id` will fail with a provider error.
    pub fn with_failure(mut self, resource_id: impl Into<String>) -> Self {
        self.failing.insert(resource_id.into());
        self
    }
}

#[async_trait]
impl MetricSource for InMemoryMetricSource {
    async fn fetch(
        &self,
        resource_id: &str,
        _kind: ResourceKind,
        metric: MetricKind,
        _lookback_hours: i64,
    ) -> Result<f64> {
        if self.failing.contains(resource_id) {
            return Err(MetricError::Provider {
                message: format!("injected failure for {resource_id}"),
            });
        }
        Ok(self
            .readings
            .get(&(resource_id.to_string(), metric))
            .copied()
            .unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_readings_yield_zero() {
        let source = InMemoryMetricSource::new();
        let value = source
            .fetch("i-0abc", ResourceKind::Ec2, MetricKind::CpuUtilization, 24)
            .await
            .expect("fetch should succeed");
        assert_eq!(value, 0.0);
    }

    #[tokio::test]
    async fn returns_configured_readings() {
        let source = InMemoryMetricSource::new()
            .with_reading("i-0abc", MetricKind::CpuUtilization, 2.5)
            .with_reading("i-0abc", MetricKind::NetworkIn, 1024.0);
        let cpu = source
            .fetch("i-0abc", ResourceKind::Ec2, MetricKind::CpuUtilization, 24)
            .await
            .expect("fetch should succeed");
        assert_eq!(cpu, 2.5);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_provider_errors() {
        let source = InMemoryMetricSource::new().with_failure("i-0bad");
        let err = source
            .fetch("i-0bad", ResourceKind::Ec2, MetricKind::CpuUtilization, 24)
            .await
            .expect_err("fetch should fail");
        assert!(matches!(err, MetricError::Provider { .. }));
    }
}
