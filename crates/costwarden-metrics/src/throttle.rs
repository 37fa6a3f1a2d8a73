use crate::error::{MetricError, Result};
use crate::{MetricKind, MetricSource};
use async_trait::async_trait;
use costwarden_common::types::ResourceKind;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;

/// Decorator that bounds in-flight fetches against an inner source and
/// imposes a per-fetch timeout.
///
/// Metric fetches are blocking I/O against a remote provider; the
/// semaphore keeps concurrent fetch counts within the provider's rate
/// limits no matter how many resources the engines evaluate in parallel.
pub struct ThrottledSource {
    inner: Arc<dyn MetricSource>,
    permits: Arc<Semaphore>,
    fetch_timeout: Duration,
}

impl ThrottledSource {
    pub fn new(inner: Arc<dyn MetricSource>, concurrency: usize, fetch_timeout: Duration) -> Self {
        Self {
            inner,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            fetch_timeout,
        }
    }
}

#[async_trait]
impl MetricSource for ThrottledSource {
    async fn fetch(
        &self,
        resource_id: &str,
        kind: ResourceKind,
        metric: MetricKind,
        lookback_hours: i64,
    ) -> Result<f64> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| MetricError::Cancelled)?;

        match timeout(
            self.fetch_timeout,
            self.inner.fetch(resource_id, kind, metric, lookback_hours),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    resource_id,
                    metric = %metric,
                    timeout_secs = self.fetch_timeout.as_secs(),
                    "metric fetch timed out"
                );
                Err(MetricError::Timeout {
                    secs: self.fetch_timeout.as_secs(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowSource {
        delay: Duration,
    }

    #[async_trait]
    impl MetricSource for SlowSource {
        async fn fetch(
            &self,
            _resource_id: &str,
            _kind: ResourceKind,
            _metric: MetricKind,
            _lookback_hours: i64,
        ) -> Result<f64> {
            tokio::time::sleep(self.delay).await;
            Ok(42.0)
        }
    }

    #[tokio::test]
    async fn passes_through_fast_fetches() {
        let source = ThrottledSource::new(
            Arc::new(SlowSource {
                delay: Duration::from_millis(1),
            }),
            2,
            Duration::from_secs(1),
        );
        let value = source
            .fetch("i-0abc", ResourceKind::Ec2, MetricKind::CpuUtilization, 24)
            .await
            .expect("fetch should succeed");
        assert_eq!(value, 42.0);
    }

    #[tokio::test]
    async fn maps_elapsed_deadline_to_timeout_error() {
        let source = ThrottledSource::new(
            Arc::new(SlowSource {
                delay: Duration::from_millis(200),
            }),
            2,
            Duration::from_millis(20),
        );
        let err = source
            .fetch("i-0abc", ResourceKind::Ec2, MetricKind::CpuUtilization, 24)
            .await
            .expect_err("fetch should time out");
        assert!(matches!(err, MetricError::Timeout { .. }));
    }
}
