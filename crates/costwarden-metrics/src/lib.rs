//! Metric-source collaborator interface.
//!
//! The engines never query a cloud provider directly; they read scalar
//! metric values through the [`MetricSource`] trait. An implementation
//! wraps whatever monitoring API the deployment uses (CloudWatch or
//! similar); [`memory::InMemoryMetricSource`] serves tests and demos, and
//! [`throttle::ThrottledSource`] bounds concurrency and imposes per-fetch
//! timeouts on any inner source.

pub mod error;
pub mod memory;
pub mod throttle;

use async_trait::async_trait;
use costwarden_common::types::ResourceKind;
use error::Result;

/// Metrics the engines know how to request, one per provider metric name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    CpuUtilization,
    NetworkIn,
    DatabaseConnections,
    Invocations,
}

/// How datapoints within the lookback window are reduced to one scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Average,
    Sum,
}

impl MetricKind {
    /// Utilization-style metrics are averaged over the window;
    /// count-style metrics are summed.
    pub fn statistic(&self) -> Statistic {
        match self {
            MetricKind::CpuUtilization
            | MetricKind::NetworkIn
            | MetricKind::DatabaseConnections => Statistic::Average,
            MetricKind::Invocations => Statistic::Sum,
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricKind::CpuUtilization => write!(f, "CPUUtilization"),
            MetricKind::NetworkIn => write!(f, "NetworkIn"),
            MetricKind::DatabaseConnections => write!(f, "DatabaseConnections"),
            MetricKind::Invocations => write!(f, "Invocations"),
        }
    }
}

/// Resolve a rule's free-form condition metric name against the metrics
/// supported for a resource kind. Unknown names resolve to `None` and the
/// caller skips the rule with a warning.
pub fn supported_metric(kind: ResourceKind, name: &str) -> Option<MetricKind> {
    match kind {
        ResourceKind::Ec2 | ResourceKind::Rds if name.eq_ignore_ascii_case("cpu") => {
            Some(MetricKind::CpuUtilization)
        }
        ResourceKind::SageMaker if name.eq_ignore_ascii_case("invocations") => {
            Some(MetricKind::Invocations)
        }
        _ => None,
    }
}

/// Primary-utilization and secondary-activity metrics used to classify a
/// resource kind as idle. `None` for kinds idle detection does not cover.
pub fn idle_metrics(kind: ResourceKind) -> Option<(MetricKind, MetricKind)> {
    match kind {
        ResourceKind::Ec2 => Some((MetricKind::CpuUtilization, MetricKind::NetworkIn)),
        ResourceKind::Rds => Some((MetricKind::CpuUtilization, MetricKind::DatabaseConnections)),
        ResourceKind::SageMaker => Some((MetricKind::Invocations, MetricKind::Invocations)),
        ResourceKind::Ecs => None,
    }
}

/// Supplies scalar metric readings for a resource over a lookback window.
///
/// Implementations must tolerate windows with no datapoints by returning
/// `0.0` rather than an error; an `Err` means the fetch itself failed.
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn fetch(
        &self,
        resource_id: &str,
        kind: ResourceKind,
        metric: MetricKind,
        lookback_hours: i64,
    ) -> Result<f64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_metric_table() {
        assert_eq!(
            supported_metric(ResourceKind::Ec2, "CPU"),
            Some(MetricKind::CpuUtilization)
        );
        assert_eq!(
            supported_metric(ResourceKind::Rds, "cpu"),
            Some(MetricKind::CpuUtilization)
        );
        assert_eq!(
            supported_metric(ResourceKind::SageMaker, "Invocations"),
            Some(MetricKind::Invocations)
        );
        // Names a kind does not support resolve to nothing.
        assert_eq!(supported_metric(ResourceKind::Ec2, "Memory"), None);
        assert_eq!(supported_metric(ResourceKind::SageMaker, "CPU"), None);
        assert_eq!(supported_metric(ResourceKind::Ecs, "CPU"), None);
    }

    #[test]
    fn idle_metric_pairs() {
        assert_eq!(
            idle_metrics(ResourceKind::Ec2),
            Some((MetricKind::CpuUtilization, MetricKind::NetworkIn))
        );
        assert_eq!(
            idle_metrics(ResourceKind::Rds),
            Some((MetricKind::CpuUtilization, MetricKind::DatabaseConnections))
        );
        assert_eq!(idle_metrics(ResourceKind::Ecs), None);
    }

    #[test]
    fn count_metrics_are_summed() {
        assert_eq!(MetricKind::Invocations.statistic(), Statistic::Sum);
        assert_eq!(MetricKind::CpuUtilization.statistic(), Statistic::Average);
    }
}
