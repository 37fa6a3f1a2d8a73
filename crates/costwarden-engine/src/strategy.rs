/// An interchangeable idle-classification algorithm.
///
/// Implementations are pure predicates over the primary utilization
/// metric (CPU% for EC2/RDS, invocation count for SageMaker), the
/// secondary activity metric (network-in, connection count), and a
/// caller-supplied threshold — no side effects, so they can be tested
/// without a live metric source.
pub trait IdleStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_idle(&self, primary_utilization: f64, secondary_activity: f64, threshold: f64) -> bool;
}

/// Idle iff the primary utilization metric is below the threshold.
pub struct CpuBasedStrategy;

impl IdleStrategy for CpuBasedStrategy {
    fn name(&self) -> &'static str {
        "cpu_based"
    }

    fn is_idle(&self, primary_utilization: f64, _secondary_activity: f64, threshold: f64) -> bool {
        primary_utilization < threshold
    }
}

/// Idle iff the secondary activity metric is below the threshold.
pub struct NetworkBasedStrategy;

impl IdleStrategy for NetworkBasedStrategy {
    fn name(&self) -> &'static str {
        "network_based"
    }

    fn is_idle(&self, _primary_utilization: f64, secondary_activity: f64, threshold: f64) -> bool {
        secondary_activity < threshold
    }
}

/// Idle iff both metrics are below the threshold. Strictly more
/// conservative than either single-metric strategy.
pub struct CombinedStrategy;

impl IdleStrategy for CombinedStrategy {
    fn name(&self) -> &'static str {
        "combined"
    }

    fn is_idle(&self, primary_utilization: f64, secondary_activity: f64, threshold: f64) -> bool {
        primary_utilization < threshold && secondary_activity < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_strategy_ignores_secondary_activity() {
        assert!(CpuBasedStrategy.is_idle(3.0, 999.0, 5.0));
        assert!(!CpuBasedStrategy.is_idle(7.0, 0.0, 5.0));
    }

    #[test]
    fn network_strategy_ignores_primary_utilization() {
        assert!(NetworkBasedStrategy.is_idle(99.0, 2.0, 5.0));
        assert!(!NetworkBasedStrategy.is_idle(0.0, 9.0, 5.0));
    }

    #[test]
    fn cpu_and_combined_strategies_can_disagree() {
        // CPU below threshold but network above: CPU-based says idle,
        // combined does not.
        assert!(CpuBasedStrategy.is_idle(3.0, 10.0, 5.0));
        assert!(!CombinedStrategy.is_idle(3.0, 10.0, 5.0));
    }

    #[test]
    fn combined_is_the_conjunction_of_the_single_metric_strategies() {
        let samples = [0.0, 1.0, 4.9, 5.0, 5.1, 50.0, 999.0];
        for cpu in samples {
            for net in samples {
                for threshold in [0.0, 5.0, 100.0] {
                    let expected = CpuBasedStrategy.is_idle(cpu, net, threshold)
                        && NetworkBasedStrategy.is_idle(cpu, net, threshold);
                    assert_eq!(
                        CombinedStrategy.is_idle(cpu, net, threshold),
                        expected,
                        "combined({cpu}, {net}, {threshold})"
                    );
                }
            }
        }
    }
}
