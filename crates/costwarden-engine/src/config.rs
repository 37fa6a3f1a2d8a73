use serde::{Deserialize, Serialize};

/// Engine tuning knobs with the stock defaults used by
/// [`crate::idle::IdleDetectionEngine::run_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Lookback window for idle detection, in days.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    /// CPU% below which an EC2 instance is an idle candidate.
    #[serde(default = "default_ec2_cpu_threshold")]
    pub ec2_cpu_threshold: f64,
    /// Connection count below which an RDS instance is an idle candidate.
    #[serde(default = "default_rds_connection_threshold")]
    pub rds_connection_threshold: f64,
    /// Invocation count below which a SageMaker endpoint is an idle
    /// candidate.
    #[serde(default = "default_sagemaker_invocation_threshold")]
    pub sagemaker_invocation_threshold: f64,
    /// Maximum concurrent per-resource evaluations.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-fetch timeout handed to the throttled metric source.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_lookback_days() -> i64 {
    7
}

fn default_ec2_cpu_threshold() -> f64 {
    5.0
}

fn default_rds_connection_threshold() -> f64 {
    2.0
}

fn default_sagemaker_invocation_threshold() -> f64 {
    10.0
}

fn default_concurrency() -> usize {
    5
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            ec2_cpu_threshold: default_ec2_cpu_threshold(),
            rds_connection_threshold: default_rds_connection_threshold(),
            sagemaker_invocation_threshold: default_sagemaker_invocation_threshold(),
            concurrency: default_concurrency(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gets_stock_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").expect("config should parse");
        assert_eq!(config.lookback_days, 7);
        assert_eq!(config.ec2_cpu_threshold, 5.0);
        assert_eq!(config.rds_connection_threshold, 2.0);
        assert_eq!(config.sagemaker_invocation_threshold, 10.0);
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.fetch_timeout_secs, 30);
    }

    #[test]
    fn partial_config_overrides_only_named_fields() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"lookback_days": 14, "concurrency": 2}"#)
                .expect("config should parse");
        assert_eq!(config.lookback_days, 14);
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.ec2_cpu_threshold, 5.0);
    }
}
