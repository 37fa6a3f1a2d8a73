use costwarden_common::types::{ResourceKind, RuleDuration, DurationUnit, Severity};

/// Normalize a rule's condition duration to the whole-hour lookback window
/// the metric source expects. Minutes round down with a floor of one hour;
/// days expand to 24 hours each.
pub fn lookback_hours(duration: &RuleDuration) -> i64 {
    match duration.unit {
        DurationUnit::Hours => duration.value,
        DurationUnit::Days => duration.value * 24,
        DurationUnit::Minutes => (duration.value / 60).max(1),
    }
}

/// Severity of alerts produced by a rule, determined by its category.
pub fn severity_for(rule_type: &str) -> Severity {
    match rule_type {
        "security" => Severity::High,
        "cost_optimization" | "performance" => Severity::Medium,
        "resource_optimization" => Severity::Low,
        _ => Severity::Low,
    }
}

/// Severity of idle-detection alerts: medium for idle EC2 instances,
/// high for idle databases and ML endpoints.
pub fn idle_severity(kind: ResourceKind) -> Severity {
    match kind {
        ResourceKind::Ec2 | ResourceKind::Ecs => Severity::Medium,
        ResourceKind::Rds | ResourceKind::SageMaker => Severity::High,
    }
}
