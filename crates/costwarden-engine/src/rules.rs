use crate::config::EngineConfig;
use crate::policy;
use anyhow::Result;
use costwarden_alert::dispatcher::{AlertDispatcher, RaiseOutcome};
use costwarden_common::types::{Alert, Resource, ResourceKind, Rule};
use costwarden_metrics::{supported_metric, MetricKind, MetricSource};
use costwarden_store::{ResourceRepository, RuleRepository};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Counters for one rule-evaluation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleRunSummary {
    /// Active rules evaluated.
    pub rules: usize,
    /// Resource evaluations attempted across all rules.
    pub resources: usize,
    pub alerts_created: usize,
    /// Satisfied conditions suppressed because an open alert already
    /// exists for the (resource, rule) key.
    pub deduplicated: usize,
    /// Rules skipped because their condition metric is not supported for
    /// the target kind.
    pub unsupported: usize,
    pub failures: usize,
}

impl RuleRunSummary {
    fn merge(&mut self, other: RuleRunSummary) {
        self.rules += other.rules;
        self.resources += other.resources;
        self.alerts_created += other.alerts_created;
        self.deduplicated += other.deduplicated;
        self.unsupported += other.unsupported;
        self.failures += other.failures;
    }
}

/// Evaluates every active governance rule against the live metrics of its
/// target resource kind and raises an alert per satisfied condition.
///
/// Rules are evaluated independently, and within a rule each resource is
/// evaluated independently on a semaphore-bounded worker pool; a failure
/// anywhere is logged, counted, and contained.
pub struct RuleEvaluationEngine {
    rules: Arc<dyn RuleRepository>,
    resources: Arc<dyn ResourceRepository>,
    metrics: Arc<dyn MetricSource>,
    dispatcher: Arc<AlertDispatcher>,
    config: EngineConfig,
    cancel: CancellationToken,
}

impl RuleEvaluationEngine {
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        resources: Arc<dyn ResourceRepository>,
        metrics: Arc<dyn MetricSource>,
        dispatcher: Arc<AlertDispatcher>,
        config: EngineConfig,
    ) -> Self {
        Self {
            rules,
            resources,
            metrics,
            dispatcher,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach a cancellation token checked between rules and resources.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn evaluate_all_rules(&self) -> Result<RuleRunSummary> {
        let active = self.rules.list_active().await?;
        tracing::info!(count = active.len(), "starting rule evaluation");

        let mut summary = RuleRunSummary::default();
        for rule in active {
            if self.cancel.is_cancelled() {
                tracing::warn!("rule evaluation run cancelled");
                break;
            }
            summary.rules += 1;
            match self.evaluate_rule(&rule).await {
                Ok(rule_summary) => summary.merge(rule_summary),
                Err(e) => {
                    tracing::error!(rule = %rule.name, error = %e, "rule evaluation failed");
                    summary.failures += 1;
                }
            }
        }

        tracing::info!(
            rules = summary.rules,
            resources = summary.resources,
            alerts = summary.alerts_created,
            failures = summary.failures,
            "rule evaluation completed"
        );
        Ok(summary)
    }

    async fn evaluate_rule(&self, rule: &Rule) -> Result<RuleRunSummary> {
        let mut summary = RuleRunSummary::default();

        // ECS is a recognized target kind but evaluation is not yet
        // implemented: enumerate and move on without raising.
        if rule.resource_kind == ResourceKind::Ecs {
            let services = self.resources.list_by_kind(ResourceKind::Ecs).await?;
            tracing::info!(
                rule = %rule.name,
                services = services.len(),
                "ECS rule evaluation not yet implemented"
            );
            return Ok(summary);
        }

        let Some(metric) = supported_metric(rule.resource_kind, &rule.metric) else {
            tracing::warn!(
                rule = %rule.name,
                metric = %rule.metric,
                kind = %rule.resource_kind,
                "condition metric not supported for kind, rule skipped"
            );
            summary.unsupported = 1;
            return Ok(summary);
        };

        let window_hours = policy::lookback_hours(&rule.duration);
        let resources = self.resources.list_by_kind(rule.resource_kind).await?;
        tracing::info!(
            rule = %rule.name,
            resources = resources.len(),
            window_hours,
            "evaluating rule"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = Vec::new();

        for resource in resources {
            if self.cancel.is_cancelled() {
                tracing::warn!(rule = %rule.name, "rule evaluation cancelled mid-rule");
                break;
            }

            let permits = Arc::clone(&semaphore);
            let metrics = Arc::clone(&self.metrics);
            let dispatcher = Arc::clone(&self.dispatcher);
            let rule = rule.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = permits.acquire().await?;
                check_resource(&rule, resource, metric, window_hours, metrics, dispatcher).await
            }));
        }

        for task in tasks {
            summary.resources += 1;
            match task.await {
                Ok(Ok(Some(RaiseOutcome::Created(_)))) => summary.alerts_created += 1,
                Ok(Ok(Some(RaiseOutcome::Deduplicated { .. }))) => summary.deduplicated += 1,
                Ok(Ok(Some(RaiseOutcome::Rejected))) => summary.failures += 1,
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    tracing::warn!(rule = %rule.name, error = %e, "resource evaluation failed");
                    summary.failures += 1;
                }
                Err(e) => {
                    tracing::error!(rule = %rule.name, error = %e, "evaluation task panicked");
                    summary.failures += 1;
                }
            }
        }

        Ok(summary)
    }
}

async fn check_resource(
    rule: &Rule,
    resource: Resource,
    metric: MetricKind,
    window_hours: i64,
    metrics: Arc<dyn MetricSource>,
    dispatcher: Arc<AlertDispatcher>,
) -> Result<Option<RaiseOutcome>> {
    let value = metrics
        .fetch(&resource.id, resource.kind, metric, window_hours)
        .await?;

    if !rule.operator.check(value, rule.threshold) {
        return Ok(None);
    }

    let alert = Alert::new(
        resource.id.clone(),
        resource.kind,
        rule.rule_type.clone(),
        policy::severity_for(&rule.rule_type),
        violation_message(rule, &resource.id, metric, value),
        Some(rule.id.clone()),
    );
    let outcome = dispatcher.raise(alert).await?;
    Ok(Some(outcome))
}

/// Alert text interpolates the rule's original duration pair, not the
/// normalized hours.
fn violation_message(rule: &Rule, resource_id: &str, metric: MetricKind, value: f64) -> String {
    match metric {
        MetricKind::CpuUtilization => format!(
            "{} instance {resource_id} has CPU utilization {value:.2}% {} {:.2}% for {}",
            rule.resource_kind, rule.operator, rule.threshold, rule.duration
        ),
        MetricKind::Invocations => format!(
            "SageMaker endpoint {resource_id} has {value:.0} invocations {} {:.0} for {}",
            rule.operator, rule.threshold, rule.duration
        ),
        MetricKind::NetworkIn | MetricKind::DatabaseConnections => format!(
            "{} resource {resource_id} has {metric} {value:.2} {} {:.2} for {}",
            rule.resource_kind, rule.operator, rule.threshold, rule.duration
        ),
    }
}
