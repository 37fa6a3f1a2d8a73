use crate::config::EngineConfig;
use crate::policy;
use crate::strategy::{CpuBasedStrategy, IdleStrategy};
use anyhow::Result;
use chrono::Utc;
use costwarden_alert::dispatcher::{AlertDispatcher, RaiseOutcome};
use costwarden_common::types::{
    Alert, IdleState, Resource, ResourceKind, UtilizationSnapshot, IDLE_RESOURCE_CATEGORY,
};
use costwarden_metrics::{idle_metrics, MetricKind, MetricSource};
use costwarden_store::ResourceRepository;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tokio_util::sync::CancellationToken;

/// Counters for one idle-detection traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdleRunSummary {
    /// Resources whose evaluation was attempted.
    pub evaluated: usize,
    /// Resources skipped because their lifecycle state does not qualify.
    pub skipped: usize,
    /// Resources classified idle.
    pub idle: usize,
    pub alerts_created: usize,
    /// Idle findings suppressed because an open alert already exists.
    pub deduplicated: usize,
    pub failures: usize,
}

impl IdleRunSummary {
    fn merge(&mut self, other: IdleRunSummary) {
        self.evaluated += other.evaluated;
        self.skipped += other.skipped;
        self.idle += other.idle;
        self.alerts_created += other.alerts_created;
        self.deduplicated += other.deduplicated;
        self.failures += other.failures;
    }
}

enum IdleOutcome {
    Idle(RaiseOutcome),
    NotIdle,
}

/// Parameters of one per-kind traversal, shared by its spawned tasks.
#[derive(Clone, Copy)]
struct KindRun {
    kind: ResourceKind,
    primary: MetricKind,
    secondary: MetricKind,
    lookback_days: i64,
    lookback_hours: i64,
    threshold: f64,
}

/// Classifies qualifying resources as idle through the active
/// [`IdleStrategy`] and raises `IDLE_RESOURCE` alerts for findings.
///
/// The strategy is engine-instance state, set through
/// [`set_strategy`](Self::set_strategy); it applies to all subsequent runs
/// of this engine until changed. Per-resource evaluations run on a
/// semaphore-bounded worker pool and are failure-isolated: one resource's
/// metrics or persistence error never aborts the rest of the batch.
pub struct IdleDetectionEngine {
    resources: Arc<dyn ResourceRepository>,
    metrics: Arc<dyn MetricSource>,
    dispatcher: Arc<AlertDispatcher>,
    strategy: RwLock<Arc<dyn IdleStrategy>>,
    config: EngineConfig,
    cancel: CancellationToken,
}

impl IdleDetectionEngine {
    pub fn new(
        resources: Arc<dyn ResourceRepository>,
        metrics: Arc<dyn MetricSource>,
        dispatcher: Arc<AlertDispatcher>,
        config: EngineConfig,
    ) -> Self {
        Self {
            resources,
            metrics,
            dispatcher,
            strategy: RwLock::new(Arc::new(CpuBasedStrategy)),
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach a cancellation token checked before each resource is
    /// dispatched. Cancelling stops the run at the next resource boundary.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Swap the active idle-detection strategy.
    pub async fn set_strategy(&self, strategy: Arc<dyn IdleStrategy>) {
        tracing::info!(strategy = strategy.name(), "idle detection strategy changed");
        *self.strategy.write().await = strategy;
    }

    pub async fn detect_idle_ec2(
        &self,
        lookback_days: i64,
        cpu_threshold: f64,
    ) -> Result<IdleRunSummary> {
        self.detect_kind(ResourceKind::Ec2, lookback_days, cpu_threshold)
            .await
    }

    pub async fn detect_idle_rds(
        &self,
        lookback_days: i64,
        connection_threshold: f64,
    ) -> Result<IdleRunSummary> {
        self.detect_kind(ResourceKind::Rds, lookback_days, connection_threshold)
            .await
    }

    pub async fn detect_idle_sagemaker(
        &self,
        lookback_days: i64,
        invocation_threshold: f64,
    ) -> Result<IdleRunSummary> {
        self.detect_kind(ResourceKind::SageMaker, lookback_days, invocation_threshold)
            .await
    }

    /// Run idle detection across all covered resource kinds with the
    /// configured thresholds. A failing kind is logged and the remaining
    /// kinds still run.
    pub async fn run_all(&self) -> IdleRunSummary {
        let runs = [
            (ResourceKind::Ec2, self.config.ec2_cpu_threshold),
            (ResourceKind::Rds, self.config.rds_connection_threshold),
            (
                ResourceKind::SageMaker,
                self.config.sagemaker_invocation_threshold,
            ),
        ];

        let mut summary = IdleRunSummary::default();
        for (kind, threshold) in runs {
            match self
                .detect_kind(kind, self.config.lookback_days, threshold)
                .await
            {
                Ok(kind_summary) => summary.merge(kind_summary),
                Err(e) => {
                    tracing::error!(kind = %kind, error = %e, "idle detection failed for kind");
                    summary.failures += 1;
                }
            }
        }
        summary
    }

    async fn detect_kind(
        &self,
        kind: ResourceKind,
        lookback_days: i64,
        threshold: f64,
    ) -> Result<IdleRunSummary> {
        let mut summary = IdleRunSummary::default();

        let (Some((primary, secondary)), Some(required_state)) =
            (idle_metrics(kind), kind.qualifying_state())
        else {
            tracing::warn!(kind = %kind, "kind not covered by idle detection");
            return Ok(summary);
        };

        tracing::info!(kind = %kind, lookback_days, threshold, "detecting idle resources");

        let resources = self.resources.list_by_kind(kind).await?;
        let strategy = self.strategy.read().await.clone();
        let run = KindRun {
            kind,
            primary,
            secondary,
            lookback_days,
            lookback_hours: lookback_days * 24,
            threshold,
        };

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = Vec::new();

        for resource in resources {
            if self.cancel.is_cancelled() {
                tracing::warn!(kind = %kind, "idle detection run cancelled");
                break;
            }
            if !resource.state.eq_ignore_ascii_case(required_state) {
                summary.skipped += 1;
                continue;
            }

            let permits = Arc::clone(&semaphore);
            let strategy = Arc::clone(&strategy);
            let metrics = Arc::clone(&self.metrics);
            let repository = Arc::clone(&self.resources);
            let dispatcher = Arc::clone(&self.dispatcher);

            tasks.push(tokio::spawn(async move {
                let _permit = permits.acquire().await?;
                evaluate_resource(run, resource, strategy, metrics, repository, dispatcher).await
            }));
        }

        for task in tasks {
            summary.evaluated += 1;
            match task.await {
                Ok(Ok(IdleOutcome::Idle(outcome))) => {
                    summary.idle += 1;
                    match outcome {
                        RaiseOutcome::Created(_) => summary.alerts_created += 1,
                        RaiseOutcome::Deduplicated { .. } => summary.deduplicated += 1,
                        RaiseOutcome::Rejected => summary.failures += 1,
                    }
                }
                Ok(Ok(IdleOutcome::NotIdle)) => {}
                Ok(Err(e)) => {
                    tracing::warn!(kind = %kind, error = %e, "resource evaluation failed");
                    summary.failures += 1;
                }
                Err(e) => {
                    tracing::error!(kind = %kind, error = %e, "evaluation task panicked");
                    summary.failures += 1;
                }
            }
        }

        tracing::info!(
            kind = %kind,
            evaluated = summary.evaluated,
            skipped = summary.skipped,
            idle = summary.idle,
            failures = summary.failures,
            "idle detection completed"
        );
        Ok(summary)
    }
}

async fn evaluate_resource(
    run: KindRun,
    mut resource: Resource,
    strategy: Arc<dyn IdleStrategy>,
    metrics: Arc<dyn MetricSource>,
    repository: Arc<dyn ResourceRepository>,
    dispatcher: Arc<AlertDispatcher>,
) -> Result<IdleOutcome> {
    let primary_value = metrics
        .fetch(&resource.id, run.kind, run.primary, run.lookback_hours)
        .await?;
    let secondary_value = if run.secondary == run.primary {
        primary_value
    } else {
        metrics
            .fetch(&resource.id, run.kind, run.secondary, run.lookback_hours)
            .await?
    };

    apply_reading(&mut resource.utilization, run.primary, primary_value);
    apply_reading(&mut resource.utilization, run.secondary, secondary_value);

    let idle = strategy.is_idle(primary_value, secondary_value, run.threshold);
    resource.idle = if idle { IdleState::Idle } else { IdleState::NotIdle };
    resource.last_checked = Some(Utc::now());

    // The snapshot is persisted whether or not the resource is idle so
    // the inventory's utilization view stays current.
    repository.save(&resource).await?;

    if !idle {
        return Ok(IdleOutcome::NotIdle);
    }

    let alert = Alert::new(
        resource.id.clone(),
        run.kind,
        IDLE_RESOURCE_CATEGORY,
        policy::idle_severity(run.kind),
        idle_message(&run, &resource.id, primary_value, secondary_value),
        None,
    );
    let outcome = dispatcher.raise(alert).await?;
    Ok(IdleOutcome::Idle(outcome))
}

fn apply_reading(snapshot: &mut UtilizationSnapshot, metric: MetricKind, value: f64) {
    match metric {
        MetricKind::CpuUtilization => snapshot.cpu_percent = Some(value),
        MetricKind::NetworkIn => snapshot.network_in_bytes = Some(value),
        MetricKind::DatabaseConnections => snapshot.database_connections = Some(value),
        MetricKind::Invocations => snapshot.invocations = Some(value),
    }
}

fn idle_message(run: &KindRun, resource_id: &str, primary: f64, secondary: f64) -> String {
    match run.kind {
        ResourceKind::Ec2 => format!(
            "EC2 instance {resource_id} is idle (CPU: {primary:.2}%, Network In: {secondary:.2} bytes)"
        ),
        ResourceKind::Rds => format!(
            "RDS instance {resource_id} is idle (Connections: {secondary:.0}, CPU: {primary:.2}%)"
        ),
        ResourceKind::SageMaker => format!(
            "SageMaker endpoint {resource_id} is idle ({primary:.0} invocations in last {} days)",
            run.lookback_days
        ),
        ResourceKind::Ecs => format!("ECS service {resource_id} is idle"),
    }
}
