use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert category used by idle detection (rule-originated alerts use the
/// rule's own type instead).
pub const IDLE_RESOURCE_CATEGORY: &str = "IDLE_RESOURCE";

/// Cloud resource kinds the engines know how to evaluate.
///
/// # Examples
///
/// ```
/// use costwarden_common::types::ResourceKind;
///
/// let kind: ResourceKind = "EC2".parse().unwrap();
/// assert_eq!(kind, ResourceKind::Ec2);
/// assert_eq!(kind.to_string(), "EC2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    #[serde(rename = "EC2")]
    Ec2,
    #[serde(rename = "RDS")]
    Rds,
    #[serde(rename = "ECS")]
    Ecs,
    SageMaker,
}

impl ResourceKind {
    /// Lifecycle state a resource must be in to qualify for idle
    /// evaluation. `None` means the kind is never idle-evaluated.
    pub fn qualifying_state(&self) -> Option<&'static str> {
        match self {
            ResourceKind::Ec2 => Some("running"),
            ResourceKind::Rds => Some("available"),
            ResourceKind::SageMaker => Some("InService"),
            ResourceKind::Ecs => None,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Ec2 => write!(f, "EC2"),
            ResourceKind::Rds => write!(f, "RDS"),
            ResourceKind::Ecs => write!(f, "ECS"),
            ResourceKind::SageMaker => write!(f, "SageMaker"),
        }
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ec2" => Ok(ResourceKind::Ec2),
            "rds" => Ok(ResourceKind::Rds),
            "ecs" => Ok(ResourceKind::Ecs),
            "sagemaker" => Ok(ResourceKind::SageMaker),
            _ => Err(format!("unknown resource kind: {s}")),
        }
    }
}

/// Idle classification of a resource.
///
/// Classification requires a state-appropriate run condition (e.g. only
/// "running" EC2 instances are evaluated); resources that never qualified
/// stay `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleState {
    Unknown,
    Idle,
    NotIdle,
}

impl std::fmt::Display for IdleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdleState::Unknown => write!(f, "unknown"),
            IdleState::Idle => write!(f, "idle"),
            IdleState::NotIdle => write!(f, "not_idle"),
        }
    }
}

/// Alert severity level, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use costwarden_common::types::Severity;
///
/// let sev: Severity = "medium".parse().unwrap();
/// assert_eq!(sev, Severity::Medium);
/// assert_eq!(sev.to_string(), "medium");
/// assert!(Severity::High > Severity::Low);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// Last-observed utilization metrics for a resource. Only the subset
/// relevant to the resource kind is populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSnapshot {
    pub cpu_percent: Option<f64>,
    pub network_in_bytes: Option<f64>,
    pub database_connections: Option<f64>,
    pub invocations: Option<f64>,
}

/// A monitored cloud resource. Inventory (discovery, credentials) is owned
/// by an external collaborator; the engines read resources and write back
/// the utilization snapshot and idle classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Provider-assigned identifier, stable across inventory syncs.
    pub id: String,
    pub kind: ResourceKind,
    /// Lifecycle state as reported by the provider
    /// (e.g. `running`, `stopped`, `available`, `InService`).
    pub state: String,
    pub utilization: UtilizationSnapshot,
    pub idle: IdleState,
    pub last_checked: Option<DateTime<Utc>>,
}

impl Resource {
    pub fn new(id: impl Into<String>, kind: ResourceKind, state: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            state: state.into(),
            utilization: UtilizationSnapshot::default(),
            idle: IdleState::Unknown,
            last_checked: None,
        }
    }
}

/// Comparison operator of a rule condition.
///
/// `Eq` uses an epsilon tolerance of 0.01 to absorb floating-point noise;
/// the other operators are exact numeric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
}

const EQ_EPSILON: f64 = 0.01;

impl CompareOp {
    pub fn check(&self, value: f64, threshold: f64) -> bool {
        match self {
            CompareOp::Lt => value < threshold,
            CompareOp::Gt => value > threshold,
            CompareOp::Eq => (value - threshold).abs() < EQ_EPSILON,
            CompareOp::Le => value <= threshold,
            CompareOp::Ge => value >= threshold,
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Eq => write!(f, "="),
            CompareOp::Le => write!(f, "<="),
            CompareOp::Ge => write!(f, ">="),
        }
    }
}

impl std::str::FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(CompareOp::Lt),
            ">" => Ok(CompareOp::Gt),
            "=" => Ok(CompareOp::Eq),
            "<=" => Ok(CompareOp::Le),
            ">=" => Ok(CompareOp::Ge),
            _ => Err(format!("unknown compare operator: {s}")),
        }
    }
}

/// Unit of a rule's condition duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Minutes,
    Hours,
    Days,
}

impl std::fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DurationUnit::Minutes => write!(f, "minutes"),
            DurationUnit::Hours => write!(f, "hours"),
            DurationUnit::Days => write!(f, "days"),
        }
    }
}

impl std::str::FromStr for DurationUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minutes" => Ok(DurationUnit::Minutes),
            "hours" => Ok(DurationUnit::Hours),
            "days" => Ok(DurationUnit::Days),
            _ => Err(format!("unknown duration unit: {s}")),
        }
    }
}

/// A rule's condition duration as authored by the user, before
/// normalization to the metric-source lookback unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDuration {
    pub value: i64,
    pub unit: DurationUnit,
}

impl RuleDuration {
    pub fn new(value: i64, unit: DurationUnit) -> Self {
        Self { value, unit }
    }
}

impl std::fmt::Display for RuleDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Intended remediation for a satisfied rule. Informational only: the
/// engine records it on the rule, execution is an external concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionType {
    Alert,
    Stop,
    Terminate,
    Notify,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Alert => write!(f, "ALERT"),
            ActionType::Stop => write!(f, "STOP"),
            ActionType::Terminate => write!(f, "TERMINATE"),
            ActionType::Notify => write!(f, "NOTIFY"),
        }
    }
}

/// A user-authored governance rule evaluated against live metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    /// Rule category (e.g. `cost_optimization`, `security`); determines
    /// the severity of alerts the rule produces.
    pub rule_type: String,
    pub resource_kind: ResourceKind,
    /// Condition metric name, matched against the supported metric names
    /// of the rule's resource kind.
    pub metric: String,
    pub operator: CompareOp,
    pub threshold: f64,
    pub duration: RuleDuration,
    pub action: ActionType,
    pub enabled: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An alert raised by idle detection or rule evaluation.
///
/// Lifecycle: created, then either resolved or deleted (both terminal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub resource_id: String,
    pub resource_kind: ResourceKind,
    /// Alert category: the originating rule's type, or
    /// [`IDLE_RESOURCE_CATEGORY`] for idle-detection alerts.
    pub category: String,
    pub severity: Severity,
    pub message: String,
    /// Originating rule, absent for idle-detection alerts.
    pub rule_id: Option<String>,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn new(
        resource_id: impl Into<String>,
        resource_kind: ResourceKind,
        category: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        rule_id: Option<String>,
    ) -> Self {
        Self {
            id: crate::id::next_id(),
            resource_id: resource_id.into(),
            resource_kind,
            category: category.into(),
            severity,
            message: message.into(),
            rule_id,
            resolved: false,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_op_exact_operators() {
        assert!(CompareOp::Lt.check(1.0, 5.0));
        assert!(!CompareOp::Lt.check(5.0, 5.0));
        assert!(CompareOp::Gt.check(10.0, 5.0));
        assert!(CompareOp::Le.check(5.0, 5.0));
        assert!(CompareOp::Ge.check(5.0, 5.0));
        assert!(!CompareOp::Ge.check(4.9, 5.0));
    }

    #[test]
    fn compare_op_equality_uses_epsilon() {
        assert!(CompareOp::Eq.check(4.995, 5.0));
        assert!(!CompareOp::Eq.check(4.9, 5.0));
    }

    #[test]
    fn compare_op_parses_from_symbols() {
        for sym in ["<", ">", "=", "<=", ">="] {
            let op: CompareOp = sym.parse().expect("operator should parse");
            assert_eq!(op.to_string(), sym);
        }
        assert!("!=".parse::<CompareOp>().is_err());
    }

    #[test]
    fn resource_kind_qualifying_states() {
        assert_eq!(ResourceKind::Ec2.qualifying_state(), Some("running"));
        assert_eq!(ResourceKind::Rds.qualifying_state(), Some("available"));
        assert_eq!(ResourceKind::SageMaker.qualifying_state(), Some("InService"));
        assert_eq!(ResourceKind::Ecs.qualifying_state(), None);
    }

    #[test]
    fn new_resource_starts_unknown() {
        let resource = Resource::new("i-0abc", ResourceKind::Ec2, "running");
        assert_eq!(resource.idle, IdleState::Unknown);
        assert!(resource.last_checked.is_none());
        assert!(resource.utilization.cpu_percent.is_none());
    }

    #[test]
    fn rule_duration_displays_original_pair() {
        let duration = RuleDuration::new(1, DurationUnit::Days);
        assert_eq!(duration.to_string(), "1 days");
        let duration = RuleDuration::new(90, DurationUnit::Minutes);
        assert_eq!(duration.to_string(), "90 minutes");
    }

    #[test]
    fn alert_roundtrips_through_json() {
        let alert = Alert::new(
            "i-0abc",
            ResourceKind::Ec2,
            IDLE_RESOURCE_CATEGORY,
            Severity::Medium,
            "EC2 instance i-0abc is idle",
            None,
        );
        let json = serde_json::to_string(&alert).expect("alert should serialize");
        assert!(json.contains("\"EC2\""));
        assert!(json.contains("\"medium\""));
        let back: Alert = serde_json::from_str(&json).expect("alert should deserialize");
        assert_eq!(back.resource_id, "i-0abc");
        assert!(!back.resolved);
    }
}
