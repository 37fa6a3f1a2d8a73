//! Repository collaborator traits.
//!
//! Persistent storage of resources, rules, and alerts belongs to an
//! external collaborator; the engines talk to it through these traits.
//! [`memory`] provides in-memory reference implementations used by tests
//! and small deployments.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use costwarden_common::types::{Alert, Resource, ResourceKind, Rule, Severity};

/// Read/write access to the resource inventory. The engines only update
/// the utilization snapshot and idle classification of existing rows.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    async fn list_by_kind(&self, kind: ResourceKind) -> Result<Vec<Resource>>;

    /// Upsert keyed on the resource id.
    async fn save(&self, resource: &Resource) -> Result<()>;
}

/// Read access to user-authored governance rules.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    async fn list_active(&self) -> Result<Vec<Rule>>;

    async fn list_all(&self) -> Result<Vec<Rule>>;

    async fn insert(&self, rule: &Rule) -> Result<()>;
}

/// Alert persistence, written to through the dispatcher.
#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Returns `false` if the repository refused the row.
    async fn insert(&self, alert: &Alert) -> Result<bool>;

    /// Marks the alert resolved and stamps `resolved_at`. Returns `false`
    /// when the alert does not exist or is already resolved.
    async fn resolve(&self, alert_id: &str) -> Result<bool>;

    /// Returns `false` when the alert does not exist.
    async fn delete(&self, alert_id: &str) -> Result<bool>;

    async fn get(&self, alert_id: &str) -> Result<Option<Alert>>;

    async fn list_unresolved(&self) -> Result<Vec<Alert>>;

    /// Finds an unresolved alert with the same dedup key, if any.
    async fn find_open(
        &self,
        resource_id: &str,
        category: &str,
        rule_id: Option<&str>,
    ) -> Result<Option<Alert>>;

    async fn count_by_severity(&self, severity: Severity, unresolved_only: bool) -> Result<usize>;
}
