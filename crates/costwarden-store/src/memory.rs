use crate::{AlertRepository, ResourceRepository, RuleRepository};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use costwarden_common::types::{Alert, Resource, ResourceKind, Rule, Severity};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory resource inventory keyed by resource id.
#[derive(Default)]
pub struct MemoryResourceRepository {
    rows: RwLock<HashMap<String, Resource>>,
}

impl MemoryResourceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, resources: Vec<Resource>) {
        let mut rows = self.rows.write().await;
        for resource in resources {
            rows.insert(resource.id.clone(), resource);
        }
    }

    pub async fn get(&self, id: &str) -> Option<Resource> {
        self.rows.read().await.get(id).cloned()
    }
}

#[async_trait]
impl ResourceRepository for MemoryResourceRepository {
    async fn list_by_kind(&self, kind: ResourceKind) -> Result<Vec<Resource>> {
        let rows = self.rows.read().await;
        let mut out: Vec<Resource> = rows.values().filter(|r| r.kind == kind).cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    async fn save(&self, resource: &Resource) -> Result<()> {
        let mut rows = self.rows.write().await;
        rows.insert(resource.id.clone(), resource.clone());
        Ok(())
    }
}

/// In-memory rule store.
#[derive(Default)]
pub struct MemoryRuleRepository {
    rows: RwLock<HashMap<String, Rule>>,
}

impl MemoryRuleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RuleRepository for MemoryRuleRepository {
    async fn list_active(&self) -> Result<Vec<Rule>> {
        let rows = self.rows.read().await;
        let mut out: Vec<Rule> = rows.values().filter(|r| r.enabled).cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    async fn list_all(&self) -> Result<Vec<Rule>> {
        let rows = self.rows.read().await;
        let mut out: Vec<Rule> = rows.values().cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    async fn insert(&self, rule: &Rule) -> Result<()> {
        let mut rows = self.rows.write().await;
        rows.insert(rule.id.clone(), rule.clone());
        Ok(())
    }
}

/// In-memory alert store.
#[derive(Default)]
pub struct MemoryAlertRepository {
    rows: RwLock<HashMap<String, Alert>>,
}

impl MemoryAlertRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list_all(&self) -> Vec<Alert> {
        let rows = self.rows.read().await;
        let mut out: Vec<Alert> = rows.values().cloned().collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        out
    }
}

#[async_trait]
impl AlertRepository for MemoryAlertRepository {
    async fn insert(&self, alert: &Alert) -> Result<bool> {
        let mut rows = self.rows.write().await;
        rows.insert(alert.id.clone(), alert.clone());
        Ok(true)
    }

    async fn resolve(&self, alert_id: &str) -> Result<bool> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(alert_id) {
            Some(alert) if !alert.resolved => {
                alert.resolved = true;
                alert.resolved_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, alert_id: &str) -> Result<bool> {
        let mut rows = self.rows.write().await;
        Ok(rows.remove(alert_id).is_some())
    }

    async fn get(&self, alert_id: &str) -> Result<Option<Alert>> {
        Ok(self.rows.read().await.get(alert_id).cloned())
    }

    async fn list_unresolved(&self) -> Result<Vec<Alert>> {
        let rows = self.rows.read().await;
        let mut out: Vec<Alert> = rows.values().filter(|a| !a.resolved).cloned().collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(out)
    }

    async fn find_open(
        &self,
        resource_id: &str,
        category: &str,
        rule_id: Option<&str>,
    ) -> Result<Option<Alert>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .find(|a| {
                !a.resolved
                    && a.resource_id == resource_id
                    && a.category == category
                    && a.rule_id.as_deref() == rule_id
            })
            .cloned())
    }

    async fn count_by_severity(&self, severity: Severity, unresolved_only: bool) -> Result<usize> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|a| a.severity == severity && (!unresolved_only || !a.resolved))
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use costwarden_common::types::IDLE_RESOURCE_CATEGORY;

    fn idle_alert(resource_id: &str) -> Alert {
        Alert::new(
            resource_id,
            ResourceKind::Ec2,
            IDLE_RESOURCE_CATEGORY,
            Severity::Medium,
            format!("EC2 instance {resource_id} is idle"),
            None,
        )
    }

    #[tokio::test]
    async fn save_upserts_by_resource_id() {
        let repo = MemoryResourceRepository::new();
        let mut resource = Resource::new("i-0abc", ResourceKind::Ec2, "running");
        repo.save(&resource).await.unwrap();

        resource.utilization.cpu_percent = Some(3.5);
        repo.save(&resource).await.unwrap();

        let listed = repo.list_by_kind(ResourceKind::Ec2).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].utilization.cpu_percent, Some(3.5));
    }

    #[tokio::test]
    async fn list_by_kind_filters_other_kinds() {
        let repo = MemoryResourceRepository::new();
        repo.seed(vec![
            Resource::new("i-0abc", ResourceKind::Ec2, "running"),
            Resource::new("db-prod", ResourceKind::Rds, "available"),
        ])
        .await;

        let ec2 = repo.list_by_kind(ResourceKind::Ec2).await.unwrap();
        assert_eq!(ec2.len(), 1);
        assert_eq!(ec2[0].id, "i-0abc");
    }

    #[tokio::test]
    async fn list_active_excludes_disabled_rules() {
        let repo = MemoryRuleRepository::new();
        let now = Utc::now();
        let mut rule = Rule {
            id: "r-1".into(),
            name: "low cpu".into(),
            rule_type: "cost_optimization".into(),
            resource_kind: ResourceKind::Ec2,
            metric: "CPU".into(),
            operator: "<".parse().unwrap(),
            threshold: 5.0,
            duration: costwarden_common::types::RuleDuration::new(1, "days".parse().unwrap()),
            action: costwarden_common::types::ActionType::Alert,
            enabled: true,
            created_by: "ops".into(),
            created_at: now,
            updated_at: now,
        };
        repo.insert(&rule).await.unwrap();

        rule.id = "r-2".into();
        rule.enabled = false;
        repo.insert(&rule).await.unwrap();

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "r-1");
        assert_eq!(repo.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn resolve_is_terminal_and_stamps_timestamp() {
        let repo = MemoryAlertRepository::new();
        let alert = idle_alert("i-0abc");
        repo.insert(&alert).await.unwrap();

        assert!(repo.resolve(&alert.id).await.unwrap());
        let resolved = repo.get(&alert.id).await.unwrap().unwrap();
        assert!(resolved.resolved);
        assert!(resolved.resolved_at.is_some());

        // Resolving twice is a no-op.
        assert!(!repo.resolve(&alert.id).await.unwrap());
        assert!(!repo.resolve("missing").await.unwrap());
    }

    #[tokio::test]
    async fn find_open_matches_the_dedup_key() {
        let repo = MemoryAlertRepository::new();
        let alert = idle_alert("i-0abc");
        repo.insert(&alert).await.unwrap();

        let open = repo
            .find_open("i-0abc", IDLE_RESOURCE_CATEGORY, None)
            .await
            .unwrap();
        assert!(open.is_some());

        // A different rule id is a different key.
        assert!(repo
            .find_open("i-0abc", IDLE_RESOURCE_CATEGORY, Some("r-1"))
            .await
            .unwrap()
            .is_none());

        repo.resolve(&alert.id).await.unwrap();
        assert!(repo
            .find_open("i-0abc", IDLE_RESOURCE_CATEGORY, None)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn count_by_severity_honors_unresolved_filter() {
        let repo = MemoryAlertRepository::new();
        let first = idle_alert("i-0abc");
        let second = idle_alert("i-0def");
        repo.insert(&first).await.unwrap();
        repo.insert(&second).await.unwrap();
        repo.resolve(&first.id).await.unwrap();

        assert_eq!(repo.count_by_severity(Severity::Medium, false).await.unwrap(), 2);
        assert_eq!(repo.count_by_severity(Severity::Medium, true).await.unwrap(), 1);
        assert_eq!(repo.count_by_severity(Severity::High, false).await.unwrap(), 0);
    }
}
