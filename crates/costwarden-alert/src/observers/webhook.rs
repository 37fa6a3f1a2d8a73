use crate::AlertObserver;
use anyhow::{bail, Result};
use async_trait::async_trait;
use costwarden_common::types::Alert;
use serde_json::json;

/// Observer that POSTs a JSON rendering of each alert event to a
/// configured URL.
pub struct WebhookObserver {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl WebhookObserver {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn render(event: &str, alert: &Alert) -> serde_json::Value {
        json!({
            "event": event,
            "alert_id": alert.id,
            "resource_id": alert.resource_id,
            "resource_type": alert.resource_kind.to_string(),
            "category": alert.category,
            "severity": alert.severity.to_string(),
            "message": alert.message,
            "rule_id": alert.rule_id,
            "created_at": alert.created_at.to_rfc3339(),
            "resolved_at": alert.resolved_at.map(|t| t.to_rfc3339()),
        })
    }

    async fn post(&self, event: &str, alert: &Alert) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&Self::render(event, alert))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("webhook {} returned status {status}: {body}", self.url);
        }
        Ok(())
    }
}

#[async_trait]
impl AlertObserver for WebhookObserver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_alert_created(&self, alert: &Alert) -> Result<()> {
        self.post("created", alert).await
    }

    async fn on_alert_resolved(&self, alert: &Alert) -> Result<()> {
        self.post("resolved", alert).await
    }
}
