use crate::AlertObserver;
use anyhow::Result;
use async_trait::async_trait;
use costwarden_common::types::Alert;

/// Reference observer that logs alert lifecycle events through `tracing`.
/// Useful for operational visibility and as a wiring sanity check.
pub struct ConsoleObserver;

#[async_trait]
impl AlertObserver for ConsoleObserver {
    fn name(&self) -> &str {
        "console"
    }

    async fn on_alert_created(&self, alert: &Alert) -> Result<()> {
        tracing::info!(
            resource_id = %alert.resource_id,
            resource_kind = %alert.resource_kind,
            category = %alert.category,
            severity = %alert.severity,
            message = %alert.message,
            "NEW ALERT"
        );
        Ok(())
    }

    async fn on_alert_resolved(&self, alert: &Alert) -> Result<()> {
        tracing::info!(
            resource_id = %alert.resource_id,
            message = %alert.message,
            "alert RESOLVED"
        );
        Ok(())
    }
}
