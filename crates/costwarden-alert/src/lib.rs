//! Alert dispatch hub with observer fan-out.
//!
//! Engines submit alerts through the [`dispatcher::AlertDispatcher`],
//! which persists them via the alert repository, suppresses duplicates of
//! still-open alerts, and broadcasts lifecycle events to registered
//! [`AlertObserver`]s. Built-in observers log to `tracing` and POST to a
//! webhook URL.

pub mod dispatcher;
pub mod observers;


use anyhow::Result;
use async_trait::async_trait;
use costwarden_common::types::Alert;

/// A component notified on alert lifecycle events, decoupled from alert
/// persistence.
///
/// Observers are registered on the [`dispatcher::AlertDispatcher`] under
/// their [`name`](AlertObserver::name); registration and removal are
/// idempotent. A failing callback is isolated by the dispatcher and never
/// fails the alert operation itself.
#[async_trait]
pub trait AlertObserver: Send + Sync {
    /// Registration identity (e.g. `"console"`, `"webhook:ops"`).
    fn name(&self) -> &str;

    async fn on_alert_created(&self, alert: &Alert) -> Result<()>;

    async fn on_alert_resolved(&self, alert: &Alert) -> Result<()>;
}
