use crate::AlertObserver;
use anyhow::Result;
use costwarden_common::types::Alert;
use costwarden_store::AlertRepository;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Outcome of submitting an alert to the dispatcher.
#[derive(Debug, Clone)]
pub enum RaiseOutcome {
    /// The alert was persisted and broadcast.
    Created(Alert),
    /// An unresolved alert with the same (resource, category, rule) key
    /// already exists; nothing was inserted.
    Deduplicated { existing_id: String },
    /// The repository refused the row.
    Rejected,
}

/// Observer hub shared by every alert producer.
///
/// Constructed once at wiring time and injected into the engines as an
/// `Arc`; there is no ambient singleton. At most one open alert exists per
/// `(resource_id, category, rule_id)` key — re-raising while the previous
/// alert is unresolved is suppressed until it is resolved or deleted.
pub struct AlertDispatcher {
    alerts: Arc<dyn AlertRepository>,
    observers: RwLock<Vec<Arc<dyn AlertObserver>>>,
}

impl AlertDispatcher {
    pub fn new(alerts: Arc<dyn AlertRepository>) -> Self {
        Self {
            alerts,
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Register an observer. Registering a name that is already present is
    /// a no-op.
    pub async fn register(&self, observer: Arc<dyn AlertObserver>) {
        let mut observers = self.observers.write().await;
        if observers.iter().any(|o| o.name() == observer.name()) {
            tracing::debug!(observer = observer.name(), "observer already registered");
            return;
        }
        tracing::info!(observer = observer.name(), "observer registered");
        observers.push(observer);
    }

    /// Unregister an observer by name. Unregistering an absent name is a
    /// no-op.
    pub async fn unregister(&self, name: &str) {
        let mut observers = self.observers.write().await;
        let before = observers.len();
        observers.retain(|o| o.name() != name);
        if observers.len() < before {
            tracing::info!(observer = name, "observer unregistered");
        }
    }

    /// Persist a new alert and broadcast its creation.
    pub async fn raise(&self, alert: Alert) -> Result<RaiseOutcome> {
        if let Some(open) = self
            .alerts
            .find_open(&alert.resource_id, &alert.category, alert.rule_id.as_deref())
            .await?
        {
            tracing::debug!(
                resource_id = %alert.resource_id,
                category = %alert.category,
                existing_id = %open.id,
                "alert suppressed, open alert exists for this key"
            );
            return Ok(RaiseOutcome::Deduplicated { existing_id: open.id });
        }

        if !self.alerts.insert(&alert).await? {
            tracing::warn!(
                resource_id = %alert.resource_id,
                category = %alert.category,
                "alert repository refused insert"
            );
            return Ok(RaiseOutcome::Rejected);
        }

        tracing::info!(
            alert_id = %alert.id,
            resource_id = %alert.resource_id,
            severity = %alert.severity,
            message = %alert.message,
            "alert created"
        );
        self.notify(&alert, Event::Created).await;
        Ok(RaiseOutcome::Created(alert))
    }

    /// Resolve an alert and broadcast its resolution. Returns `false` when
    /// the alert does not exist or was already resolved.
    pub async fn resolve(&self, alert_id: &str) -> Result<bool> {
        if !self.alerts.resolve(alert_id).await? {
            return Ok(false);
        }

        match self.alerts.get(alert_id).await? {
            Some(alert) => {
                tracing::info!(alert_id, resource_id = %alert.resource_id, "alert resolved");
                self.notify(&alert, Event::Resolved).await;
            }
            None => {
                tracing::warn!(alert_id, "resolved alert vanished before broadcast");
            }
        }
        Ok(true)
    }

    /// Delete an alert. The deletion path is terminal and independent of
    /// resolution; observers are not notified.
    pub async fn delete(&self, alert_id: &str) -> Result<bool> {
        self.alerts.delete(alert_id).await
    }

    async fn notify(&self, alert: &Alert, event: Event) {
        let observers = self.observers.read().await;
        for observer in observers.iter() {
            let result = match event {
                Event::Created => observer.on_alert_created(alert).await,
                Event::Resolved => observer.on_alert_resolved(alert).await,
            };
            if let Err(e) = result {
                tracing::error!(
                    observer = observer.name(),
                    alert_id = %alert.id,
                    error = %e,
                    "observer notification failed"
                );
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Event {
    Created,
    Resolved,
}
