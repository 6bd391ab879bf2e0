use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ScanDeckConfig;
use crate::error::{Result, ScanDeckError};
use crate::query::{self, AuditFilter, AuditStats};
use crate::state_machine::{
    Audit, AuditLanguage, AuditStatus, AuditType, CompletionOutcome, Container, ContainerStatus,
    Lifecycle, Transition,
};
use crate::store::EntityStore;

/// Published after every creation and every applied transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    pub audit_id: String,
    pub container_id: String,
    pub audit_status: AuditStatus,
    pub container_status: ContainerStatus,
    pub at: DateTime<Utc>,
}

impl LifecycleEvent {
    fn from_pair(audit: &Audit, container: &Container) -> Self {
        Self {
            audit_id: audit.id.clone(),
            container_id: container.id.clone(),
            audit_status: audit.status,
            container_status: container.status,
            at: audit.updated_at,
        }
    }
}

/// Creates audit/container pairs, schedules their activation and answers
/// queries over the shared store.
///
/// All mutations go through the store's write lock, so the deferred
/// activation and a racing cancel never interleave their read-check-write.
pub struct AuditOrchestrator {
    store: Arc<RwLock<EntityStore>>,
    activation_delay: Duration,
    events: broadcast::Sender<LifecycleEvent>,
    scheduled: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for AuditOrchestrator {
    fn default() -> Self {
        Self::new(&ScanDeckConfig::default())
    }
}

impl AuditOrchestrator {
    pub fn new(config: &ScanDeckConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            store: Arc::new(RwLock::new(EntityStore::new())),
            activation_delay: config.activation_delay(),
            events,
            scheduled: Mutex::new(Vec::new()),
        }
    }

    /// Create an orchestrator with a custom activation delay.
    pub fn with_delay(activation_delay: Duration) -> Self {
        let mut orch = Self::default();
        orch.activation_delay = activation_delay;
        orch
    }

    pub fn activation_delay(&self) -> Duration {
        self.activation_delay
    }

    pub fn status(&self) -> &'static str {
        "scandeck orchestrator is running"
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    pub async fn start_port_scan(&self, target: &str) -> Result<Audit> {
        self.launch(AuditType::PortScan, target, None).await
    }

    pub async fn start_dependency_scan(
        &self,
        language: AuditLanguage,
        project_path: &str,
    ) -> Result<Audit> {
        self.launch(AuditType::DependencyScan, project_path, Some(language))
            .await
    }

    /// Cancel an in-flight audit. Returns `false` when the audit had already
    /// finished.
    pub async fn cancel_audit(&self, id: &str) -> Result<bool> {
        let mut store = self.store.write().await;
        let (audit, container) = store
            .pair_mut(id)
            .ok_or_else(|| ScanDeckError::AuditNotFound(id.to_string()))?;

        let t = Lifecycle::cancel(audit, container);
        match t {
            Transition::Applied { from, to } => {
                info!(
                    audit_id = %audit.id,
                    container_id = %container.id,
                    %from,
                    %to,
                    "audit cancelled"
                );
                self.publish(audit, container);
                Ok(true)
            }
            Transition::Skipped { current } => {
                debug!(audit_id = %audit.id, %current, "cancel ignored, audit already finished");
                Ok(false)
            }
        }
    }

    /// Completion signal from the scanning backend. Only RUNNING audits
    /// move; anything else returns `false`.
    pub async fn complete_audit(&self, id: &str, outcome: CompletionOutcome) -> Result<bool> {
        let mut store = self.store.write().await;
        let (audit, container) = store
            .pair_mut(id)
            .ok_or_else(|| ScanDeckError::AuditNotFound(id.to_string()))?;

        match Lifecycle::complete(audit, container, outcome) {
            Transition::Applied { from, to } => {
                info!(
                    audit_id = %audit.id,
                    container_id = %container.id,
                    %from,
                    %to,
                    "audit finished"
                );
                self.publish(audit, container);
                Ok(true)
            }
            Transition::Skipped { current } => {
                debug!(audit_id = %audit.id, %current, "completion ignored, audit not running");
                Ok(false)
            }
        }
    }

    /// Wait for every scheduled activation that has not fired yet.
    pub async fn settle(&self) {
        let handles = std::mem::take(&mut *self.scheduled.lock().await);
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "activation task did not finish cleanly");
            }
        }
    }

    pub async fn list_audits(&self, filter: Option<&AuditFilter>) -> Vec<Audit> {
        query::list_audits(&*self.store.read().await, filter)
    }

    pub async fn get_audit(&self, id: &str) -> Option<Audit> {
        query::get_audit(&*self.store.read().await, id)
    }

    pub async fn get_container(&self, id: &str) -> Option<Container> {
        query::get_container(&*self.store.read().await, id)
    }

    pub async fn list_active_containers(&self) -> Vec<Container> {
        query::list_active_containers(&*self.store.read().await)
    }

    pub async fn audit_stats(&self) -> AuditStats {
        query::audit_stats(&*self.store.read().await)
    }

    async fn launch(
        &self,
        audit_type: AuditType,
        target: &str,
        language: Option<AuditLanguage>,
    ) -> Result<Audit> {
        if target.trim().is_empty() {
            return Err(ScanDeckError::InvalidInput(
                "audit target must not be empty".into(),
            ));
        }

        let audit = Audit::new(audit_type, target.to_string(), language);
        let container = Container::for_audit(&audit);

        {
            let mut store = self.store.write().await;
            store.insert_pair(audit.clone(), container.clone())?;
            // Published under the lock so no later transition can overtake it.
            self.publish(&audit, &container);
        }
        info!(
            audit_id = %audit.id,
            container_id = %container.id,
            audit_type = %audit.audit_type,
            image = %container.image,
            target = %audit.target,
            "audit created"
        );

        self.schedule_activation(audit.id.clone()).await;
        Ok(audit)
    }

    /// Spawn the one deferred PENDING → RUNNING step for `audit_id`. The
    /// timer always fires; the lifecycle guard decides whether it applies.
    async fn schedule_activation(&self, audit_id: String) {
        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let delay = self.activation_delay;

        let handle = tokio::spawn(async move {
            sleep(delay).await;

            let mut store = store.write().await;
            let Some((audit, container)) = store.pair_mut(&audit_id) else {
                warn!(audit_id = %audit_id, "activation fired for unknown audit");
                return;
            };

            match Lifecycle::activate(audit, container) {
                Transition::Applied { from, to } => {
                    info!(
                        audit_id = %audit.id,
                        container_id = %container.id,
                        %from,
                        %to,
                        "audit activated"
                    );
                    let _ = events.send(LifecycleEvent::from_pair(audit, container));
                }
                Transition::Skipped { current } => {
                    debug!(audit_id = %audit.id, %current, "activation skipped");
                }
            }
        });

        let mut scheduled = self.scheduled.lock().await;
        scheduled.retain(|h| !h.is_finished());
        scheduled.push(handle);
    }

    fn publish(&self, audit: &Audit, container: &Container) {
        // No subscribers is the common case; a send error is expected then.
        let _ = self.events.send(LifecycleEvent::from_pair(audit, container));
    }
}
