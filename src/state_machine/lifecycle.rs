use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::audit::{Audit, AuditResults, AuditStatus};
use super::container::Container;

/// The result of evaluating a lifecycle rule against an audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The audit moved and its container followed where the rules allow.
    Applied { from: AuditStatus, to: AuditStatus },
    /// The rule did not apply to the audit's current status; nothing changed.
    Skipped { current: AuditStatus },
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied { .. })
    }
}

/// What the scanning backend reports when a running audit finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionOutcome {
    Completed {
        #[serde(default)]
        results: Option<AuditResults>,
    },
    Failed,
}

/// Drives an audit and its container through their correlated lifecycles.
pub struct Lifecycle;

impl Lifecycle {
    /// Deferred PENDING → RUNNING step. Re-checks the current status so a
    /// timer that fires after a cancellation leaves the audit alone.
    pub fn activate(audit: &mut Audit, container: &mut Container) -> Transition {
        match audit.status {
            AuditStatus::Pending => Self::apply(audit, container, AuditStatus::Running),
            current => Transition::Skipped { current },
        }
    }

    /// PENDING or RUNNING → CANCELLED, terminating the container.
    /// Already-finished audits are skipped.
    pub fn cancel(audit: &mut Audit, container: &mut Container) -> Transition {
        if audit.status.is_terminal() {
            return Transition::Skipped {
                current: audit.status,
            };
        }
        Self::apply(audit, container, AuditStatus::Cancelled)
    }

    /// RUNNING → COMPLETED | FAILED as reported by the scanning backend.
    ///
    /// Results are attached only on successful completion.
    pub fn complete(
        audit: &mut Audit,
        container: &mut Container,
        outcome: CompletionOutcome,
    ) -> Transition {
        if audit.status != AuditStatus::Running {
            return Transition::Skipped {
                current: audit.status,
            };
        }
        match outcome {
            CompletionOutcome::Completed { results } => {
                audit.results = results;
                Self::apply(audit, container, AuditStatus::Completed)
            }
            CompletionOutcome::Failed => Self::apply(audit, container, AuditStatus::Failed),
        }
    }

    fn apply(audit: &mut Audit, container: &mut Container, to: AuditStatus) -> Transition {
        let from = audit.status;
        let now = Utc::now();

        audit.status = to;
        audit.updated_at = now;
        if to.is_terminal() {
            audit.completed_at = Some(now);
        }

        if let Some(next) = container.status.follow(to) {
            container.status = next;
        }

        Transition::Applied { from, to }
    }
}
