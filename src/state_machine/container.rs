use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::audit::{Audit, AuditLanguage, AuditStatus, AuditType};

pub const PORT_SCAN_IMAGE: &str = "python-nmap:latest";
pub const PYTHON_AUDIT_IMAGE: &str = "pip-audit:latest";
pub const NODEJS_AUDIT_IMAGE: &str = "osv-scanner:latest";
pub const GENERIC_AUDIT_IMAGE: &str = "generic-audit:latest";

/// Lifecycle status of the simulated execution environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerStatus {
    Creating,
    Running,
    Completed,
    Failed,
    Terminated,
}

impl ContainerStatus {
    pub fn is_active(self) -> bool {
        matches!(self, ContainerStatus::Creating | ContainerStatus::Running)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    /// The status a container moves to when its audit enters `audit`, or
    /// `None` when that audit transition leaves the container untouched.
    ///
    /// TERMINATED is reserved for cancellation; normal completion maps to
    /// COMPLETED/FAILED.
    pub fn follow(self, audit: AuditStatus) -> Option<ContainerStatus> {
        match (self, audit) {
            (ContainerStatus::Creating, AuditStatus::Running) => Some(ContainerStatus::Running),
            (ContainerStatus::Creating | ContainerStatus::Running, AuditStatus::Cancelled) => {
                Some(ContainerStatus::Terminated)
            }
            (ContainerStatus::Running, AuditStatus::Completed) => Some(ContainerStatus::Completed),
            (ContainerStatus::Running, AuditStatus::Failed) => Some(ContainerStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerStatus::Creating => write!(f, "CREATING"),
            ContainerStatus::Running => write!(f, "RUNNING"),
            ContainerStatus::Completed => write!(f, "COMPLETED"),
            ContainerStatus::Failed => write!(f, "FAILED"),
            ContainerStatus::Terminated => write!(f, "TERMINATED"),
        }
    }
}

/// Picks the scanner image for an audit. Unmapped combinations fall back to
/// the generic image.
pub fn resolve_image(audit_type: AuditType, language: Option<AuditLanguage>) -> &'static str {
    match (audit_type, language) {
        (AuditType::PortScan, _) => PORT_SCAN_IMAGE,
        (AuditType::DependencyScan, Some(AuditLanguage::Python)) => PYTHON_AUDIT_IMAGE,
        (AuditType::DependencyScan, Some(AuditLanguage::Nodejs)) => NODEJS_AUDIT_IMAGE,
        _ => GENERIC_AUDIT_IMAGE,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub id: String,
    pub status: ContainerStatus,
    pub audit_id: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

impl Container {
    /// Builds the CREATING container that backs `audit`.
    pub fn for_audit(audit: &Audit) -> Self {
        Self {
            id: audit.container_id.clone(),
            status: ContainerStatus::Creating,
            audit_id: audit.id.clone(),
            image: resolve_image(audit.audit_type, audit.language).to_string(),
            created_at: audit.created_at,
        }
    }
}
