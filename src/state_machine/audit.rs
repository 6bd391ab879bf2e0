use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of check an audit performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditType {
    PortScan,
    DependencyScan,
    ConfigAudit,
    ComplianceCheck,
}

impl fmt::Display for AuditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditType::PortScan => write!(f, "PORT_SCAN"),
            AuditType::DependencyScan => write!(f, "DEPENDENCY_SCAN"),
            AuditType::ConfigAudit => write!(f, "CONFIG_AUDIT"),
            AuditType::ComplianceCheck => write!(f, "COMPLIANCE_CHECK"),
        }
    }
}

/// Lifecycle status of an audit.
///
/// PENDING → RUNNING → COMPLETED | FAILED, with CANCELLED reachable from
/// either of the first two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl AuditStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AuditStatus::Completed | AuditStatus::Failed | AuditStatus::Cancelled
        )
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditStatus::Pending => write!(f, "PENDING"),
            AuditStatus::Running => write!(f, "RUNNING"),
            AuditStatus::Completed => write!(f, "COMPLETED"),
            AuditStatus::Failed => write!(f, "FAILED"),
            AuditStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Ecosystem of the project a dependency scan inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditLanguage {
    Python,
    Nodejs,
}

impl fmt::Display for AuditLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditLanguage::Python => write!(f, "PYTHON"),
            AuditLanguage::Nodejs => write!(f, "NODEJS"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: String,
    pub severity: Severity,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cve: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub number: u16,
    pub protocol: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
}

/// Findings attached by the scanning backend when an audit completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default)]
    pub ports: Vec<Port>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

/// A requested scan or check, correlated 1:1 with a [`Container`](super::Container).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    pub id: String,
    #[serde(rename = "type")]
    pub audit_type: AuditType,
    pub status: AuditStatus,
    pub target: String,
    pub language: Option<AuditLanguage>,
    pub container_id: String,
    pub results: Option<AuditResults>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Audit {
    /// Creates a PENDING audit with a fresh identifier. The container
    /// identifier is derived from the audit's own id, so the pair is
    /// correlated from the moment of creation.
    pub fn new(audit_type: AuditType, target: String, language: Option<AuditLanguage>) -> Self {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let container_id = format!("container_{id}");
        Self {
            id,
            audit_type,
            status: AuditStatus::Pending,
            target,
            language,
            container_id,
            results: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}
