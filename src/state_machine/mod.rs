mod audit;
mod container;
mod lifecycle;

pub use audit::{
    Audit, AuditLanguage, AuditResults, AuditStatus, AuditType, Dependency, Port, Severity,
    Vulnerability,
};
pub use container::{
    Container, ContainerStatus, GENERIC_AUDIT_IMAGE, NODEJS_AUDIT_IMAGE, PORT_SCAN_IMAGE,
    PYTHON_AUDIT_IMAGE, resolve_image,
};
pub use lifecycle::{CompletionOutcome, Lifecycle, Transition};
