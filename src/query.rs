use serde::{Deserialize, Serialize};

use crate::state_machine::{Audit, AuditLanguage, AuditStatus, AuditType, Container};
use crate::store::EntityStore;

/// Conjunctive filter over audits. Absent fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AuditFilter {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub audit_type: Option<AuditType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AuditStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<AuditLanguage>,
    /// Case-sensitive substring of the audit target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl AuditFilter {
    pub fn with_type(mut self, audit_type: AuditType) -> Self {
        self.audit_type = Some(audit_type);
        self
    }

    pub fn with_status(mut self, status: AuditStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_language(mut self, language: AuditLanguage) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn matches(&self, audit: &Audit) -> bool {
        if self.audit_type.is_some_and(|t| t != audit.audit_type) {
            return false;
        }
        if self.status.is_some_and(|s| s != audit.status) {
            return false;
        }
        // An audit without a language never matches a language constraint.
        if self.language.is_some() && self.language != audit.language {
            return false;
        }
        if let Some(needle) = &self.target
            && !audit.target.contains(needle.as_str())
        {
            return false;
        }
        true
    }
}

/// Aggregate view over the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub active_containers: usize,
}

/// Audits matching `filter`, in insertion order.
pub fn list_audits(store: &EntityStore, filter: Option<&AuditFilter>) -> Vec<Audit> {
    store
        .audits()
        .filter(|audit| filter.is_none_or(|f| f.matches(audit)))
        .cloned()
        .collect()
}

pub fn get_audit(store: &EntityStore, id: &str) -> Option<Audit> {
    store.get_audit(id).cloned()
}

pub fn get_container(store: &EntityStore, id: &str) -> Option<Container> {
    store.get_container(id).cloned()
}

/// Containers still CREATING or RUNNING, in insertion order.
pub fn list_active_containers(store: &EntityStore) -> Vec<Container> {
    store
        .containers()
        .filter(|c| c.status.is_active())
        .cloned()
        .collect()
}

pub fn audit_stats(store: &EntityStore) -> AuditStats {
    let mut stats = AuditStats {
        total: store.audit_count(),
        ..Default::default()
    };
    for audit in store.audits() {
        match audit.status {
            AuditStatus::Pending => stats.pending += 1,
            AuditStatus::Running => stats.running += 1,
            AuditStatus::Completed => stats.completed += 1,
            AuditStatus::Failed => stats.failed += 1,
            AuditStatus::Cancelled => stats.cancelled += 1,
        }
    }
    stats.active_containers = store.containers().filter(|c| c.status.is_active()).count();
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::{CompletionOutcome, ContainerStatus, Lifecycle};

    fn seed(store: &mut EntityStore, audit: Audit) -> String {
        let container = Container::for_audit(&audit);
        let id = audit.id.clone();
        store.insert_pair(audit, container).unwrap();
        id
    }

    fn port_scan(target: &str) -> Audit {
        Audit::new(AuditType::PortScan, target.into(), None)
    }

    fn dependency_scan(language: AuditLanguage, path: &str) -> Audit {
        Audit::new(AuditType::DependencyScan, path.into(), Some(language))
    }

    /// Store with one audit in each of PENDING, RUNNING, CANCELLED, COMPLETED.
    fn mixed_store() -> (EntityStore, Vec<String>) {
        let mut store = EntityStore::new();
        let pending = seed(&mut store, port_scan("web-server"));
        let running = seed(&mut store, port_scan("db-server"));
        let cancelled = seed(&mut store, dependency_scan(AuditLanguage::Python, "/srv/web"));
        let completed = seed(&mut store, dependency_scan(AuditLanguage::Nodejs, "/app"));

        let (a, c) = store.pair_mut(&running).unwrap();
        Lifecycle::activate(a, c);
        let (a, c) = store.pair_mut(&cancelled).unwrap();
        Lifecycle::cancel(a, c);
        let (a, c) = store.pair_mut(&completed).unwrap();
        Lifecycle::activate(a, c);
        Lifecycle::complete(a, c, CompletionOutcome::Completed { results: None });

        (store, vec![pending, running, cancelled, completed])
    }

    #[test]
    fn no_filter_returns_everything_in_order() {
        let (store, ids) = mixed_store();
        let all: Vec<String> = list_audits(&store, None).into_iter().map(|a| a.id).collect();
        assert_eq!(all, ids);

        let empty = AuditFilter::default();
        assert_eq!(list_audits(&store, Some(&empty)).len(), 4);
    }

    #[test]
    fn status_filter_returns_exact_subset() {
        let (store, _) = mixed_store();
        for status in [
            AuditStatus::Pending,
            AuditStatus::Running,
            AuditStatus::Completed,
            AuditStatus::Failed,
            AuditStatus::Cancelled,
        ] {
            let filter = AuditFilter::default().with_status(status);
            let listed = list_audits(&store, Some(&filter));
            let expected: Vec<&Audit> = store.audits().filter(|a| a.status == status).collect();
            assert_eq!(listed.len(), expected.len(), "status {status}");
            assert!(listed.iter().all(|a| a.status == status));
        }
    }

    #[test]
    fn target_filter_is_substring_match() {
        let (store, _) = mixed_store();
        let filter = AuditFilter::default().with_target("web");
        let targets: Vec<String> = list_audits(&store, Some(&filter))
            .into_iter()
            .map(|a| a.target)
            .collect();
        assert_eq!(targets, vec!["web-server", "/srv/web"]);
    }

    #[test]
    fn target_filter_is_case_sensitive() {
        let (store, _) = mixed_store();
        let filter = AuditFilter::default().with_target("WEB");
        assert!(list_audits(&store, Some(&filter)).is_empty());
    }

    #[test]
    fn filters_combine_with_and() {
        let (store, _) = mixed_store();
        let filter = AuditFilter::default()
            .with_type(AuditType::DependencyScan)
            .with_target("web");
        let listed = list_audits(&store, Some(&filter));
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].target, "/srv/web");

        let filter = AuditFilter::default()
            .with_type(AuditType::PortScan)
            .with_status(AuditStatus::Completed);
        assert!(list_audits(&store, Some(&filter)).is_empty());
    }

    #[test]
    fn language_filter_skips_audits_without_language() {
        let (store, _) = mixed_store();
        let filter = AuditFilter::default().with_language(AuditLanguage::Nodejs);
        let listed = list_audits(&store, Some(&filter));
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].target, "/app");
    }

    #[test]
    fn active_containers_keep_insertion_order() {
        let (store, ids) = mixed_store();
        let active = list_active_containers(&store);
        let owners: Vec<&str> = active.iter().map(|c| c.audit_id.as_str()).collect();
        assert_eq!(owners, vec![ids[0].as_str(), ids[1].as_str()]);
        assert_eq!(active[0].status, ContainerStatus::Creating);
        assert_eq!(active[1].status, ContainerStatus::Running);
    }

    #[test]
    fn lookups_return_none_for_unknown_ids() {
        let (store, ids) = mixed_store();
        assert!(get_audit(&store, "missing").is_none());
        assert!(get_container(&store, "missing").is_none());
        let audit = get_audit(&store, &ids[0]).unwrap();
        assert!(get_container(&store, &audit.container_id).is_some());
    }

    #[test]
    fn stats_count_by_status() {
        let (store, _) = mixed_store();
        let stats = audit_stats(&store);
        assert_eq!(
            stats,
            AuditStats {
                total: 4,
                pending: 1,
                running: 1,
                completed: 1,
                failed: 0,
                cancelled: 1,
                active_containers: 2,
            }
        );
    }

    #[test]
    fn filter_deserializes_from_boundary_json() {
        let filter: AuditFilter =
            serde_json::from_str(r#"{"type":"PORT_SCAN","status":"RUNNING","target":"10."}"#)
                .unwrap();
        assert_eq!(
            filter,
            AuditFilter::default()
                .with_type(AuditType::PortScan)
                .with_status(AuditStatus::Running)
                .with_target("10.")
        );

        let bad: Result<AuditFilter, _> = serde_json::from_str(r#"{"status":"DONE"}"#);
        assert!(bad.is_err());
        let unknown: Result<AuditFilter, _> = serde_json::from_str(r#"{"owner":"me"}"#);
        assert!(unknown.is_err());
    }
}
