//! In-memory entity store for audits and their containers.
//!
//! Records are kept in insertion order with a keyed index for O(1) lookup.
//! The store has no interior locking; the orchestrator owns it behind a
//! single `RwLock`, which makes every `&mut self` method a single-writer
//! critical section.

use std::collections::HashMap;

use crate::error::{Result, ScanDeckError};
use crate::state_machine::{Audit, Container};

#[derive(Debug, Default)]
pub struct EntityStore {
    audits: Vec<Audit>,
    audit_index: HashMap<String, usize>,
    containers: Vec<Container>,
    container_index: HashMap<String, usize>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_audit(&self, id: &str) -> Option<&Audit> {
        self.audit_index.get(id).and_then(|&i| self.audits.get(i))
    }

    pub fn get_container(&self, id: &str) -> Option<&Container> {
        self.container_index
            .get(id)
            .and_then(|&i| self.containers.get(i))
    }

    /// Inserts or replaces an audit by id. A replaced record keeps its
    /// original position in iteration order.
    pub fn upsert_audit(&mut self, audit: Audit) {
        match self.audit_index.get(&audit.id) {
            Some(&i) => self.audits[i] = audit,
            None => {
                self.audit_index.insert(audit.id.clone(), self.audits.len());
                self.audits.push(audit);
            }
        }
    }

    pub fn upsert_container(&mut self, container: Container) {
        match self.container_index.get(&container.id) {
            Some(&i) => self.containers[i] = container,
            None => {
                self.container_index
                    .insert(container.id.clone(), self.containers.len());
                self.containers.push(container);
            }
        }
    }

    /// Inserts a freshly created audit together with its container.
    ///
    /// Either both records land or neither does. Identifiers are never
    /// reused, so an id that is already present is rejected.
    pub fn insert_pair(&mut self, audit: Audit, container: Container) -> Result<()> {
        if self.audit_index.contains_key(&audit.id) {
            return Err(ScanDeckError::DuplicateId(audit.id));
        }
        if self.container_index.contains_key(&container.id) {
            return Err(ScanDeckError::DuplicateId(container.id));
        }
        self.upsert_audit(audit);
        self.upsert_container(container);
        Ok(())
    }

    /// Mutable access to an audit and its correlated container, for in-place
    /// transitions. Returns `None` if either record is missing.
    pub fn pair_mut(&mut self, audit_id: &str) -> Option<(&mut Audit, &mut Container)> {
        let audit_idx = *self.audit_index.get(audit_id)?;
        let audit = self.audits.get_mut(audit_idx)?;
        let container_idx = *self.container_index.get(&audit.container_id)?;
        let container = self.containers.get_mut(container_idx)?;
        Some((audit, container))
    }

    pub fn audits(&self) -> impl Iterator<Item = &Audit> {
        self.audits.iter()
    }

    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.iter()
    }

    pub fn audit_count(&self) -> usize {
        self.audits.len()
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }
}
