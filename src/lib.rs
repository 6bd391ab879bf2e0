//! scandeck: lifecycle orchestrator behind the security audit dashboard.
//!
//! Starting a scan creates an [`Audit`](state_machine::Audit) and its
//! [`Container`](state_machine::Container) together. A deferred activation
//! moves the pair from PENDING/CREATING to RUNNING, cancellation terminates
//! it, and the query layer reads whatever state currently holds.

pub mod api;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod query;
pub mod state_machine;
pub mod store;

pub use error::{Result, ScanDeckError};
pub use orchestrator::{AuditOrchestrator, LifecycleEvent};
