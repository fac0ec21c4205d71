//! Declared state of a table resource
//!
//! [`ResourceData`] carries what the caller wants (`desired`), what was last
//! observed (`prior`), and the resource identifier, which is always the
//! current table name. After every successful verb the observed state
//! overwrites both sides.

use pgconverge_core::{ColumnDescriptor, TableSpec};

/// Where a resource is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No table is known for this resource
    Absent,

    /// The table was created but its columns are not converged yet
    Created,

    /// State was read back from the catalog
    Converged,
}

/// Declared state container for one table
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceData {
    id: Option<String>,
    prior: Option<TableSpec>,
    desired: TableSpec,
    new_resource: bool,
    phase: Phase,
    applied: Vec<String>,
}

impl ResourceData {
    /// A resource that does not exist yet
    pub fn new_resource(desired: TableSpec) -> Self {
        Self {
            id: None,
            prior: None,
            desired,
            new_resource: true,
            phase: Phase::Absent,
            applied: Vec::new(),
        }
    }

    /// A resource with known prior state and a new desired state
    pub fn existing(id: impl Into<String>, prior: TableSpec, desired: TableSpec) -> Self {
        Self {
            id: Some(id.into()),
            prior: Some(prior),
            desired,
            new_resource: false,
            phase: Phase::Converged,
            applied: Vec::new(),
        }
    }

    /// A resource known only by its identifier, as on import
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            desired: TableSpec::new(id.clone()),
            id: Some(id),
            prior: None,
            new_resource: false,
            phase: Phase::Absent,
            applied: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Forget the identifier; the resource is treated as gone
    pub fn clear_id(&mut self) {
        self.id = None;
        self.phase = Phase::Absent;
    }

    pub fn is_new_resource(&self) -> bool {
        self.new_resource
    }

    /// Desired state
    pub fn get(&self) -> &TableSpec {
        &self.desired
    }

    /// Adopt observed state as both prior and desired
    pub fn set(&mut self, observed: TableSpec) {
        self.prior = Some(observed.clone());
        self.desired = observed;
        self.phase = Phase::Converged;
    }

    /// `(old, new)` table name when the desired name differs from the prior one
    pub fn name_change(&self) -> Option<(&str, &str)> {
        let prior = self.prior.as_ref()?;
        (prior.name != self.desired.name)
            .then(|| (prior.name.as_str(), self.desired.name.as_str()))
    }

    /// `(old, new)` column lists; old is empty when nothing was observed yet
    pub fn column_change(&self) -> (&[ColumnDescriptor], &[ColumnDescriptor]) {
        let old = self
            .prior
            .as_ref()
            .map(|prior| prior.columns.as_slice())
            .unwrap_or(&[]);
        (old, self.desired.columns.as_slice())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Statements executed by the last verb, in order
    pub fn applied_statements(&self) -> &[String] {
        &self.applied
    }

    pub(crate) fn mark_created(&mut self) {
        self.new_resource = false;
        self.phase = Phase::Created;
    }

    pub(crate) fn record_statement(&mut self, sql: String) {
        self.applied.push(sql);
    }

    pub(crate) fn clear_applied(&mut self) {
        self.applied.clear();
    }
}
