//! In-memory workflow store with optimistic concurrency.
//!
//! Every stored workflow carries a version counter. Editors check out an
//! owned copy, mutate it, and commit it back with the version they started
//! from; a commit based on a stale version is rejected instead of silently
//! overwriting someone else's edit.

use crate::definition::{Workflow, WorkflowSummary};
use crate::document::WorkflowDocument;
use crate::error::StoreError;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use workflow_designer_core::{Result, WorkflowId};

/// A value paired with the store version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

#[derive(Debug, Clone)]
struct Entry {
    version: u64,
    workflow: Workflow,
}

/// Holds workflows by ID.
#[derive(Debug, Clone, Default)]
pub struct WorkflowStore {
    entries: HashMap<WorkflowId, Entry>,
}

impl WorkflowStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and stores a new draft workflow at version 1.
    pub fn create(&mut self, name: impl Into<String>) -> WorkflowId {
        let workflow = Workflow::new(name);
        let workflow_id = workflow.id();
        self.entries.insert(
            workflow_id,
            Entry {
                version: 1,
                workflow,
            },
        );
        info!(%workflow_id, "workflow created");
        workflow_id
    }

    /// Returns a stored workflow and its version.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no workflow has this ID.
    pub fn get(&self, workflow_id: WorkflowId) -> Result<Versioned<&Workflow>, StoreError> {
        let entry = self.entry(workflow_id)?;
        Ok(Versioned {
            version: entry.version,
            value: &entry.workflow,
        })
    }

    /// Returns an owned copy of a stored workflow for editing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no workflow has this ID.
    pub fn checkout(&self, workflow_id: WorkflowId) -> Result<Versioned<Workflow>, StoreError> {
        let entry = self.entry(workflow_id)?;
        Ok(Versioned {
            version: entry.version,
            value: entry.workflow.clone(),
        })
    }

    /// Replaces a stored workflow with an edited copy.
    ///
    /// Returns the new version.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the workflow isn't stored, or `VersionConflict`
    /// if it changed since `expected_version` was read.
    pub fn commit(&mut self, workflow: Workflow, expected_version: u64) -> Result<u64, StoreError> {
        let workflow_id = workflow.id();
        let entry = self
            .entries
            .get_mut(&workflow_id)
            .ok_or(StoreError::NotFound { workflow_id })?;

        if entry.version != expected_version {
            warn!(
                %workflow_id,
                expected = expected_version,
                actual = entry.version,
                "stale commit rejected"
            );
            return Err(StoreError::VersionConflict {
                workflow_id,
                expected: expected_version,
                actual: entry.version,
            }
            .into());
        }

        entry.version += 1;
        entry.workflow = workflow;
        debug!(%workflow_id, version = entry.version, "workflow committed");
        Ok(entry.version)
    }

    /// Removes a workflow from the store.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no workflow has this ID.
    pub fn remove(&mut self, workflow_id: WorkflowId) -> Result<Workflow, StoreError> {
        let entry = self
            .entries
            .remove(&workflow_id)
            .ok_or(StoreError::NotFound { workflow_id })?;
        info!(%workflow_id, "workflow removed");
        Ok(entry.workflow)
    }

    /// Lists summaries of every stored workflow, most recently updated first.
    #[must_use]
    pub fn list(&self) -> Vec<WorkflowSummary> {
        let mut summaries: Vec<_> = self
            .entries
            .values()
            .map(|entry| entry.workflow.summary())
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        summaries
    }

    /// Loads a document into the store at version 1.
    ///
    /// # Errors
    ///
    /// Returns `Import` if the document is inconsistent, or `AlreadyExists`
    /// if a workflow with its ID is already stored.
    pub fn import(&mut self, document: WorkflowDocument) -> Result<WorkflowId, StoreError> {
        let workflow_id = document.id;
        if self.entries.contains_key(&workflow_id) {
            return Err(StoreError::AlreadyExists { workflow_id }.into());
        }

        let workflow = Workflow::from_document(document).map_err(StoreError::Import)?;
        self.entries.insert(
            workflow_id,
            Entry {
                version: 1,
                workflow,
            },
        );
        info!(%workflow_id, "workflow imported");
        Ok(workflow_id)
    }

    /// Returns the document form of a stored workflow.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no workflow has this ID.
    pub fn export(&self, workflow_id: WorkflowId) -> Result<WorkflowDocument, StoreError> {
        Ok(self.entry(workflow_id)?.workflow.to_document())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, workflow_id: WorkflowId) -> Result<&Entry, StoreError> {
        Ok(self
            .entries
            .get(&workflow_id)
            .ok_or(StoreError::NotFound { workflow_id })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::WorkflowStatus;
    use crate::error::ErrorKind;
    use crate::node::{Position, TriggerConfig};

    #[test]
    fn create_then_get() {
        let mut store = WorkflowStore::new();
        let id = store.create("Welcome series");

        let stored = store.get(id).expect("stored");
        assert_eq!(stored.version, 1);
        assert_eq!(stored.value.name(), "Welcome series");
        assert_eq!(stored.value.status(), WorkflowStatus::Draft);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_workflow_is_not_found() {
        let store = WorkflowStore::new();
        let err = store.get(WorkflowId::new()).unwrap_err();
        assert_eq!(err.current_context().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn commit_bumps_the_version() {
        let mut store = WorkflowStore::new();
        let id = store.create("Edit me");

        let Versioned { version, value: mut workflow } = store.checkout(id).expect("checkout");
        workflow
            .add_node(TriggerConfig::Request, Position::default())
            .expect("trigger");
        let next = store.commit(workflow, version).expect("commit");

        assert_eq!(next, 2);
        let stored = store.get(id).expect("stored");
        assert_eq!(stored.version, 2);
        assert_eq!(stored.value.list_nodes().len(), 1);
    }

    #[test]
    fn stale_commit_is_rejected() {
        let mut store = WorkflowStore::new();
        let id = store.create("Contended");

        let first = store.checkout(id).expect("first checkout");
        let second = store.checkout(id).expect("second checkout");
        store.commit(first.value, first.version).expect("first commit");

        let err = store.commit(second.value, second.version).unwrap_err();
        assert_eq!(
            err.current_context(),
            &StoreError::VersionConflict {
                workflow_id: id,
                expected: 1,
                actual: 2,
            }
        );
        assert_eq!(err.current_context().kind(), ErrorKind::VersionConflict);
    }

    #[test]
    fn commit_of_unknown_workflow_fails() {
        let mut store = WorkflowStore::new();
        let err = store.commit(Workflow::new("Stray"), 1).unwrap_err();
        assert_eq!(err.current_context().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn list_puts_recent_edits_first() {
        let mut store = WorkflowStore::new();
        let older = store.create("Older");
        let newer = store.create("Newer");

        let Versioned { version, value: mut workflow } = store.checkout(older).expect("checkout");
        workflow.rename("Older, renamed").expect("rename");
        store.commit(workflow, version).expect("commit");

        let order: Vec<_> = store.list().into_iter().map(|s| s.id).collect();
        assert_eq!(order, vec![older, newer]);
    }

    #[test]
    fn export_then_import_into_another_store() {
        let mut source = WorkflowStore::new();
        let id = source.create("Portable");
        let document = source.export(id).expect("export");

        let mut target = WorkflowStore::new();
        assert_eq!(target.import(document.clone()).expect("import"), id);
        assert_eq!(target.get(id).expect("stored").version, 1);

        let err = target.import(document).unwrap_err();
        assert_eq!(err.current_context().kind(), ErrorKind::DuplicateId);
    }

    #[test]
    fn corrupt_import_is_reported() {
        let mut store = WorkflowStore::new();
        let mut document = Workflow::new("Broken").to_document();
        document.updated_at = document.created_at - chrono::Duration::seconds(5);

        let err = store.import(document).unwrap_err();
        assert_eq!(err.current_context().kind(), ErrorKind::CorruptDocument);
        assert!(store.is_empty());
    }

    #[test]
    fn remove_drops_the_workflow() {
        let mut store = WorkflowStore::new();
        let id = store.create("Short lived");
        let removed = store.remove(id).expect("remove");
        assert_eq!(removed.id(), id);
        assert!(store.get(id).is_err());
        assert!(store.remove(id).is_err());
    }
}
