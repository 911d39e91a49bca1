//! # Task Registry
//!
//! Shared state store for task records. Workers are the only writers; the
//! status facade reads. Transitions are enforced here: a record in a
//! terminal state is never modified again.

use dashmap::DashMap;

use crate::queue::types::{TaskId, TaskRecord, TaskState};

/// Concurrent map of task id to record
#[derive(Debug, Default)]
pub struct TaskRegistry {
    records: DashMap<TaskId, TaskRecord>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly enqueued task in `Pending`
    pub fn insert_pending(&self, id: TaskId) {
        self.records.insert(id, TaskRecord::pending(id));
    }

    /// Transition to `Progress` on worker pickup
    ///
    /// A no-op when the record is already terminal or unknown.
    pub fn mark_progress(&self, id: TaskId) {
        if let Some(mut record) = self.records.get_mut(&id) {
            if !record.state.is_terminal() {
                record.state = TaskState::Progress;
            }
        }
    }

    /// Record terminal success with the structured result payload
    pub fn mark_success(&self, id: TaskId, result: serde_json::Value) {
        if let Some(mut record) = self.records.get_mut(&id) {
            if !record.state.is_terminal() {
                record.state = TaskState::Success;
                record.result = Some(result);
                record.error = None;
            }
        }
    }

    /// Record terminal failure with the error message
    pub fn mark_failure(&self, id: TaskId, error: impl Into<String>) {
        if let Some(mut record) = self.records.get_mut(&id) {
            if !record.state.is_terminal() {
                record.state = TaskState::Failure;
                record.error = Some(error.into());
                record.result = None;
            }
        }
    }

    /// Snapshot of a record, if the id is known
    pub fn get(&self, id: TaskId) -> Option<TaskRecord> {
        self.records.get(&id).map(|r| r.value().clone())
    }

    /// Number of tracked tasks (for tests and diagnostics)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lifecycle_transitions() {
        let registry = TaskRegistry::new();
        let id = TaskId::new();

        registry.insert_pending(id);
        assert_eq!(registry.get(id).unwrap().state, TaskState::Pending);

        registry.mark_progress(id);
        assert_eq!(registry.get(id).unwrap().state, TaskState::Progress);

        registry.mark_success(id, json!({"temp": 15}));
        let record = registry.get(id).unwrap();
        assert_eq!(record.state, TaskState::Success);
        assert_eq!(record.result, Some(json!({"temp": 15})));
        assert!(record.error.is_none());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let registry = TaskRegistry::new();
        let id = TaskId::new();

        registry.insert_pending(id);
        registry.mark_failure(id, "upstream 500");

        // No transition out of a terminal state
        registry.mark_progress(id);
        registry.mark_success(id, json!({}));

        let record = registry.get(id).unwrap();
        assert_eq!(record.state, TaskState::Failure);
        assert_eq!(record.error.as_deref(), Some("upstream 500"));
        assert!(record.result.is_none());
    }

    #[test]
    fn test_unknown_id_reads_as_none() {
        let registry = TaskRegistry::new();
        assert!(registry.get(TaskId::new()).is_none());

        // Transitions on unknown ids are silently ignored
        registry.mark_progress(TaskId::new());
        assert!(registry.is_empty());
    }
}
