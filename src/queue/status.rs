//! # Task Status Facade
//!
//! Read-only view of task state for the calling layer. Shapes the registry
//! record into a state-specific payload and performs no caching or
//! transformation beyond that.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::queue::registry::TaskRegistry;
use crate::queue::types::{TaskId, TaskState};

/// Status payload returned to the caller, keyed by task state
///
/// - `Pending` carries only an informational message
/// - `Progress` carries current/total counters when the worker reported them
/// - `Success` carries the stored result payload
/// - `Failure` carries the error string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskStatus {
    fn bare(state: TaskState) -> Self {
        Self {
            state,
            message: None,
            current: None,
            total: None,
            result: None,
            error: None,
        }
    }
}

/// Read-only facade over the task registry
#[derive(Debug, Clone)]
pub struct TaskStatusFacade {
    registry: Arc<TaskRegistry>,
}

impl TaskStatusFacade {
    pub fn new(registry: Arc<TaskRegistry>) -> Self {
        Self { registry }
    }

    /// Current status for `id`
    ///
    /// An unknown id reads as `Pending`: the backing store keeps no tombstone
    /// for ids it has never seen, so "unknown" and "not started yet" are
    /// indistinguishable to the caller.
    pub fn status(&self, id: TaskId) -> TaskStatus {
        let Some(record) = self.registry.get(id) else {
            return TaskStatus {
                message: Some("Task is unknown or has not started yet".to_string()),
                ..TaskStatus::bare(TaskState::Pending)
            };
        };

        match record.state {
            TaskState::Pending => TaskStatus {
                message: Some("Task is waiting for execution".to_string()),
                ..TaskStatus::bare(TaskState::Pending)
            },
            // Progress counters are only present when the worker reported
            // them; the fetch-and-persist template does not, so they stay
            // absent here.
            TaskState::Progress => TaskStatus::bare(TaskState::Progress),
            TaskState::Success => TaskStatus {
                result: record.result,
                ..TaskStatus::bare(TaskState::Success)
            },
            TaskState::Failure => TaskStatus {
                error: record.error,
                ..TaskStatus::bare(TaskState::Failure)
            },
        }
    }
}
