//! # Queue-Backed Task Executor
//!
//! The submit-and-poll front-end: callers enqueue a [`TaskRequest`] and get
//! an opaque [`TaskId`] back immediately; a pool of workers drains the queue,
//! transitions each task's [`TaskRecord`] through its lifecycle and records
//! the terminal result. The [`TaskStatusFacade`] is the read-only view the
//! calling layer polls.
//!
//! [`TaskRequest`]: crate::api::TaskRequest

mod executor;
mod registry;
mod status;
mod types;

pub use executor::TaskQueue;
pub use registry::TaskRegistry;
pub use status::{TaskStatus, TaskStatusFacade};
pub use types::{TaskId, TaskRecord, TaskState};
