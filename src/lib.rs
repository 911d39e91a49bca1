//! # api-tasks
//!
//! Asynchronous dispatch core for slow, rate-limited third-party API calls
//! (weather, news). Decouples request-facing code from the actual fetch via
//! two equivalent front-ends over one execution template:
//!
//! - **Queue-backed executor** ([`queue::TaskQueue`]): enqueue a task, get an
//!   opaque id back immediately, poll its state through
//!   [`queue::TaskStatusFacade`].
//! - **Broker bridge** ([`broker::TaskProducer`] / [`broker::TaskConsumer`]):
//!   publish a persistent message to a durable direct exchange; a standalone
//!   consumer process executes it and acks only after the result is
//!   persisted.
//!
//! Both paths share the same leaves: credential resolution from the
//! environment ([`credentials`]), a bounded-timeout HTTP client
//! ([`api::HttpUpstreamClient`]) and idempotent-by-overwrite result files
//! ([`storage::ResultStore`]).
//!
//! Delivery is at-least-once on the queue path and at-most-once after a
//! failure on the broker path: a message that fails processing is rejected
//! without requeue. Exactly-once semantics are out of scope.

pub mod api;
pub mod broker;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod queue;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiAlias, ApiTaskHandler, TaskOutcome, TaskRequest};
pub use config::{BrokerConfig, WorkerConfig};
pub use errors::{TaskError, TaskResult};
pub use queue::{TaskId, TaskQueue, TaskRegistry, TaskState, TaskStatus, TaskStatusFacade};
pub use storage::ResultStore;
