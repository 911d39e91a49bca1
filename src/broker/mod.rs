//! # Message Broker Bridge
//!
//! Producer and consumer halves of the RabbitMQ path, built on the `lapin`
//! crate. One durable direct exchange carries all task-request messages;
//! each consumer owns one durable queue bound with exactly one routing key,
//! so a message published with key `R` reaches only queues bound with `R`.
//!
//! Messages are published persistent (delivery mode 2) and consumed with
//! prefetch 1: at most one unacknowledged message is in flight per consumer,
//! trading throughput for predictable ordering and redelivery-on-crash.

mod consumer;
mod producer;

pub use consumer::{decode_request, disposition, ConsumerHandle, Disposition, TaskConsumer};
pub use producer::TaskProducer;

/// The fixed direct exchange all task-request messages flow through
pub const EXCHANGE_NAME: &str = "api_tasks_exchange";
