//! # External API Integration
//!
//! Types and logic for fetching third-party API data on behalf of a task:
//! the request/outcome types shared across both executors, the bounded
//! timeout HTTP client behind the [`UpstreamClient`] seam, and the
//! resolve-credential / fetch / persist template in [`ApiTaskHandler`].

mod client;
mod handlers;
mod types;

pub use client::{HttpUpstreamClient, UpstreamClient, UPSTREAM_TIMEOUT};
pub use handlers::ApiTaskHandler;
pub use types::{ApiAlias, TaskOutcome, TaskRequest};
