//! # Result Store
//!
//! Writes fetched API responses to durable local storage under a
//! deterministic filename derived from the request's discriminating
//! parameters, e.g. `weather_Kazan_RU.json`.
//!
//! The storage root is an explicit constructor argument rather than global
//! process state, so every worker and every test can point at its own
//! directory. Repeat writes for the same key overwrite: task output is
//! idempotent-by-overwrite, not additive, and concurrent writers race with
//! last-writer-wins.
//!
//! The write is not atomic. A crash mid-write can leave a partial file, and
//! callers acknowledge success without re-reading the file, so a corrupted
//! result is a possible (rare) terminal state under at-least-once delivery.

use std::path::{Path, PathBuf};

use crate::api::ApiAlias;
use crate::errors::{TaskError, TaskResult};

/// Default storage root, relative to the process working directory
pub const DEFAULT_RESPONSES_DIR: &str = "api_responses";

/// File store for upstream JSON payloads
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(DEFAULT_RESPONSES_DIR)
    }
}

impl ResultStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write, not here.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The configured storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic path for an `(alias, key_parts)` pair
    ///
    /// Key parts are joined verbatim; distinct requests sharing the
    /// discriminating parameters collide by design (last-writer-wins).
    pub fn path_for(&self, alias: ApiAlias, key_parts: &[&str]) -> PathBuf {
        let mut name = alias.as_str().to_string();
        for part in key_parts {
            name.push('_');
            name.push_str(part);
        }
        name.push_str(".json");
        self.root.join(name)
    }

    /// Serialize `payload` as pretty-printed UTF-8 JSON (non-ASCII preserved)
    /// and write it to the deterministic path, overwriting any previous file
    pub async fn persist(
        &self,
        alias: ApiAlias,
        key_parts: &[&str],
        payload: &serde_json::Value,
    ) -> TaskResult<PathBuf> {
        let path = self.path_for(alias, key_parts);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| TaskError::persistence(self.root.display().to_string(), e.to_string()))?;

        let body = serde_json::to_string_pretty(payload)
            .map_err(|e| TaskError::serialization(e.to_string()))?;

        tokio::fs::write(&path, body)
            .await
            .map_err(|e| TaskError::persistence(path.display().to_string(), e.to_string()))?;

        tracing::info!(api_alias = %alias, file = %path.display(), "response saved");
        Ok(path)
    }
}
