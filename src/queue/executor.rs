//! # Task Queue Executor
//!
//! Submit-and-poll execution: `enqueue_*` registers a pending record and
//! returns the task id immediately; a pool of worker tasks drains the
//! channel, runs the fetch-and-persist template and records the terminal
//! state in the registry.
//!
//! Time limits follow the backing-queue convention: exceeding the soft limit
//! logs a warning and lets the task continue; exceeding the hard limit drops
//! the task future and records a timeout failure. There is no automatic
//! retry; a terminal record stays terminal.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{ApiTaskHandler, TaskRequest};
use crate::config::WorkerConfig;
use crate::errors::{TaskError, TaskResult};
use crate::queue::registry::TaskRegistry;
use crate::queue::types::TaskId;

/// Queue-backed task executor with an owned worker pool
pub struct TaskQueue {
    registry: Arc<TaskRegistry>,
    sender: mpsc::UnboundedSender<(TaskId, TaskRequest)>,
    workers: Vec<JoinHandle<()>>,
}

impl TaskQueue {
    /// Spawn `config.concurrency` workers sharing one handler instance
    pub fn new(handler: ApiTaskHandler, registry: Arc<TaskRegistry>, config: WorkerConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..config.concurrency.max(1))
            .map(|worker_id| {
                let handler = handler.clone();
                let registry = registry.clone();
                let receiver = receiver.clone();
                let config = config.clone();
                tokio::spawn(async move {
                    worker_loop(worker_id, handler, registry, receiver, config).await;
                })
            })
            .collect();

        Self {
            registry,
            sender,
            workers,
        }
    }

    /// The registry backing this queue (shared with the status facade)
    pub fn registry(&self) -> Arc<TaskRegistry> {
        self.registry.clone()
    }

    /// Enqueue an arbitrary request, returning the opaque task id
    pub fn enqueue(&self, request: TaskRequest) -> TaskResult<TaskId> {
        let id = TaskId::new();
        self.registry.insert_pending(id);
        self.sender
            .send((id, request))
            .map_err(|_| TaskError::broker("enqueue", "worker pool has shut down"))?;
        debug!(task_id = %id, "task enqueued");
        Ok(id)
    }

    /// Enqueue a weather fetch; `country` defaults to "RU"
    pub fn enqueue_weather(
        &self,
        city: impl Into<String>,
        country: Option<String>,
    ) -> TaskResult<TaskId> {
        self.enqueue(TaskRequest::weather(city, country))
    }

    /// Enqueue a news fetch; `language` defaults to "en"
    pub fn enqueue_news(
        &self,
        query: impl Into<String>,
        language: Option<String>,
    ) -> TaskResult<TaskId> {
        self.enqueue(TaskRequest::news(query, language))
    }

    /// Stop accepting work and wait for in-flight tasks to finish
    pub async fn shutdown(self) {
        drop(self.sender);
        for worker in self.workers {
            let _ = worker.await;
        }
        info!("task queue workers stopped");
    }
}

async fn worker_loop(
    worker_id: usize,
    handler: ApiTaskHandler,
    registry: Arc<TaskRegistry>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<(TaskId, TaskRequest)>>>,
    config: WorkerConfig,
) {
    debug!(worker_id, "worker started");
    loop {
        // Hold the lock only for the receive; execution runs unlocked so
        // other workers can pick up tasks concurrently.
        let next = { receiver.lock().await.recv().await };
        let Some((id, request)) = next else {
            debug!(worker_id, "queue closed, worker exiting");
            break;
        };

        registry.mark_progress(id);
        let result = run_with_limits(&handler, &request, &config).await;

        match result {
            Ok(outcome) => {
                let payload = serde_json::to_value(&outcome)
                    .unwrap_or_else(|_| serde_json::json!({"status": "success"}));
                registry.mark_success(id, payload);
                info!(task_id = %id, api_alias = %request.api_alias, "task succeeded");
            }
            Err(err) => {
                registry.mark_failure(id, err.to_string());
                // Context already logged by the handler; record the terminal
                // transition itself here.
                info!(task_id = %id, api_alias = %request.api_alias, "task failed");
            }
        }
    }
}

/// Execute one task under the soft/hard time limits
async fn run_with_limits(
    handler: &ApiTaskHandler,
    request: &TaskRequest,
    config: &WorkerConfig,
) -> TaskResult<crate::api::TaskOutcome> {
    let work = handler.handle(request);
    tokio::pin!(work);

    match tokio::time::timeout(config.soft_time_limit, &mut work).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                api_alias = %request.api_alias,
                soft_limit_seconds = config.soft_time_limit.as_secs(),
                "soft time limit exceeded, task still running"
            );
            let remaining = config
                .hard_time_limit
                .saturating_sub(config.soft_time_limit);
            match tokio::time::timeout(remaining, &mut work).await {
                Ok(result) => result,
                // Dropping the future cancels the task outright.
                Err(_) => Err(TaskError::timeout(
                    "task_execution",
                    config.hard_time_limit.as_secs(),
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UpstreamClient;
    use crate::queue::types::TaskState;
    use crate::storage::ResultStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    struct StubUpstream {
        response: serde_json::Value,
        fail_status: Option<u16>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl UpstreamClient for StubUpstream {
        async fn fetch(
            &self,
            _endpoint: &str,
            _query: &[(String, String)],
        ) -> TaskResult<serde_json::Value> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.fail_status {
                Some(status) => Err(TaskError::upstream_status(status, "stubbed failure")),
                None => Ok(self.response.clone()),
            }
        }
    }

    fn queue_with(
        upstream: StubUpstream,
        store_root: &std::path::Path,
        config: WorkerConfig,
    ) -> TaskQueue {
        let handler = ApiTaskHandler::new(Arc::new(upstream), ResultStore::new(store_root));
        TaskQueue::new(handler, Arc::new(TaskRegistry::new()), config)
    }

    async fn wait_terminal(registry: &TaskRegistry, id: TaskId) -> crate::queue::TaskRecord {
        for _ in 0..200 {
            if let Some(record) = registry.get(id) {
                if record.state.is_terminal() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task {id} did not reach a terminal state");
    }

    #[tokio::test]
    async fn test_weather_task_reaches_success() {
        let _guard = crate::test_support::env_lock();
        std::env::set_var("WEATHER_API_KEY", "test-key");

        let dir = tempfile::tempdir().unwrap();
        let queue = queue_with(
            StubUpstream {
                response: json!({"temp": 15}),
                fail_status: None,
                delay: None,
            },
            dir.path(),
            WorkerConfig::default(),
        );

        let id = queue.enqueue_weather("Kazan", None).unwrap();
        let record = wait_terminal(&queue.registry(), id).await;

        std::env::remove_var("WEATHER_API_KEY");

        assert_eq!(record.state, TaskState::Success);
        let result = record.result.unwrap();
        assert_eq!(result["data"]["temp"], 15);
        assert!(result["file"]
            .as_str()
            .unwrap()
            .ends_with("weather_Kazan_RU.json"));

        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_news_task_without_credential_fails_fast() {
        let _guard = crate::test_support::env_lock();
        std::env::remove_var("NEWS_API_KEY");

        let dir = tempfile::tempdir().unwrap();
        let queue = queue_with(
            StubUpstream {
                response: json!({}),
                fail_status: None,
                delay: None,
            },
            dir.path(),
            WorkerConfig::default(),
        );

        let id = queue.enqueue_news("technology", None).unwrap();
        let record = wait_terminal(&queue.registry(), id).await;

        assert_eq!(record.state, TaskState::Failure);
        assert!(record.error.unwrap().contains("NEWS_API_KEY"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_upstream_500_marks_failure() {
        let _guard = crate::test_support::env_lock();
        std::env::set_var("WEATHER_API_KEY", "test-key");

        let dir = tempfile::tempdir().unwrap();
        let queue = queue_with(
            StubUpstream {
                response: json!({}),
                fail_status: Some(500),
                delay: None,
            },
            dir.path(),
            WorkerConfig::default(),
        );

        let id = queue.enqueue_weather("Kazan", None).unwrap();
        let record = wait_terminal(&queue.registry(), id).await;

        std::env::remove_var("WEATHER_API_KEY");

        assert_eq!(record.state, TaskState::Failure);
        assert!(record.error.unwrap().contains("500"));

        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_hard_time_limit_fails_task() {
        let _guard = crate::test_support::env_lock();
        std::env::set_var("WEATHER_API_KEY", "test-key");

        let dir = tempfile::tempdir().unwrap();
        let queue = queue_with(
            StubUpstream {
                response: json!({}),
                fail_status: None,
                delay: Some(Duration::from_secs(5)),
            },
            dir.path(),
            WorkerConfig {
                concurrency: 1,
                soft_time_limit: Duration::from_millis(20),
                hard_time_limit: Duration::from_millis(60),
            },
        );

        let id = queue.enqueue_weather("Kazan", None).unwrap();
        let record = wait_terminal(&queue.registry(), id).await;

        std::env::remove_var("WEATHER_API_KEY");

        assert_eq!(record.state, TaskState::Failure);
        assert!(record.error.unwrap().contains("timed out"));

        queue.shutdown().await;
    }

    #[tokio::test]
    async fn test_tasks_are_independent() {
        let _guard = crate::test_support::env_lock();
        std::env::set_var("WEATHER_API_KEY", "test-key");

        let dir = tempfile::tempdir().unwrap();
        let queue = queue_with(
            StubUpstream {
                response: json!({"temp": -3}),
                fail_status: None,
                delay: None,
            },
            dir.path(),
            WorkerConfig::default(),
        );

        let first = queue.enqueue_weather("Kazan", None).unwrap();
        let second = queue
            .enqueue_weather("Moscow", Some("RU".to_string()))
            .unwrap();
        assert_ne!(first, second);

        let registry = queue.registry();
        let first_record = wait_terminal(&registry, first).await;
        let second_record = wait_terminal(&registry, second).await;

        std::env::remove_var("WEATHER_API_KEY");

        assert_eq!(first_record.state, TaskState::Success);
        assert_eq!(second_record.state, TaskState::Success);
        // Distinct discriminating params, distinct files
        assert!(dir.path().join("weather_Kazan_RU.json").exists());
        assert!(dir.path().join("weather_Moscow_RU.json").exists());

        queue.shutdown().await;
    }
}
