//! # API Task Handlers
//!
//! The shared execution template behind both the queue-backed executor and
//! the broker consumer: resolve the credential, call the upstream API,
//! persist the response, return a structured outcome.
//!
//! A missing credential fails the task before any network attempt. Every
//! failure is logged with the API alias and identifying parameters before it
//! is surfaced; retry policy belongs to the caller.

use std::collections::HashMap;
use std::sync::Arc;

use crate::api::client::UpstreamClient;
use crate::api::types::{ApiAlias, TaskOutcome, TaskRequest};
use crate::credentials;
use crate::errors::{TaskError, TaskResult};
use crate::storage::ResultStore;

const WEATHER_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";
const NEWS_ENDPOINT: &str = "https://newsapi.org/v2/everything";

/// Executes one [`TaskRequest`] end to end
///
/// Holds the upstream client and result store; stateless across requests, so
/// one handler instance is shared by the whole worker pool.
#[derive(Clone)]
pub struct ApiTaskHandler {
    client: Arc<dyn UpstreamClient>,
    store: ResultStore,
}

impl ApiTaskHandler {
    pub fn new(client: Arc<dyn UpstreamClient>, store: ResultStore) -> Self {
        Self { client, store }
    }

    /// Handler with the production HTTP client and default storage root
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(crate::api::client::HttpUpstreamClient::new()),
            ResultStore::default(),
        )
    }

    /// Run the fetch-and-persist template for one request
    pub async fn handle(&self, request: &TaskRequest) -> TaskResult<TaskOutcome> {
        let result = match request.api_alias {
            ApiAlias::Weather => self.handle_weather(request).await,
            ApiAlias::News => self.handle_news(request).await,
        };

        if let Err(ref err) = result {
            tracing::error!(
                api_alias = %request.api_alias,
                params = ?request.params,
                error = %err,
                "task execution failed"
            );
        }

        result
    }

    async fn handle_weather(&self, request: &TaskRequest) -> TaskResult<TaskOutcome> {
        let api_key = credentials::resolve(ApiAlias::Weather)
            .ok_or_else(|| TaskError::missing_credential(credentials::env_key(ApiAlias::Weather)))?;

        let city = request.param_or("city", "Kazan").to_string();
        let country = request.param_or("country", "RU").to_string();

        let query = vec![
            ("q".to_string(), format!("{city},{country}")),
            ("appid".to_string(), api_key),
            ("units".to_string(), "metric".to_string()),
        ];
        let data = self.client.fetch(WEATHER_ENDPOINT, &query).await?;

        let file = self
            .store
            .persist(ApiAlias::Weather, &[&city, &country], &data)
            .await?;

        let params = HashMap::from([
            ("city".to_string(), city),
            ("country".to_string(), country),
        ]);
        Ok(TaskOutcome::success(
            params,
            data,
            file.display().to_string(),
        ))
    }

    async fn handle_news(&self, request: &TaskRequest) -> TaskResult<TaskOutcome> {
        let api_key = credentials::resolve(ApiAlias::News)
            .ok_or_else(|| TaskError::missing_credential(credentials::env_key(ApiAlias::News)))?;

        let search = request.param_or("query", "technology").to_string();
        let language = request.param_or("language", "en").to_string();

        let query = vec![
            ("q".to_string(), search.clone()),
            ("language".to_string(), language.clone()),
            ("apiKey".to_string(), api_key),
            ("pageSize".to_string(), "10".to_string()),
        ];
        let data = self.client.fetch(NEWS_ENDPOINT, &query).await?;

        let file = self
            .store
            .persist(ApiAlias::News, &[&search, &language], &data)
            .await?;

        let params = HashMap::from([
            ("query".to_string(), search),
            ("language".to_string(), language),
        ]);
        Ok(TaskOutcome::success(
            params,
            data,
            file.display().to_string(),
        ))
    }
}
