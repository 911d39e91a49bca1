//! Standalone broker consumer.
//!
//! Binds one durable queue to the task exchange and processes messages until
//! interrupted:
//!
//! ```text
//! api-task-consumer <queue_name> <routing_key>
//! api-task-consumer weather_queue weather
//! ```

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use api_tasks::api::ApiTaskHandler;
use api_tasks::broker::TaskConsumer;
use api_tasks::config::BrokerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let (queue_name, routing_key) = match (args.next(), args.next()) {
        (Some(queue), Some(key)) => (queue, key),
        _ => bail!("usage: api-task-consumer <queue_name> <routing_key>"),
    };

    let config = BrokerConfig::from_env();
    let handler = ApiTaskHandler::with_defaults();

    let consumer = TaskConsumer::connect(&config, handler, &queue_name, &routing_key)
        .await
        .context("failed to set up consumer")?;
    let handle = consumer.handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping consumer");
            let _ = handle.stop().await;
        }
    });

    consumer.run().await.context("consumer loop failed")?;
    consumer.close().await.context("failed to close connection")?;
    Ok(())
}
