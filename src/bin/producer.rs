//! One-shot task publisher.
//!
//! ```text
//! api-task-producer weather <city> [country]
//! api-task-producer news <query> [language]
//! ```

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use api_tasks::api::TaskRequest;
use api_tasks::broker::TaskProducer;
use api_tasks::config::BrokerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let request = match (args.next().as_deref(), args.next(), args.next()) {
        (Some("weather"), Some(city), country) => TaskRequest::weather(city, country),
        (Some("news"), Some(query), language) => TaskRequest::news(query, language),
        _ => bail!(
            "usage: api-task-producer weather <city> [country] | api-task-producer news <query> [language]"
        ),
    };

    let producer = TaskProducer::connect(&BrokerConfig::from_env())
        .await
        .context("failed to connect producer")?;
    producer
        .publish(&request)
        .await
        .context("failed to publish task message")?;
    producer.close().await.context("failed to close connection")?;
    Ok(())
}
