//! # Task Producer
//!
//! Publishes persistent task-request messages to the durable direct
//! exchange. A producer owns one connection and one channel for its whole
//! lifetime; callers that publish frequently should hold a long-lived
//! instance rather than constructing one per message, and call [`close`]
//! for deterministic teardown.
//!
//! [`close`]: TaskProducer::close

use lapin::options::{BasicPublishOptions, ExchangeDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use tracing::info;

use crate::api::TaskRequest;
use crate::broker::EXCHANGE_NAME;
use crate::config::BrokerConfig;
use crate::errors::{TaskError, TaskResult};

/// Publisher bound to the task exchange
pub struct TaskProducer {
    connection: Connection,
    channel: Channel,
}

impl TaskProducer {
    /// Connect and declare the durable direct exchange (idempotent, safe to
    /// repeat across producers and consumers)
    ///
    /// Connection failure here is fatal and propagated to the caller.
    pub async fn connect(config: &BrokerConfig) -> TaskResult<Self> {
        let connection = Connection::connect(
            &config.amqp_url(),
            ConnectionProperties::default().with_connection_name("api-tasks-producer".into()),
        )
        .await
        .map_err(|e| {
            TaskError::connection(format!(
                "broker connection to {} failed: {e}",
                config.url_redacted()
            ))
        })?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| TaskError::connection(format!("channel creation failed: {e}")))?;

        channel
            .exchange_declare(
                EXCHANGE_NAME,
                ExchangeKind::Direct,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| TaskError::broker("exchange_declare", e.to_string()))?;

        info!(exchange = EXCHANGE_NAME, broker = %config.url_redacted(), "producer connected");
        Ok(Self {
            connection,
            channel,
        })
    }

    /// Publish with the default routing key, the request's API alias
    pub async fn publish(&self, request: &TaskRequest) -> TaskResult<()> {
        self.publish_with_key(request, request.api_alias.as_str())
            .await
    }

    /// Publish a persistent message with an explicit routing key
    ///
    /// Awaits the publisher confirmation; a failure means the message is not
    /// guaranteed delivered and is propagated as fatal.
    pub async fn publish_with_key(
        &self,
        request: &TaskRequest,
        routing_key: &str,
    ) -> TaskResult<()> {
        let body = serde_json::to_vec(request)
            .map_err(|e| TaskError::serialization(e.to_string()))?;

        let confirm = self
            .channel
            .basic_publish(
                EXCHANGE_NAME,
                routing_key,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type("application/json".into()),
            )
            .await
            .map_err(|e| TaskError::publish(e.to_string()))?;

        confirm
            .await
            .map_err(|e| TaskError::publish(format!("confirmation failed: {e}")))?;

        info!(
            api_alias = %request.api_alias,
            routing_key,
            "task message published"
        );
        Ok(())
    }

    /// Close the connection
    pub async fn close(self) -> TaskResult<()> {
        self.connection
            .close(200, "producer closed")
            .await
            .map_err(|e| TaskError::broker("close", e.to_string()))?;
        info!("producer connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_config() -> BrokerConfig {
        BrokerConfig {
            host: std::env::var("RABBITMQ_HOST").unwrap_or_else(|_| "localhost".to_string()),
            username: std::env::var("RABBITMQ_USER").unwrap_or_else(|_| "guest".to_string()),
            password: std::env::var("RABBITMQ_PASS").unwrap_or_else(|_| "guest".to_string()),
            ..BrokerConfig::default()
        }
    }

    // Integration tests require RabbitMQ; run with:
    //   docker run --rm -p 5672:5672 rabbitmq:3
    //   cargo test broker -- --ignored

    #[tokio::test]
    #[ignore = "requires RabbitMQ running"]
    async fn test_producer_connect_and_close() {
        let producer = TaskProducer::connect(&live_config()).await.unwrap();
        producer.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires RabbitMQ running"]
    async fn test_publish_routes_only_to_matching_binding() {
        use lapin::options::{QueueBindOptions, QueueDeclareOptions, QueuePurgeOptions};

        let config = live_config();
        let producer = TaskProducer::connect(&config).await.unwrap();

        // Two queues on the same exchange, distinct routing keys
        let connection = Connection::connect(
            &config.amqp_url(),
            ConnectionProperties::default(),
        )
        .await
        .unwrap();
        let channel = connection.create_channel().await.unwrap();

        let suffix = uuid::Uuid::new_v4();
        let weather_queue = format!("test_weather_{suffix}");
        let news_queue = format!("test_news_{suffix}");
        for (queue, key) in [(&weather_queue, "weather"), (&news_queue, "news")] {
            channel
                .queue_declare(
                    queue,
                    QueueDeclareOptions {
                        durable: true,
                        ..Default::default()
                    },
                    FieldTable::default(),
                )
                .await
                .unwrap();
            channel
                .queue_bind(
                    queue,
                    EXCHANGE_NAME,
                    key,
                    QueueBindOptions::default(),
                    FieldTable::default(),
                )
                .await
                .unwrap();
        }

        producer
            .publish(&TaskRequest::weather("Kazan", None))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        // Passive redeclare reports queue depth
        let weather_state = channel
            .queue_declare(
                &weather_queue,
                QueueDeclareOptions {
                    passive: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .unwrap();
        let news_state = channel
            .queue_declare(
                &news_queue,
                QueueDeclareOptions {
                    passive: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .unwrap();

        assert_eq!(weather_state.message_count(), 1);
        assert_eq!(news_state.message_count(), 0, "no cross-delivery");

        channel
            .queue_purge(&weather_queue, QueuePurgeOptions::default())
            .await
            .unwrap();
        producer.close().await.unwrap();
    }
}
