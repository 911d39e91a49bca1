//! # Task Consumer
//!
//! Long-running consumer bound to one `(queue_name, routing_key)` pair.
//! Construction declares the durable queue, the durable direct exchange and
//! the binding, and sets prefetch to 1 so at most one unacknowledged message
//! is in flight.
//!
//! Per delivery: decode the body, run the fetch-and-persist template, then
//! ack on success or reject **without requeue** on any failure. The reject
//! path is the poison-message policy inherited from the system this core was
//! extracted from: a message that fails once is treated as permanently
//! unprocessable, transient or not. The ack/nack choice is computed by the
//! pure [`disposition`] function so the policy is testable without a broker.
//!
//! A consumer that loses its connection mid-run does not self-heal; process
//! supervision restarts it. Unacknowledged messages are redelivered by the
//! broker in that case.

use futures::StreamExt;
use lapin::message::Delivery;
use lapin::options::{
    BasicAckOptions, BasicCancelOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, ExchangeKind};
use tracing::{error, info};

use crate::api::{ApiTaskHandler, TaskOutcome, TaskRequest};
use crate::broker::EXCHANGE_NAME;
use crate::config::BrokerConfig;
use crate::errors::{TaskError, TaskResult};

/// Terminal disposition for a delivered message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Processing succeeded: remove the message permanently
    Ack,
    /// Processing failed: drop the message permanently, no redelivery
    Reject,
}

/// Map a handler result onto the ack/reject policy
///
/// Every failure, including transient upstream ones, rejects without
/// requeue. There is no retry count and no dead-letter distinction layer.
pub fn disposition<T>(result: &TaskResult<T>) -> Disposition {
    match result {
        Ok(_) => Disposition::Ack,
        Err(_) => Disposition::Reject,
    }
}

/// Decode a message body into a [`TaskRequest`]
///
/// A malformed body or an unrecognized `api_alias` is a
/// [`TaskError::Protocol`], fatal for this message.
pub fn decode_request(body: &[u8]) -> TaskResult<TaskRequest> {
    serde_json::from_slice(body).map_err(TaskError::from)
}

/// Handle for stopping a running consumer from another task
#[derive(Clone)]
pub struct ConsumerHandle {
    channel: Channel,
    consumer_tag: String,
}

impl ConsumerHandle {
    /// Cancel consumption; the consume loop drains and returns cleanly
    pub async fn stop(&self) -> TaskResult<()> {
        self.channel
            .basic_cancel(&self.consumer_tag, BasicCancelOptions::default())
            .await
            .map_err(|e| TaskError::broker("basic_cancel", e.to_string()))
    }
}

/// Message-driven executor bound to one queue
pub struct TaskConsumer {
    connection: Connection,
    channel: Channel,
    queue_name: String,
    consumer_tag: String,
    handler: ApiTaskHandler,
}

impl TaskConsumer {
    /// Connect, declare queue and exchange, bind, and set prefetch
    pub async fn connect(
        config: &BrokerConfig,
        handler: ApiTaskHandler,
        queue_name: impl Into<String>,
        routing_key: impl Into<String>,
    ) -> TaskResult<Self> {
        let queue_name = queue_name.into();
        let routing_key = routing_key.into();

        let connection = Connection::connect(
            &config.amqp_url(),
            ConnectionProperties::default().with_connection_name("api-tasks-consumer".into()),
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
            .basic_qos(config.prefetch_count, BasicQosOptions::default())
            .await
            .map_err(|e| TaskError::broker("basic_qos", e.to_string()))?;

        channel
            .queue_declare(
                &queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| TaskError::broker("queue_declare", e.to_string()))?;

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

        channel
            .queue_bind(
                &queue_name,
                EXCHANGE_NAME,
                &routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| TaskError::broker("queue_bind", e.to_string()))?;

        info!(
            queue = %queue_name,
            exchange = EXCHANGE_NAME,
            routing_key = %routing_key,
            "queue bound, consumer ready"
        );

        let consumer_tag = format!("api-task-consumer-{queue_name}");
        Ok(Self {
            connection,
            channel,
            queue_name,
            consumer_tag,
            handler,
        })
    }

    /// Handle for stopping the consume loop from elsewhere
    pub fn handle(&self) -> ConsumerHandle {
        ConsumerHandle {
            channel: self.channel.clone(),
            consumer_tag: self.consumer_tag.clone(),
        }
    }

    /// Consume until cancelled or the connection drops
    ///
    /// Processes one message at a time; the loop only errors when the broker
    /// link itself fails (delivery error, ack/nack failure).
    pub async fn run(&self) -> TaskResult<()> {
        let mut consumer = self
            .channel
            .basic_consume(
                &self.queue_name,
                &self.consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| TaskError::broker("basic_consume", e.to_string()))?;

        info!(queue = %self.queue_name, "waiting for messages");

        while let Some(delivery) = consumer.next().await {
            let delivery =
                delivery.map_err(|e| TaskError::broker("delivery", e.to_string()))?;
            self.process(delivery).await?;
        }

        info!(queue = %self.queue_name, "consumption stopped");
        Ok(())
    }

    /// Decode, execute and settle one delivery
    async fn process(&self, delivery: Delivery) -> TaskResult<()> {
        let result = self.execute(&delivery.data).await;

        match disposition(&result) {
            Disposition::Ack => {
                delivery
                    .ack(BasicAckOptions::default())
                    .await
                    .map_err(|e| TaskError::broker("ack", e.to_string()))?;
            }
            Disposition::Reject => {
                // Poison-message policy: drop, never requeue.
                if let Err(ref err) = result {
                    error!(queue = %self.queue_name, error = %err, "message rejected");
                }
                delivery
                    .nack(BasicNackOptions {
                        requeue: false,
                        ..Default::default()
                    })
                    .await
                    .map_err(|e| TaskError::broker("nack", e.to_string()))?;
            }
        }

        Ok(())
    }

    async fn execute(&self, body: &[u8]) -> TaskResult<TaskOutcome> {
        let request = decode_request(body)?;
        info!(api_alias = %request.api_alias, "processing message");
        self.handler.handle(&request).await
    }

    /// Close the connection, releasing the queue's unacked messages
    pub async fn close(self) -> TaskResult<()> {
        self.connection
            .close(200, "consumer closed")
            .await
            .map_err(|e| TaskError::broker("close", e.to_string()))?;
        info!("consumer connection closed");
        Ok(())
    }
}
