use crate::util::{PushContentEncoding, PushContentType, PushCorrelationId, PushHeader, PushReplyTo};
use crate::{Connector, Gateway, Handle};
use async_trait::async_trait;
use celery_core::{BrokerError, Shutdown};
use celery_message::TaskMessage;
use celery_sync::{ResourceDestructor, ResourceFactory, ResourcePool};
use lapin::options::{BasicPublishOptions, ExchangeDeclareOptions, QueueDeclareOptions};
use lapin::protocol::basic::AMQPProperties;
use lapin::types::FieldTable;
use lapin::{Channel, ExchangeKind};
use tracing::warn;

const DEFAULT_CHANNEL_POOL_CAPACITY: usize = 2;

struct ChannelFactory {
    gateway: Gateway,
}

#[async_trait]
impl ResourceFactory<Channel> for ChannelFactory {
    async fn create(&self) -> Channel {
        self.gateway.channel().await
    }
}

struct ChannelDestructor;

#[async_trait]
impl ResourceDestructor<Channel> for ChannelDestructor {
    async fn destroy(&self, channel: Channel) -> String {
        match channel.close(0, "destroying channel pool").await {
            Ok(_) => "closed".to_string(),
            Err(error) => format!("failed to close: {error}"),
        }
    }
}

/// Publishes task messages onto a RabbitMQ cluster.
///
/// Holds one [`Connector`]-maintained connection and a small
/// [`ResourcePool`] of channels, borrowed and returned around every publish.
pub struct Broker {
    name: String,
    gateway: Gateway,
    channels: ResourcePool<Channel>,
    shutdown: Shutdown,
}

impl Broker {
    /// Starts a connector for `handle` and builds a broker around it.
    pub fn new(handle: impl AsRef<Handle>) -> Self {
        Self::with_capacity(handle, DEFAULT_CHANNEL_POOL_CAPACITY)
    }

    /// Same as [`new`](Self::new), but with a configurable channel pool
    /// capacity.
    pub fn with_capacity(handle: impl AsRef<Handle>, capacity: usize) -> Self {
        let handle = handle.as_ref();
        let shutdown = Shutdown::new();
        let gateway = Connector::start(handle, shutdown.clone());
        let channels = ResourcePool::new(
            capacity,
            ChannelFactory {
                gateway: gateway.clone(),
            },
            ChannelDestructor,
        );

        Self {
            name: handle.name().to_string(),
            gateway,
            channels,
            shutdown,
        }
    }

    async fn publish_raw(
        &self,
        exchange: &str,
        routing_key: &str,
        body: &[u8],
        properties: AMQPProperties,
    ) -> Result<String, BrokerError> {
        self.channels
            .use_with(|channel| async move {
                let declare_queue = async {
                    if routing_key.is_empty() {
                        return;
                    }

                    let declare = channel
                        .queue_declare(
                            routing_key,
                            QueueDeclareOptions {
                                durable: true,
                                ..Default::default()
                            },
                            FieldTable::default(),
                        )
                        .await;

                    if let Err(error) = declare {
                        warn!(
                            broker = self.name.as_str(),
                            ?error,
                            error_message = %error,
                            "Failed to assert the routing-key queue",
                        );
                    }
                };

                let declare_exchange = async {
                    if exchange.is_empty() {
                        return;
                    }

                    let declare = channel
                        .exchange_declare(
                            exchange,
                            ExchangeKind::Direct,
                            ExchangeDeclareOptions {
                                durable: true,
                                ..Default::default()
                            },
                            FieldTable::default(),
                        )
                        .await;

                    if let Err(error) = declare {
                        warn!(
                            broker = self.name.as_str(),
                            ?error,
                            error_message = %error,
                            "Failed to assert the exchange",
                        );
                    }
                };

                futures::join!(declare_queue, declare_exchange);

                let publish_result = channel
                    .basic_publish(
                        exchange,
                        routing_key,
                        BasicPublishOptions::default(),
                        body,
                        properties,
                    )
                    .await;

                let result = match publish_result {
                    Ok(_) => Ok("flushed to write buffer".to_string()),
                    Err(error) => Err(BrokerError(error.to_string())),
                };

                (channel, result)
            })
            .await
    }
}

/// Builds the AMQP message properties carrying a task's correlation ID,
/// reply-to queue, priority, and headers.
fn build_properties(task_message: &TaskMessage) -> AMQPProperties {
    let mut properties = AMQPProperties::default()
        .push_content_type(task_message.content_type.as_str())
        .push_content_encoding(task_message.content_encoding.as_str())
        .push_correlation_id(task_message.properties.correlation_id.to_string().as_str())
        .with_delivery_mode(task_message.properties.delivery_mode.as_u8());

    if let Some(reply_to) = task_message.properties.reply_to {
        properties = properties.push_reply_to(reply_to.to_string().as_str());
    }

    if let Some(priority) = task_message.properties.priority {
        properties = properties.with_priority(priority);
    }

    for (key, value) in &task_message.headers {
        properties = properties.push_header(key, value.as_str());
    }

    properties
}

#[async_trait]
impl celery_core::MessageBroker for Broker {
    async fn publish(&self, task_message: &TaskMessage) -> Result<String, BrokerError> {
        let exchange = task_message.properties.delivery_info.exchange.as_str();
        let routing_key = task_message.properties.delivery_info.routing_key.as_str();
        let properties = build_properties(task_message);

        self.publish_raw(exchange, routing_key, task_message.body.as_bytes(), properties)
            .await
    }

    async fn end(&self) {
        self.channels.destroy_all().await;
        self.shutdown.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{RetrieveContentType, RetrieveCorrelationId, RetrieveReplyTo};
    use celery_message::{DeliveryInfo, DeliveryMode, TaskProperties};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn sample_task_message() -> TaskMessage {
        let task_id = Uuid::new_v4();
        let reply_to = Uuid::new_v4();

        TaskMessage {
            body: "[[], {}, {}]".to_string(),
            content_type: "application/json".to_string(),
            content_encoding: "utf-8".to_string(),
            headers: Default::default(),
            properties: TaskProperties {
                correlation_id: task_id,
                reply_to: Some(reply_to),
                priority: Some(5),
                delivery_mode: DeliveryMode::Persistent,
                delivery_info: DeliveryInfo {
                    exchange: String::new(),
                    routing_key: "celery".to_string(),
                },
                body_encoding: "utf-8".to_string(),
            },
        }
    }

    #[test]
    fn build_properties_carries_correlation_id_and_reply_to() {
        // Given
        let task_message = sample_task_message();

        // When
        let properties = build_properties(&task_message);

        // Then
        let correlation_id: Option<String> = properties.retrieve_correlation_id();
        let reply_to: Option<String> = properties.retrieve_reply_to();
        let content_type: Option<String> = properties.retrieve_content_type();

        assert_eq!(correlation_id.unwrap(), task_message.properties.correlation_id.to_string());
        assert_eq!(reply_to.unwrap(), task_message.properties.reply_to.unwrap().to_string());
        assert_eq!(content_type.unwrap(), "application/json");
        assert_eq!(*properties.priority(), Some(5));
        assert_eq!(*properties.delivery_mode(), Some(2));
    }

    #[test]
    fn build_properties_omits_reply_to_when_absent() {
        // Given
        let mut task_message = sample_task_message();
        task_message.properties.reply_to = None;

        // When
        let properties = build_properties(&task_message);

        // Then
        let reply_to: Option<String> = properties.retrieve_reply_to();
        assert_eq!(reply_to, None);
    }
}
