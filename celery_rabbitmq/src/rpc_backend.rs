use crate::util::{Push, RetrieveCorrelationId};
use crate::{Broker, Connector, Gateway, Handle};
use async_trait::async_trait;
use celery_core::{CeleryError, ConsumerCancelledError, DisconnectedError, Shutdown, UnimplementedError};
use celery_message::ResultEnvelope;
use celery_sync::{PromiseError, PromiseMap, ResourceDestructor, ResourceFactory, ResourcePool};
use celery_uri::Uri;
use futures::StreamExt;
use lapin::options::{BasicCancelOptions, BasicConsumeOptions, BasicPublishOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Consumer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::warn;
use uuid::Uuid;

const CHANNEL_POOL_CAPACITY: usize = 2;
const REPLY_QUEUE_EXPIRES_MS: u64 = 24 * 60 * 60 * 1000;
const DEFAULT_RESULT_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

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

/// Correlates published tasks with their eventual results via a private,
/// auto-deleting RabbitMQ reply queue.
///
/// On construction this opens a connection, carves out one permanent
/// *consumer channel* for the reply queue, and spawns a background task that
/// feeds every delivery into a [`PromiseMap`] keyed by correlation ID.
pub struct RpcBackend {
    routing_key: String,
    gateway: Gateway,
    channels: ResourcePool<Channel>,
    consumer_channel: AsyncMutex<Option<Channel>>,
    consumer_tag: String,
    pending: Arc<PromiseMap<Uuid, Vec<u8>, String>>,
    shutdown: Shutdown,
}

impl RpcBackend {
    /// Opens a connection to `handle`'s cluster, asserts the reply queue
    /// named `routing_key`, and starts consuming from it.
    pub async fn new(handle: impl AsRef<Handle>, routing_key: impl Into<String>) -> Self {
        let handle = handle.as_ref();
        let routing_key = routing_key.into();
        let shutdown = Shutdown::new();
        let gateway = Connector::start(handle, shutdown.clone());
        let channels = ResourcePool::new(
            CHANNEL_POOL_CAPACITY,
            ChannelFactory {
                gateway: gateway.clone(),
            },
            ChannelDestructor,
        );

        let consumer_channel = gateway.channel().await;

        let mut args = FieldTable::default();
        args.push("x-expires", REPLY_QUEUE_EXPIRES_MS as i64);

        consumer_channel
            .queue_declare(
                &routing_key,
                QueueDeclareOptions {
                    durable: false,
                    auto_delete: false,
                    ..Default::default()
                },
                args,
            )
            .await
            .expect("failed to assert the RPC reply queue");

        let consumer_tag = format!("rpc-backend-{}", Uuid::new_v4());

        let consumer = consumer_channel
            .basic_consume(
                &routing_key,
                &consumer_tag,
                BasicConsumeOptions {
                    no_ack: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .expect("failed to start consuming the RPC reply queue");

        let pending = Arc::new(PromiseMap::with_timeout(DEFAULT_RESULT_TIMEOUT));

        tokio::spawn(Self::consume(consumer, Arc::clone(&pending)));

        Self {
            routing_key,
            gateway,
            channels,
            consumer_channel: AsyncMutex::new(Some(consumer_channel)),
            consumer_tag,
            pending,
            shutdown,
        }
    }

    async fn consume(mut consumer: Consumer, pending: Arc<PromiseMap<Uuid, Vec<u8>, String>>) {
        while let Some(delivery) = consumer.next().await {
            match delivery {
                Ok(delivery) => {
                    let correlation_id = delivery
                        .properties
                        .retrieve_correlation_id()
                        .and_then(|raw: String| Uuid::parse_str(&raw).ok());

                    Self::on_message(&pending, Some(delivery.data), correlation_id);
                }
                Err(error) => {
                    warn!(?error, error_message = %error, "RabbitMQ RPC consumer errored");
                }
            }
        }

        Self::on_message(&pending, None, None);
    }

    fn on_message(pending: &PromiseMap<Uuid, Vec<u8>, String>, body: Option<Vec<u8>>, correlation_id: Option<Uuid>) {
        match (body, correlation_id) {
            (None, _) => {
                pending.reject_all(ConsumerCancelledError.to_string());
            }
            (Some(body), Some(correlation_id)) => {
                pending.resolve(correlation_id, body);
            }
            (Some(_), None) => {
                warn!("Received an RPC reply with no correlation ID");
            }
        }
    }

    async fn publish_json(&self, routing_key: &str, payload: &[u8]) -> Result<String, CeleryError> {
        self.channels
            .use_with(|channel| async move {
                let result = channel
                    .basic_publish(
                        "",
                        routing_key,
                        BasicPublishOptions::default(),
                        payload,
                        BasicProperties::default().with_content_type("application/json".into()),
                    )
                    .await;

                let outcome = match result {
                    Ok(_) => Ok("flushed to write buffer".to_string()),
                    Err(error) => Err(CeleryError::Broker(celery_core::BrokerError(error.to_string()))),
                };

                (channel, outcome)
            })
            .await
    }
}

#[async_trait]
impl celery_core::ResultBackend for RpcBackend {
    async fn put(&self, result_message: &ResultEnvelope) {
        let payload = match serde_json::to_vec(result_message) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(?error, error_message = %error, "Failed to serialize a result for the RPC backend");
                return;
            }
        };

        if let Err(error) = self.publish_json(&self.routing_key, &payload).await {
            warn!(?error, "Failed to publish a result to the RPC reply queue");
        }
    }

    async fn get(&self, task_id: Uuid, timeout: Option<Duration>) -> Result<ResultEnvelope, CeleryError> {
        let outcome = celery_util::with_timeout(self.pending.get(task_id), timeout).await;

        let raw = match outcome {
            Err(_) => return Err(celery_util::TimeoutError.into()),
            Ok(Err(PromiseError::Custom(reason))) => {
                return Err(CeleryError::Disconnected(DisconnectedError(reason)))
            }
            Ok(Err(PromiseError::Cleared)) | Ok(Err(PromiseError::Deleted)) => {
                return Err(CeleryError::Disconnected(DisconnectedError(
                    "the RPC backend was shut down".to_string(),
                )))
            }
            Ok(Ok(raw)) => raw,
        };

        serde_json::from_slice(&raw).map_err(|error| CeleryError::Pack(celery_message::PackError::Deserialize(error.to_string())))
    }

    async fn delete(&self, task_id: Uuid) -> String {
        if self.pending.delete(&task_id) {
            "deleted".to_string()
        } else {
            "no result found".to_string()
        }
    }

    async fn end(&self) {
        self.pending.reject_all("disconnecting".to_string());

        if let Some(channel) = self.consumer_channel.lock().await.take() {
            let _ = channel.basic_cancel(&self.consumer_tag, BasicCancelOptions::default()).await;
            self.channels.give_back(channel).ok();
        }

        self.channels.destroy_all().await;
        self.shutdown.terminate();
        let _ = &self.gateway;
    }

    fn uri(&self) -> Result<Uri, UnimplementedError> {
        Err(UnimplementedError("RpcBackend::uri".to_string()))
    }
}

/// A thin convenience wrapper so a standalone [`RpcBackend`] can also publish
/// tasks without needing a separate [`Broker`] over the same connector.
impl RpcBackend {
    /// Builds a [`Broker`] sharing no state with this backend's connection
    /// (each maintains its own connector), for callers that want both a
    /// broker and an RPC backend against the same cluster.
    pub fn sibling_broker(handle: impl AsRef<Handle>) -> Broker {
        Broker::new(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn on_message_resolves_the_matching_promise() {
        // Given
        let pending: PromiseMap<Uuid, Vec<u8>, String> = PromiseMap::new();
        let task_id = Uuid::new_v4();
        let promise = pending.get(task_id);

        // When
        RpcBackend::on_message(&pending, Some(b"{}".to_vec()), Some(task_id));

        // Then
        assert_eq!(promise.await.unwrap(), b"{}".to_vec());
    }

    #[tokio::test]
    async fn on_message_rejects_everything_pending_on_disconnect() {
        // Given
        let pending: PromiseMap<Uuid, Vec<u8>, String> = PromiseMap::new();
        let task_id = Uuid::new_v4();
        let promise = pending.get(task_id);

        // When
        RpcBackend::on_message(&pending, None, None);

        // Then
        let error = promise.await.unwrap_err();
        assert!(matches!(error, PromiseError::Custom(reason) if reason == ConsumerCancelledError.to_string()));
    }

    #[tokio::test]
    async fn on_message_ignores_a_reply_with_no_correlation_id() {
        // Given
        let pending: PromiseMap<Uuid, Vec<u8>, String> = PromiseMap::new();
        let task_id = Uuid::new_v4();
        let promise = pending.get(task_id);

        // When
        RpcBackend::on_message(&pending, Some(b"{}".to_vec()), None);
        RpcBackend::on_message(&pending, Some(b"{\"ok\":true}".to_vec()), Some(task_id));

        // Then
        assert_eq!(promise.await.unwrap(), b"{\"ok\":true}".to_vec());
    }
}
