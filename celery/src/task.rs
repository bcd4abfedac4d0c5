use std::collections::HashMap;
use std::sync::Arc;

use celery_core::{CeleryError, MessageBroker, ResultBackend};
use celery_message::{
    Compressor, DeliveryInfo, DeliveryMode, Encoder, Packer, Serializer, TaskMessage,
    TaskProperties,
};
use serde_json::Value;
use uuid::Uuid;

use crate::AsyncResult;

const DEFAULT_QUEUE: &str = "celery";

/// Per-submission overrides for [`Task::apply_async`].
///
/// Every field defaults to the task's (and, ultimately, Celery's) usual
/// behavior: `Default::default()` submits with the default packer, no
/// priority, no schedule, and the `"celery"` queue.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// An ISO-8601 timestamp after which the task becomes eligible to run.
    pub eta: Option<String>,
    /// An ISO-8601 timestamp after which the task is discarded unrun.
    pub expires: Option<String>,
    /// Overrides the packer's compression stage.
    pub compression: Option<Compressor>,
    /// Overrides the packer's serialization stage.
    pub serializer: Option<Serializer>,
    /// Broker-level priority, if the destination queue supports priorities.
    pub priority: Option<u8>,
    /// Overrides the default `"celery"` routing key.
    pub queue: Option<String>,
}

/// A named unit of work, bound to the [`Client`](crate::Client) that
/// produced it via [`Client::task`](crate::Client::task).
pub struct Task {
    name: String,
    broker: Arc<dyn MessageBroker>,
    backend: Arc<dyn ResultBackend>,
    client_id: Uuid,
}

impl Task {
    pub(crate) fn new(
        name: String,
        broker: Arc<dyn MessageBroker>,
        backend: Arc<dyn ResultBackend>,
        client_id: Uuid,
    ) -> Self {
        Self { name, broker, backend, client_id }
    }

    /// This task's name, as registered with the worker side.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Packs `args`/`kwargs` into a task envelope, publishes it, and returns
    /// an [`AsyncResult`] correlated with the published task.
    pub async fn apply_async(
        &self,
        args: Value,
        kwargs: Value,
        options: ApplyOptions,
    ) -> Result<AsyncResult, CeleryError> {
        let serializer = options.serializer.unwrap_or_default();
        let compressor = options.compression.unwrap_or_default();

        // Identity compression over a text serializer can be carried
        // verbatim as UTF-8; anything else needs base64 to stay
        // transport-safe.
        let encoder = if compressor == Compressor::Identity {
            Encoder::Plaintext
        } else {
            Encoder::Base64
        };
        let packer = Packer::new(serializer, compressor, encoder);

        let embed = serde_json::json!({
            "callbacks": Value::Null,
            "errbacks": Value::Null,
            "chain": Value::Null,
            "chord": Value::Null,
        });
        let body = packer.pack(&serde_json::json!([args, kwargs, embed]))?;

        let correlation_id = Uuid::new_v4();

        let mut headers = HashMap::new();
        headers.insert("task".to_string(), self.name.clone());
        headers.insert("id".to_string(), correlation_id.to_string());
        if let Some(eta) = &options.eta {
            headers.insert("eta".to_string(), eta.clone());
        }
        if let Some(expires) = &options.expires {
            headers.insert("expires".to_string(), expires.clone());
        }

        let task_message = TaskMessage {
            body,
            content_encoding: "utf-8".to_string(),
            content_type: packer.content_type().to_string(),
            headers,
            properties: TaskProperties {
                correlation_id,
                reply_to: Some(self.client_id),
                delivery_mode: DeliveryMode::Persistent,
                delivery_info: DeliveryInfo {
                    exchange: String::new(),
                    routing_key: options.queue.unwrap_or_else(|| DEFAULT_QUEUE.to_string()),
                },
                priority: options.priority,
                body_encoding: packer.body_encoding().to_string(),
            },
        };

        self.broker.publish(&task_message).await?;

        Ok(AsyncResult::new(correlation_id, Arc::clone(&self.backend)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use celery_core::{BrokerError, UnimplementedError};
    use celery_message::ResultEnvelope;
    use celery_uri::Uri;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use std::time::Duration;

    struct CapturingBroker {
        captured: Mutex<Option<TaskMessage>>,
    }

    #[async_trait]
    impl MessageBroker for CapturingBroker {
        async fn publish(&self, task_message: &TaskMessage) -> Result<String, BrokerError> {
            *self.captured.lock().unwrap() = Some(task_message.clone());
            Ok("flushed to write buffer".to_string())
        }

        async fn end(&self) {}
    }

    struct StubBackend;

    #[async_trait]
    impl ResultBackend for StubBackend {
        async fn put(&self, _result_message: &ResultEnvelope) {}

        async fn get(
            &self,
            _task_id: Uuid,
            _timeout: Option<Duration>,
        ) -> Result<ResultEnvelope, CeleryError> {
            unimplemented!("not exercised by these tests")
        }

        async fn delete(&self, _task_id: Uuid) -> String {
            "no result found".to_string()
        }

        async fn end(&self) {}

        fn uri(&self) -> Result<Uri, UnimplementedError> {
            Err(UnimplementedError("stub".to_string()))
        }
    }

    fn task_with(broker: Arc<CapturingBroker>, client_id: Uuid) -> (Task, Arc<CapturingBroker>) {
        let backend: Arc<dyn ResultBackend> = Arc::new(StubBackend);
        let task = Task::new(
            "tasks.add".to_string(),
            Arc::clone(&broker) as Arc<dyn MessageBroker>,
            backend,
            client_id,
        );

        (task, broker)
    }

    #[tokio::test]
    async fn apply_async_with_defaults_uses_plaintext_encoding_and_celery_queue() {
        // Given
        let client_id = Uuid::new_v4();
        let (task, broker) =
            task_with(Arc::new(CapturingBroker { captured: Mutex::new(None) }), client_id);

        // When
        let result = task
            .apply_async(serde_json::json!([10, 15]), serde_json::json!({}), ApplyOptions::default())
            .await
            .unwrap();

        // Then
        let captured = broker.captured.lock().unwrap().clone().unwrap();
        assert_eq!(captured.properties.body_encoding, "utf-8");
        assert_eq!(captured.properties.delivery_info.routing_key, "celery");
        assert_eq!(captured.properties.reply_to, Some(client_id));
        assert_eq!(captured.properties.correlation_id, result.task_id());
        assert_eq!(
            captured.body,
            r#"[[10,15],{},{"callbacks":null,"chain":null,"chord":null,"errbacks":null}]"#
        );
    }

    #[tokio::test]
    async fn apply_async_with_compression_falls_back_to_base64_and_honors_queue_override() {
        // Given
        let (task, broker) =
            task_with(Arc::new(CapturingBroker { captured: Mutex::new(None) }), Uuid::new_v4());
        let options = ApplyOptions {
            compression: Some(Compressor::Gzip),
            queue: Some("custom".to_string()),
            ..Default::default()
        };

        // When
        task.apply_async(serde_json::json!([]), serde_json::json!({}), options).await.unwrap();

        // Then
        let captured = broker.captured.lock().unwrap().clone().unwrap();
        assert_eq!(captured.properties.body_encoding, "base64");
        assert_eq!(captured.properties.delivery_info.routing_key, "custom");
    }

    #[tokio::test]
    async fn apply_async_surfaces_priority_and_headers() {
        // Given
        let (task, broker) =
            task_with(Arc::new(CapturingBroker { captured: Mutex::new(None) }), Uuid::new_v4());
        let options = ApplyOptions { priority: Some(7), ..Default::default() };

        // When
        task.apply_async(serde_json::json!([]), serde_json::json!({}), options).await.unwrap();

        // Then
        let captured = broker.captured.lock().unwrap().clone().unwrap();
        assert_eq!(captured.properties.priority, Some(7));
        assert_eq!(captured.headers.get("task"), Some(&"tasks.add".to_string()));
    }
}
