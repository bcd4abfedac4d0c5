use std::sync::Arc;

use async_trait::async_trait;
use celery_core::{BrokerError, MessageBroker};
use celery_message::TaskMessage;
use tracing::{error, warn};

use crate::strategy::{FailoverStrategy, RoundRobin};

/// A [`MessageBroker`] that spreads publishes across several brokers,
/// retrying with a different one on failure.
///
/// Implements [`MessageBroker`] itself, so a dispatcher over several brokers
/// is usable anywhere a single broker is.
pub struct FailoverDispatcher {
    name: String,
    brokers: Vec<Arc<dyn MessageBroker>>,
    strategy: Box<dyn FailoverStrategy>,
}

impl FailoverDispatcher {
    /// Builds a dispatcher over `brokers`, trying them in round-robin order.
    ///
    /// # Panics
    ///
    /// Panics if `brokers` is empty: a dispatcher with nothing to dispatch
    /// to is a configuration mistake, not a runtime condition to recover
    /// from.
    pub fn new(name: impl Into<String>, brokers: Vec<Arc<dyn MessageBroker>>) -> Self {
        Self::with_strategy(name, brokers, RoundRobin::new())
    }

    /// Same as [`new`](Self::new), with a custom [`FailoverStrategy`].
    pub fn with_strategy(
        name: impl Into<String>,
        brokers: Vec<Arc<dyn MessageBroker>>,
        strategy: impl FailoverStrategy + 'static,
    ) -> Self {
        assert!(!brokers.is_empty(), "a failover dispatcher needs at least one broker");

        Self { name: name.into(), brokers, strategy: Box::new(strategy) }
    }
}

#[async_trait]
impl MessageBroker for FailoverDispatcher {
    async fn publish(&self, task_message: &TaskMessage) -> Result<String, BrokerError> {
        let mut tried = Vec::with_capacity(self.brokers.len());
        let mut last_error = None;

        while let Some(index) = self.strategy.next(self.brokers.len(), &tried) {
            tried.push(index);

            match self.brokers[index].publish(task_message).await {
                Ok(outcome) => return Ok(outcome),
                Err(error) => {
                    warn!(
                        dispatcher = self.name.as_str(),
                        broker_index = index,
                        ?error,
                        error_message = %error,
                        "A broker in a failover group failed to publish; trying the next one",
                    );
                    last_error = Some(error);
                }
            }
        }

        let reason = last_error
            .map(|error| error.to_string())
            .unwrap_or_else(|| "no brokers configured".to_string());

        // `alert` mirrors `celery_core::ALERT_FIELD_NAME`; tracing field
        // names must be literal identifiers, so the constant can't be
        // interpolated here directly.
        error!(
            dispatcher = self.name.as_str(),
            broker_count = self.brokers.len(),
            alert = true,
            "Every broker in the failover group failed to publish",
        );

        Err(BrokerError(reason))
    }

    async fn end(&self) {
        for broker in &self.brokers {
            broker.end().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use celery_message::{DeliveryInfo, DeliveryMode, TaskProperties};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    struct StubBroker {
        outcome: Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl MessageBroker for StubBroker {
        async fn publish(&self, _task_message: &TaskMessage) -> Result<String, BrokerError> {
            self.outcome.map(str::to_string).map_err(|reason| BrokerError(reason.to_string()))
        }

        async fn end(&self) {}
    }

    fn sample_task_message() -> TaskMessage {
        TaskMessage {
            body: "[[], {}, {}]".to_string(),
            content_type: "application/json".to_string(),
            content_encoding: "utf-8".to_string(),
            headers: Default::default(),
            properties: TaskProperties {
                correlation_id: Uuid::new_v4(),
                reply_to: None,
                priority: None,
                delivery_mode: DeliveryMode::Persistent,
                delivery_info: DeliveryInfo { exchange: String::new(), routing_key: "celery".to_string() },
                body_encoding: "utf-8".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn publish_falls_over_to_a_healthy_broker() {
        // Given
        let broken: Arc<dyn MessageBroker> = Arc::new(StubBroker { outcome: Err("broken") });
        let healthy: Arc<dyn MessageBroker> = Arc::new(StubBroker { outcome: Ok("flushed to write buffer") });
        let dispatcher = FailoverDispatcher::new("test", vec![broken, healthy]);

        // When
        let outcome = dispatcher.publish(&sample_task_message()).await;

        // Then
        assert_eq!(outcome.unwrap(), "flushed to write buffer");
    }

    #[tokio::test]
    async fn publish_surfaces_an_error_once_every_broker_has_failed() {
        // Given
        let a: Arc<dyn MessageBroker> = Arc::new(StubBroker { outcome: Err("a is down") });
        let b: Arc<dyn MessageBroker> = Arc::new(StubBroker { outcome: Err("b is down") });
        let dispatcher = FailoverDispatcher::new("test", vec![a, b]);

        // When
        let outcome = dispatcher.publish(&sample_task_message()).await;

        // Then
        assert!(outcome.is_err());
    }

    #[tokio::test]
    #[should_panic(expected = "at least one broker")]
    async fn new_panics_with_no_brokers() {
        FailoverDispatcher::new("test", vec![]);
    }
}
