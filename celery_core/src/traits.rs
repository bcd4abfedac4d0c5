use std::time::Duration;

use async_trait::async_trait;
use celery_message::{ResultEnvelope, TaskMessage};
use celery_uri::Uri;
use uuid::Uuid;

use crate::error::{BrokerError, CeleryError, UnimplementedError};

/// Capability interface for publishing task messages.
///
/// Implemented by `celery_rabbitmq::Broker` and by
/// `celery_dispatch::FailoverDispatcher`, so a dispatcher over several
/// brokers is itself usable anywhere a single broker is.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publishes `task_message`, returning a short human-readable outcome
    /// (e.g. `"flushed to write buffer"`) on success.
    async fn publish(&self, task_message: &TaskMessage) -> Result<String, BrokerError>;

    /// Gracefully closes this broker's connection. Idempotent only at the
    /// caller's discretion; a second call after a successful `end()` should
    /// not be relied upon to succeed.
    async fn end(&self);
}

/// Capability interface for storing and retrieving task results.
#[async_trait]
pub trait ResultBackend: Send + Sync {
    /// Stores a result. Backends that cannot acknowledge storage (e.g. an
    /// RPC reply queue) still accept this call; it is rarely used by
    /// clients, which mostly `get` results a worker produced.
    async fn put(&self, result_message: &ResultEnvelope);

    /// Awaits the result for `task_id`, racing against `timeout` if given.
    async fn get(&self, task_id: Uuid, timeout: Option<Duration>) -> Result<ResultEnvelope, CeleryError>;

    /// Removes any stored result for `task_id`, returning `"deleted"` or
    /// `"no result found"`.
    async fn delete(&self, task_id: Uuid) -> String;

    /// Gracefully closes this backend's connection.
    async fn end(&self);

    /// Recovers this backend's connection URI, where supported.
    fn uri(&self) -> Result<Uri, UnimplementedError>;
}
