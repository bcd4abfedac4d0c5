#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// Loads `.env`/`.env.local` files from the current working directory.
mod dotenv;
pub use self::dotenv::DotEnv;

/// The connected `Client` and its `create_client` connection-string sugar.
mod client;
pub use self::client::{create_client, Client};

/// A named unit of work submitted through a [`Client`].
mod task;
pub use self::task::{ApplyOptions, Task};

/// A handle to a submitted task's eventual result.
mod async_result;
pub use self::async_result::AsyncResult;

/// The `MessageBroker`/`ResultBackend` capability interfaces, the composed
/// `CeleryError`, and the other crate-local error kinds it wraps.
pub use celery_core::{
    BrokerError, CeleryError, ConsumerCancelledError, DisconnectedError, MessageBroker,
    ResultBackend, UnimplementedError, ALERT_FIELD_NAME,
};

/// Task/result envelope types and the serializer × compressor × encoder
/// packing pipeline.
pub use celery_message::{
    Compressor, DeliveryInfo, DeliveryMode, Encoder, PackError, Packer, ResultEnvelope,
    Serializer, TaskMessage, TaskProperties, TaskStatus,
};

/// Connection-string parsing and the recognized `Scheme`s.
pub use celery_uri::{parse_uri, scheme_of, ParseError, Scheme, Uri};

/// The multi-broker failover dispatcher and its pluggable selection
/// strategy.
pub use celery_dispatch::{FailoverDispatcher, FailoverStrategy, RoundRobin};

/// Re-exports the structured-logging layer, for callers who want to install
/// it themselves via `tracing_subscriber::registry().with(layer).init()`.
#[cfg(feature = "tracing")]
pub use celery_tracing;

/// Re-exports the RabbitMQ broker and RPC result backend, for callers who
/// need to build a [`Client`] from lower-level pieces than `create_client`.
#[cfg(feature = "rabbitmq")]
pub use celery_rabbitmq;

/// Re-exports the Redis result backend, for callers who need to build a
/// [`Client`] from lower-level pieces than `create_client`.
#[cfg(feature = "redis")]
pub use celery_redis;
