#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// Exposes a handle for defining a set of connection credentials.
mod handle;
pub use self::handle::{DsnChunks, Handle};

/// Exposes machinery for maintaining a connection to a RabbitMQ cluster.
mod connector;
pub use self::connector::{Connector, Gateway};

/// Exposes the [`MessageBroker`](celery_core::MessageBroker) implementation
/// that publishes task messages onto a RabbitMQ cluster.
mod broker;
pub use self::broker::Broker;

/// Exposes the [`ResultBackend`](celery_core::ResultBackend) implementation
/// that correlates results via a private RabbitMQ reply queue.
mod rpc_backend;
pub use self::rpc_backend::RpcBackend;

/// Exposes convenience layers around `lapin` types.
pub mod util {
    mod amqp_properties;
    pub use self::amqp_properties::push::{
        PushAppId, PushClusterId, PushContentEncoding, PushContentType, PushCorrelationId,
        PushExpiration, PushHeader, PushKind, PushMessageId, PushReplyTo, PushUserId,
    };
    pub use self::amqp_properties::retrieve::{
        RetrieveAppId, RetrieveClusterId, RetrieveContentEncoding, RetrieveContentType,
        RetrieveCorrelationId, RetrieveExpiration, RetrieveHeader, RetrieveKind, RetrieveMessageId,
        RetrieveReplyTo, RetrieveUserId,
    };
    pub use self::amqp_properties::RetrievePushMap;

    mod amqp_value;
    pub use self::amqp_value::IsEmpty;

    mod coerce;
    pub use self::coerce::Coerce;

    mod field_table;
    pub use self::field_table::push::Push;
    pub use self::field_table::retrieve::Retrieve;
    pub use self::field_table::{Attempt, HEADER_ATTEMPT};

    mod morph;
    pub use self::morph::Morph;
}
