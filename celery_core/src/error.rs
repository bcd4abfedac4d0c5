use thiserror::Error;

/// A requested operation has no implementation yet.
///
/// Per the original design, `RpcBackend::uri` is the one caller-reachable
/// instance of this: no caller currently needs to recover a connection URI
/// from a live RPC backend, so the accessor exists for interface parity and
/// returns this error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("not implemented: {0}")]
pub struct UnimplementedError(pub String);

/// An operation was attempted after the owning broker/backend instance had
/// already been [ended](crate::shutdown::Shutdown::terminate).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("disconnected: {0}")]
pub struct DisconnectedError(pub String);

/// The broker canceled our consumer out from under us (e.g. the queue was
/// deleted, or the broker is shutting down).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("the broker cancelled our consumer")]
pub struct ConsumerCancelledError;

/// Every broker in a failover group failed to publish.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("every broker in the failover group failed: {0}")]
pub struct BrokerError(pub String);

/// The top-level error type surfaced by the client facade, composing every
/// crate-local error kind behind one type.
#[derive(Debug, Error)]
pub enum CeleryError {
    /// A connection string or query string could not be parsed.
    #[error(transparent)]
    Parse(#[from] celery_uri::ParseError),

    /// The requested operation is not implemented.
    #[error(transparent)]
    Unimplemented(#[from] UnimplementedError),

    /// The broker/backend instance has already been ended.
    #[error(transparent)]
    Disconnected(#[from] DisconnectedError),

    /// A suspension point exceeded its deadline.
    #[error(transparent)]
    Timeout(#[from] celery_util::TimeoutError),

    /// The broker cancelled our consumer.
    #[error(transparent)]
    ConsumerCancelled(#[from] ConsumerCancelledError),

    /// Every broker in a failover group failed.
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// The configured packer failed to serialize, compress, or encode a
    /// value.
    #[error(transparent)]
    Pack(#[from] celery_message::PackError),
}
