#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// Crate-local error kinds, composed into [`CeleryError`].
mod error;
pub use self::error::{
    BrokerError, CeleryError, ConsumerCancelledError, DisconnectedError, UnimplementedError,
};

/// Per-instance cooperative shutdown signal.
mod shutdown;
pub use self::shutdown::Shutdown;

/// The `MessageBroker` and `ResultBackend` capability interfaces.
mod traits;
pub use self::traits::{MessageBroker, ResultBackend};

/// Globally recognized field name that, when present in a `tracing` macro
/// call, should trigger an event for an external alerting system.
pub const ALERT_FIELD_NAME: &str = "alert";
