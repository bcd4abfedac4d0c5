#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// Exposes a handle for defining a Redis topology and a reconnect policy.
mod handle;
pub use self::handle::Handle;

/// Exposes the dynamic Redis topology option type (`Tcp`/`Socket`/`Sentinel`/`Cluster`).
mod options;
pub use self::options::{RedisBase, RedisOptions, DEFAULT_KEY_PREFIX, DEFAULT_RESULT_EXPIRES_SECS};

/// Exposes the [`ResultBackend`](celery_core::ResultBackend) implementation
/// that stores and notifies results over Redis.
mod backend;
pub use self::backend::RedisBackend;
