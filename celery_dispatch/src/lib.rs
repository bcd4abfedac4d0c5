#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// The pluggable broker-selection policy, and the default round-robin one.
mod strategy;
pub use self::strategy::{FailoverStrategy, RoundRobin};

/// The [`MessageBroker`](celery_core::MessageBroker) implementation that
/// dispatches over several brokers under a [`FailoverStrategy`].
mod dispatcher;
pub use self::dispatcher::FailoverDispatcher;
