#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

mod conduit;
pub use self::conduit::{Conduit, Retriever};

mod latch;
pub use self::latch::{Gate, Latch};

/// A keyed registry of settle-once values shared by concurrent waiters.
mod promise_map;
pub use self::promise_map::{PromiseError, PromiseMap};

/// A strictly FIFO queue of not-yet-settled futures.
mod promise_queue;
pub use self::promise_queue::PromiseQueue;

/// A bounded pool of resources borrowed and returned in FIFO fairness.
mod resource_pool;
pub use self::resource_pool::{
    ForeignResourceError, ResourceDestructor, ResourceFactory, ResourcePool,
};
