#![doc = include_str!("../README.md")]
#![deny(missing_docs)]

/// Task and result envelope types exchanged with brokers and backends.
mod envelope;
/// The serializer × compressor × encoder packing pipeline.
mod packer;

pub use self::envelope::{
    DeliveryInfo, DeliveryMode, ResultEnvelope, TaskMessage, TaskProperties, TaskStatus,
};
pub use self::packer::{Compressor, Encoder, PackError, Packer, Serializer};
