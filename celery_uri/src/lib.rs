#![doc = include_str!("../README.md")]
#![deny(missing_docs)]

/// Per-scheme AMQP/RPC address extraction.
mod amqp;
/// Recognized connection-string schemes and their routing predicates.
mod scheme;
/// Parse and validation failures shared by every module in this crate.
mod error;
/// The `key=value(&key=value)*` query grammar and declarative descriptors.
mod query;
/// Per-scheme Redis (TCP and Unix socket) address extraction.
mod redis;
/// The generic scheme/authority/path/query decomposition.
mod uri;

pub use self::amqp::{parse_amqp_uri, AmqpAddress};
pub use self::error::ParseError;
pub use self::query::{
    apply_queries, boolean_query_descriptor, integer_query_descriptor, Query, QueryDescriptor,
    QueryValue,
};
pub use self::redis::{parse_redis_socket_uri, parse_redis_uri, RedisAddress, RedisSocketAddress};
pub use self::scheme::Scheme;
pub use self::uri::{parse_uri, scheme_of, Authority, Uri, UserInfo};
