#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// Implements an opinionated version of the exponential backoff.
#[cfg(feature = "backoff")]
mod backoff {
    pub mod config;
    pub mod wrapper;
}
#[cfg(feature = "backoff")]
pub use self::backoff::{config::BackoffConfig, wrapper::Backoff};

/// Parses primitive values (integers, booleans, identifiers) out of the
/// loosely-typed strings that show up in URIs and query strings.
mod parse;
pub use self::parse::{parse_boolean, parse_integer, to_camel_case, ParseError};

/// Races a future against an optional timeout.
mod timeout;
pub use self::timeout::{timer, with_timeout, TimeoutError};
