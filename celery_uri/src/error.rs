use thiserror::Error;

/// A failure parsing or validating a connection URI.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The string did not start with a recognized `scheme:` prefix.
    #[error("unrecognized URI scheme: {0:?}")]
    UnrecognizedScheme(String),

    /// The scheme was recognized, but the URI is missing required parts
    /// (e.g. no authority where one is required).
    #[error("malformed URI for scheme {scheme:?}: {reason}")]
    MalformedUri {
        /// The scheme under which parsing failed.
        scheme: String,
        /// A human-readable description of what was wrong.
        reason: String,
    },

    /// The host portion failed RFC-1123-like label validation.
    #[error("invalid host: {0:?}")]
    InvalidHost(String),

    /// The port portion was not a valid base-10 integer in `[0, 65535]`.
    #[error("invalid port: {0:?}")]
    InvalidPort(String),

    /// The query string did not match `key=value(&key=value)*`.
    #[error("invalid query string: {0:?}")]
    InvalidQuery(String),
}
