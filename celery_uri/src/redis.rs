use crate::query::{apply_queries, boolean_query_descriptor, QueryDescriptor};
use crate::uri::{parse_uri, Uri};
use crate::ParseError;

/// A `redis://`/`rediss://` TCP address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisAddress {
    /// Whether the connection should be made over TLS (`rediss`).
    pub secure: bool,
    /// Lower-cased host name.
    pub host: String,
    /// Port, if explicitly given.
    pub port: Option<u16>,
    /// Password. A `password` query parameter, if present, beats any
    /// userinfo password.
    pub password: Option<String>,
    /// Database index, parsed from the URI path.
    pub db: Option<u64>,
    /// Whether `TCP_NODELAY` was requested.
    pub no_delay: Option<bool>,
}

impl Default for RedisAddress {
    fn default() -> Self {
        Self {
            secure: false,
            host: String::new(),
            port: None,
            password: None,
            db: None,
            no_delay: None,
        }
    }
}

/// A `redis+socket://`/`rediss+socket://` Unix-domain-socket address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisSocketAddress {
    /// Whether the connection should be made over TLS (`rediss+socket`).
    pub secure: bool,
    /// Filesystem path to the socket.
    pub path: String,
    /// Password.
    pub password: Option<String>,
    /// Whether `TCP_NODELAY` was requested.
    pub no_delay: Option<bool>,
}

/// Parses a `redis://`/`rediss://` URI into a [`RedisAddress`].
pub fn parse_redis_uri(input: &str) -> Result<RedisAddress, ParseError> {
    let uri: Uri = parse_uri(input)?;

    if !uri.scheme.is_redis() {
        return Err(ParseError::MalformedUri {
            scheme: format!("{:?}", uri.scheme),
            reason: "not a Redis TCP scheme".to_string(),
        });
    }

    let authority = uri.authority.ok_or_else(|| ParseError::MalformedUri {
        scheme: format!("{:?}", uri.scheme),
        reason: "missing authority".to_string(),
    })?;

    let userinfo_password = authority.user_info.and_then(|user_info| user_info.pass);

    let db = parse_db_segment(&uri.path)?;

    let mut address = RedisAddress {
        secure: uri.scheme.is_secure(),
        host: authority.host,
        port: authority.port,
        password: userinfo_password,
        db,
        no_delay: None,
    };

    if let Some(query) = &uri.query {
        let descriptors: [QueryDescriptor<RedisAddress>; 2] = [
            boolean_query_descriptor("noDelay", |t, v| t.no_delay = Some(v)),
            QueryDescriptor::new("password", |t, v| t.password = Some(v.as_scalar().to_string())),
        ];

        address = apply_queries(query, address, &descriptors);
    }

    Ok(address)
}

/// Parses a `redis+socket://`/`rediss+socket://` URI into a
/// [`RedisSocketAddress`].
pub fn parse_redis_socket_uri(input: &str) -> Result<RedisSocketAddress, ParseError> {
    let uri: Uri = parse_uri(input)?;

    if !uri.scheme.is_redis_socket() {
        return Err(ParseError::MalformedUri {
            scheme: format!("{:?}", uri.scheme),
            reason: "not a Redis socket scheme".to_string(),
        });
    }

    if uri.path.contains('\0') {
        return Err(ParseError::MalformedUri {
            scheme: format!("{:?}", uri.scheme),
            reason: "socket path must not contain NUL".to_string(),
        });
    }

    let mut address = RedisSocketAddress {
        secure: uri.scheme.is_secure(),
        path: uri.path,
        password: None,
        no_delay: None,
    };

    if let Some(query) = &uri.query {
        let descriptors: [QueryDescriptor<RedisSocketAddress>; 2] = [
            boolean_query_descriptor("noDelay", |t, v| t.no_delay = Some(v)),
            QueryDescriptor::new("password", |t, v| t.password = Some(v.as_scalar().to_string())),
        ];

        address = apply_queries(query, address, &descriptors);
    }

    Ok(address)
}

fn parse_db_segment(path: &str) -> Result<Option<u64>, ParseError> {
    let segment = path.trim_start_matches('/');

    if segment.is_empty() {
        return Ok(None);
    }

    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::MalformedUri {
            scheme: "Redis".to_string(),
            reason: format!("invalid database index: {segment:?}"),
        });
    }

    segment
        .trim_start_matches('0')
        .parse::<u64>()
        .or(Ok(0))
        .map(Some)
}
