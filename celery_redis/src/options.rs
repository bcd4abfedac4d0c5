use celery_uri::{parse_redis_socket_uri, parse_redis_uri, parse_uri, scheme_of, ParseError, Scheme};

/// The default key prefix under which result envelopes are stored:
/// `celery-task-meta-{task_id}`.
pub const DEFAULT_KEY_PREFIX: &str = "celery-task-meta-";

/// The default expiry, in seconds, applied to a stored result (one day).
pub const DEFAULT_RESULT_EXPIRES_SECS: u64 = 86400;

/// Fields shared by every [`RedisOptions`] variant.
#[derive(Debug, Clone, PartialEq)]
pub struct RedisBase {
    /// Authentication password, if any.
    pub password: Option<String>,
    /// Selected logical database, where the topology supports one.
    pub db: Option<u64>,
    /// Prefix applied to every result key.
    pub key_prefix: String,
    /// TTL applied to a stored result, in seconds.
    pub result_expires_secs: u64,
}

impl Default for RedisBase {
    fn default() -> Self {
        Self {
            password: None,
            db: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            result_expires_secs: DEFAULT_RESULT_EXPIRES_SECS,
        }
    }
}

/// The Redis topology a [`crate::Handle`] connects to.
///
/// Mirrors the distilled spec's dynamic Redis option object as a tagged
/// union over a [`RedisBase`] shared by every variant.
#[derive(Debug, Clone, PartialEq)]
pub enum RedisOptions {
    /// A single `redis://`/`rediss://` node.
    Tcp {
        /// Whether to connect over TLS.
        secure: bool,
        /// Host name.
        host: String,
        /// Port, defaulting to `6379`.
        port: u16,
        /// Shared fields.
        base: RedisBase,
    },
    /// A Unix-domain-socket node.
    Socket {
        /// Whether to connect over TLS.
        secure: bool,
        /// Socket path.
        path: String,
        /// Shared fields.
        base: RedisBase,
    },
    /// A Sentinel-monitored master, addressed by one seed node plus the
    /// monitored master's service name.
    Sentinel {
        /// Whether to connect to sentinel nodes over TLS.
        secure: bool,
        /// Seed sentinel nodes, `(host, port)`.
        nodes: Vec<(String, u16)>,
        /// The monitored master's service name.
        service_name: String,
        /// Shared fields.
        base: RedisBase,
    },
    /// A Redis Cluster, addressed by a list of seed node URLs.
    Cluster {
        /// Seed node URLs (e.g. `redis://host:6379`).
        nodes: Vec<String>,
        /// Shared fields.
        base: RedisBase,
    },
}

impl RedisOptions {
    /// Parses a connection string into the matching variant, discriminating
    /// on its scheme.
    ///
    /// A `sentinel://host:port/service_name` URI yields a single-seed
    /// [`RedisOptions::Sentinel`]; callers that need more than one seed node
    /// compose it directly via the variant, the same way [`Self::cluster`]
    /// is always built programmatically (no cluster URI scheme exists).
    pub fn from_uri(input: &str) -> Result<Self, ParseError> {
        let scheme = scheme_of(input)?;

        if scheme.is_redis() {
            let address = parse_redis_uri(input)?;
            Ok(RedisOptions::Tcp {
                secure: address.secure,
                host: address.host,
                port: address.port.unwrap_or(6379),
                base: RedisBase {
                    password: address.password,
                    db: address.db,
                    ..RedisBase::default()
                },
            })
        } else if scheme.is_redis_socket() {
            let address = parse_redis_socket_uri(input)?;
            Ok(RedisOptions::Socket {
                secure: address.secure,
                path: address.path,
                base: RedisBase {
                    password: address.password,
                    ..RedisBase::default()
                },
            })
        } else if scheme.is_sentinel() {
            Self::parse_sentinel(input, scheme)
        } else {
            Err(ParseError::MalformedUri {
                scheme: format!("{scheme:?}"),
                reason: "not a Redis scheme".to_string(),
            })
        }
    }

    fn parse_sentinel(input: &str, scheme: Scheme) -> Result<Self, ParseError> {
        let uri = parse_uri(input)?;

        let authority = uri.authority.ok_or_else(|| ParseError::MalformedUri {
            scheme: format!("{scheme:?}"),
            reason: "missing authority".to_string(),
        })?;

        let password = authority.user_info.and_then(|user_info| user_info.pass);
        let service_name = uri.path.trim_start_matches('/').to_string();

        if service_name.is_empty() {
            return Err(ParseError::MalformedUri {
                scheme: format!("{scheme:?}"),
                reason: "missing sentinel service (master) name".to_string(),
            });
        }

        Ok(RedisOptions::Sentinel {
            secure: scheme.is_secure(),
            nodes: vec![(authority.host, authority.port.unwrap_or(26379))],
            service_name,
            base: RedisBase {
                password,
                ..RedisBase::default()
            },
        })
    }

    /// Builds a [`RedisOptions::Cluster`] from a list of seed node URLs.
    pub fn cluster(nodes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        RedisOptions::Cluster {
            nodes: nodes.into_iter().map(Into::into).collect(),
            base: RedisBase::default(),
        }
    }

    /// Reports the shared fields for any variant.
    pub fn base(&self) -> &RedisBase {
        match self {
            RedisOptions::Tcp { base, .. } => base,
            RedisOptions::Socket { base, .. } => base,
            RedisOptions::Sentinel { base, .. } => base,
            RedisOptions::Cluster { base, .. } => base,
        }
    }

    /// Re-creates these options with the given key prefix.
    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.base_mut().key_prefix = key_prefix.into();
        self
    }

    /// Re-creates these options with the given result TTL, in seconds.
    pub fn with_result_expires_secs(mut self, result_expires_secs: u64) -> Self {
        self.base_mut().result_expires_secs = result_expires_secs;
        self
    }

    fn base_mut(&mut self) -> &mut RedisBase {
        match self {
            RedisOptions::Tcp { base, .. } => base,
            RedisOptions::Socket { base, .. } => base,
            RedisOptions::Sentinel { base, .. } => base,
            RedisOptions::Cluster { base, .. } => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn from_uri_parses_tcp() {
        // Given
        let options = RedisOptions::from_uri("redis://:secret@localhost:6380/3").unwrap();

        // Then
        match options {
            RedisOptions::Tcp { host, port, base, .. } => {
                assert_eq!(host, "localhost");
                assert_eq!(port, 6380);
                assert_eq!(base.password, Some("secret".to_string()));
                assert_eq!(base.db, Some(3));
            }
            other => panic!("expected Tcp, got {other:?}"),
        }
    }

    #[test]
    fn from_uri_parses_socket() {
        // Given
        let options = RedisOptions::from_uri("redis+socket:///tmp/redis.sock").unwrap();

        // Then
        match options {
            RedisOptions::Socket { path, .. } => assert_eq!(path, "/tmp/redis.sock"),
            other => panic!("expected Socket, got {other:?}"),
        }
    }

    #[test]
    fn from_uri_parses_sentinel_service_name() {
        // Given
        let options = RedisOptions::from_uri("sentinel://host:26379/mymaster").unwrap();

        // Then
        match options {
            RedisOptions::Sentinel { nodes, service_name, .. } => {
                assert_eq!(nodes, vec![("host".to_string(), 26379)]);
                assert_eq!(service_name, "mymaster");
            }
            other => panic!("expected Sentinel, got {other:?}"),
        }
    }

    #[test]
    fn from_uri_rejects_sentinel_without_service_name() {
        assert!(RedisOptions::from_uri("sentinel://host:26379").is_err());
    }

    #[test]
    fn cluster_is_always_built_programmatically() {
        // Given
        let options = RedisOptions::cluster(["redis://a:6379", "redis://b:6379"]);

        // Then
        match options {
            RedisOptions::Cluster { nodes, .. } => assert_eq!(nodes.len(), 2),
            other => panic!("expected Cluster, got {other:?}"),
        }
    }

    #[test]
    fn with_key_prefix_overrides_the_default() {
        // Given
        let options = RedisOptions::from_uri("redis://localhost").unwrap().with_key_prefix("custom-");

        // Then
        assert_eq!(options.base().key_prefix, "custom-");
    }
}
