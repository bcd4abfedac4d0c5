use std::any::type_name;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use celery_util::BackoffConfig;

use crate::options::RedisOptions;

/// Groups a [`RedisOptions`] topology, a human-readable identifier safe for
/// logging, and a reconnection [`BackoffConfig`].
///
/// This handle by itself opens no connections; see [`crate::RedisBackend`].
#[derive(Clone, PartialEq)]
pub struct Handle {
    name: Arc<str>,
    identifier: Arc<str>,
    options: RedisOptions,
    backoff: BackoffConfig,
}

impl Handle {
    /// Creates a new handle with the given name, wrapping already-resolved
    /// [`RedisOptions`].
    pub fn new(name: impl AsRef<str>, options: RedisOptions) -> Self {
        let name = Arc::from(name.as_ref());
        let identifier = Self::compose_identifier(&options);

        Self {
            name,
            identifier,
            options,
            backoff: BackoffConfig::default(),
        }
    }

    /// Parses `uri` via [`RedisOptions::from_uri`] and wraps the result.
    pub fn from_uri(name: impl AsRef<str>, uri: &str) -> Result<Self, celery_uri::ParseError> {
        Ok(Self::new(name, RedisOptions::from_uri(uri)?))
    }

    /// Re-creates this handle with the given [`BackoffConfig`].
    pub fn with_backoff(self, backoff: BackoffConfig) -> Self {
        Self { backoff, ..self }
    }

    fn compose_identifier(options: &RedisOptions) -> Arc<str> {
        let identifier = match options {
            RedisOptions::Tcp { host, port, .. } => format!("redis://{host}:{port}"),
            RedisOptions::Socket { path, .. } => format!("redis+socket://{path}"),
            RedisOptions::Sentinel { service_name, nodes, .. } => {
                format!("sentinel://{}/{service_name}", nodes.len())
            }
            RedisOptions::Cluster { nodes, .. } => format!("cluster({} nodes)", nodes.len()),
        };

        Arc::from(identifier)
    }
}

impl Handle {
    /// Reports the handle name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reports the handle identifier, generally safe for debug logging.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Reports the Redis topology this handle connects to.
    pub fn options(&self) -> &RedisOptions {
        &self.options
    }

    /// Exposes the exponential [`Backoff`](celery_util::Backoff) configuration
    /// for this handle.
    pub fn backoff(&self) -> &BackoffConfig {
        &self.backoff
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::new(
            "default",
            RedisOptions::Tcp {
                secure: false,
                host: "localhost".to_string(),
                port: 6379,
                base: Default::default(),
            },
        )
    }
}

impl Debug for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("name", &self.name)
            .field("identifier", &self.identifier)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl Display for Handle {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(&self.identifier)
    }
}

impl AsRef<Handle> for Handle {
    fn as_ref(&self) -> &Handle {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_handle_identifies_as_localhost() {
        // Given
        let handle = Handle::default();

        // Then
        assert_eq!(handle.identifier(), "redis://localhost:6379");
    }

    #[test]
    fn from_uri_builds_a_handle() {
        // Given
        let handle = Handle::from_uri("test", "redis://host:6380/2").unwrap();

        // Then
        assert_eq!(handle.identifier(), "redis://host:6380");
        assert_eq!(handle.options().base().db, Some(2));
    }
}
