use crate::ParseError;

/// The set of URI schemes this crate knows how to route.
///
/// `Rpc`/`Rpcs` are accepted as aliases of `Amqp`/`Amqps` at parse time (see
/// [`crate::amqp::AmqpAddress`]); the distinct variants are kept here only so
/// that the original scheme can be round-tripped through [`Uri::raw`](crate::Uri::raw).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// `amqp://`
    Amqp,
    /// `amqps://`
    Amqps,
    /// `rpc://`, alias of `amqp://`
    Rpc,
    /// `rpcs://`, alias of `amqps://`
    Rpcs,
    /// `redis://`
    Redis,
    /// `rediss://`
    Rediss,
    /// `redis+socket://`
    RedisSocket,
    /// `rediss+socket://`
    RedissSocket,
    /// `sentinel://` (parse-only; see module docs)
    Sentinel,
    /// `sentinels://` (parse-only; see module docs)
    Sentinels,
}

impl Scheme {
    /// Parses the textual scheme name (before the leading `://`).
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw.to_ascii_lowercase().as_str() {
            "amqp" => Ok(Scheme::Amqp),
            "amqps" => Ok(Scheme::Amqps),
            "rpc" => Ok(Scheme::Rpc),
            "rpcs" => Ok(Scheme::Rpcs),
            "redis" => Ok(Scheme::Redis),
            "rediss" => Ok(Scheme::Rediss),
            "redis+socket" => Ok(Scheme::RedisSocket),
            "rediss+socket" => Ok(Scheme::RedissSocket),
            "sentinel" => Ok(Scheme::Sentinel),
            "sentinels" => Ok(Scheme::Sentinels),
            other => Err(ParseError::UnrecognizedScheme(other.to_string())),
        }
    }

    /// Reports whether this scheme is routed as an AMQP broker/backend.
    pub fn is_amqp(self) -> bool {
        matches!(self, Scheme::Amqp | Scheme::Amqps | Scheme::Rpc | Scheme::Rpcs)
    }

    /// Reports whether this scheme uses TLS.
    pub fn is_secure(self) -> bool {
        matches!(
            self,
            Scheme::Amqps | Scheme::Rpcs | Scheme::Rediss | Scheme::RedissSocket | Scheme::Sentinels
        )
    }

    /// Reports whether this scheme is routed as a Redis (TCP) broker/backend.
    pub fn is_redis(self) -> bool {
        matches!(self, Scheme::Redis | Scheme::Rediss)
    }

    /// Reports whether this scheme is routed as a Redis Unix-socket broker/backend.
    pub fn is_redis_socket(self) -> bool {
        matches!(self, Scheme::RedisSocket | Scheme::RedissSocket)
    }

    /// Reports whether this scheme names a Sentinel cluster.
    pub fn is_sentinel(self) -> bool {
        matches!(self, Scheme::Sentinel | Scheme::Sentinels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_known_schemes_case_insensitively() {
        assert_eq!(Scheme::parse("AMQP").unwrap(), Scheme::Amqp);
        assert_eq!(Scheme::parse("rediss+socket").unwrap(), Scheme::RedissSocket);
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!(Scheme::parse("http").is_err());
    }
}
