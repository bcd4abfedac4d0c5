use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt::Formatter;
use tracing_core::LevelFilter as TracingLevelFilter;

/// A thin abstraction around the `tracing` crate’s
/// [`LevelFilter`](TracingLevelFilter), introduced to provide deserialization.
///
/// A verbosity level is “higher” if it is more verbose. In this sense,
/// [`Trace`](Verbosity::Trace) is higher (more verbose) than
/// [`Error`](Verbosity::Error).
///
/// Conversely, a verbosity level is “lower” if it is less verbose. In this
/// sense, [`Warn`](Verbosity::Warn) is lower than [`Info`](Verbosity::Info).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verbosity {
    /// Log **nothing**.
    Off,

    /// Log at level [`ERROR`](tracing_core::metadata::Level::ERROR) only.
    Error,

    /// Log at level [`WARN`](tracing_core::metadata::Level::WARN) and lower.
    Warn,

    /// Log at level [`INFO`](tracing_core::metadata::Level::INFO) and lower.
    Info,

    /// Log at level [`DEBUG`](tracing_core::metadata::Level::DEBUG) and lower.
    Debug,

    /// Log **everything**.
    Trace,
}

impl Default for Verbosity {
    /// Defines a reasonable default [`Verbosity`].
    fn default() -> Self {
        Self::Info
    }
}

impl Verbosity {
    /// Translates this [`Verbosity`] level to the `tracing` crate’s
    /// [`LevelFilter`](TracingLevelFilter).
    pub fn to_tracing_level_filter(&self) -> TracingLevelFilter {
        match self {
            Self::Off => TracingLevelFilter::OFF,
            Self::Error => TracingLevelFilter::ERROR,
            Self::Warn => TracingLevelFilter::WARN,
            Self::Info => TracingLevelFilter::INFO,
            Self::Debug => TracingLevelFilter::DEBUG,
            Self::Trace => TracingLevelFilter::TRACE,
        }
    }
}

impl From<Verbosity> for TracingLevelFilter {
    fn from(value: Verbosity) -> Self {
        value.to_tracing_level_filter()
    }
}

impl From<&Verbosity> for TracingLevelFilter {
    fn from(value: &Verbosity) -> Self {
        value.to_tracing_level_filter()
    }
}

impl<'de> Deserialize<'de> for Verbosity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(VerbosityVisitor)
    }
}

struct VerbosityVisitor;

impl Visitor<'_> for VerbosityVisitor {
    type Value = Verbosity;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("one of: off, error, warn, info, debug, trace")
    }

    fn visit_str<E>(self, raw: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        match raw.to_ascii_lowercase().as_str() {
            "off" | "no" => Ok(Verbosity::Off),
            "error" | "err" => Ok(Verbosity::Error),
            "warn" | "warning" => Ok(Verbosity::Warn),
            "info" => Ok(Verbosity::Info),
            "debug" => Ok(Verbosity::Debug),
            "trace" => Ok(Verbosity::Trace),
            other => Err(E::custom(format!("unrecognized verbosity level: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_known_levels_and_aliases() {
        assert_eq!(serde_yml::from_str::<Verbosity>("warn").unwrap(), Verbosity::Warn);
        assert_eq!(serde_yml::from_str::<Verbosity>("warning").unwrap(), Verbosity::Warn);
        assert_eq!(serde_yml::from_str::<Verbosity>("no").unwrap(), Verbosity::Off);
        assert_eq!(serde_yml::from_str::<Verbosity>("ERR").unwrap(), Verbosity::Error);
    }

    #[test]
    fn rejects_an_unrecognized_level() {
        assert!(serde_yml::from_str::<Verbosity>("nonsense").is_err());
    }

    #[test]
    fn orders_from_off_to_trace() {
        assert!(Verbosity::Off < Verbosity::Error);
        assert!(Verbosity::Error < Verbosity::Warn);
        assert!(Verbosity::Debug < Verbosity::Trace);
    }
}
