use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt::Formatter;

/// Represents a particular preset of configuration for the
/// [event formatter](tracing_subscriber::fmt::format::Format) used by the
/// [formatted `Subscriber`](tracing_subscriber::fmt::Subscriber) of the
/// `tracing_subscriber` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormatFlavor {
    /// Uses the default [`Full`](tracing_subscriber::fmt::format::Full) event formatting.
    Full,

    /// Uses the [`Compact`](tracing_subscriber::fmt::format::Compact) event formatting.
    Compact,

    /// Uses the multi-line [`Pretty`](tracing_subscriber::fmt::format::Pretty) event formatting.
    Pretty,

    #[cfg(feature = "json")]
    /// Uses the [`Json`](tracing_subscriber::fmt::format::Json) event formatting.
    Json,
}

impl Default for FormatFlavor {
    /// Defines a reasonable default [`FormatFlavor`].
    fn default() -> Self {
        FormatFlavor::Full
    }
}

impl<'de> Deserialize<'de> for FormatFlavor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(FormatFlavorVisitor)
    }
}

struct FormatFlavorVisitor;

impl Visitor<'_> for FormatFlavorVisitor {
    type Value = FormatFlavor;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("one of: full, compact, pretty, json")
    }

    fn visit_str<E>(self, raw: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        match raw.to_ascii_lowercase().as_str() {
            "full" => Ok(FormatFlavor::Full),
            "compact" => Ok(FormatFlavor::Compact),
            "pretty" => Ok(FormatFlavor::Pretty),
            #[cfg(feature = "json")]
            "json" => Ok(FormatFlavor::Json),
            other => Err(E::custom(format!("unrecognized format flavor: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_known_flavors_case_insensitively() {
        assert_eq!(serde_yml::from_str::<FormatFlavor>("pretty").unwrap(), FormatFlavor::Pretty);
        assert_eq!(serde_yml::from_str::<FormatFlavor>("PRETTY").unwrap(), FormatFlavor::Pretty);
        assert_eq!(serde_yml::from_str::<FormatFlavor>("Compact").unwrap(), FormatFlavor::Compact);
    }

    #[test]
    fn rejects_an_unrecognized_flavor() {
        assert!(serde_yml::from_str::<FormatFlavor>("nonsense").is_err());
    }
}
